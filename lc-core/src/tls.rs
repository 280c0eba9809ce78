use std::collections::BTreeMap;
use std::time::Duration;

use lc_api::tls::{
    Api,
    ApiCa,
    ApiService,
};

use crate::env::EnvSetter;
use crate::errors::*;
use crate::prelude::*;
use crate::secret::verify_secret;
use crate::util::hash_of_input_hashes;

// label on the namespace-wide CA bundle secret, also used as its volume name
pub const CA_BUNDLE_LABEL: &str = "combined-ca-bundle";
pub const CA_BUNDLE_KEY: &str = "tls-ca-bundle.pem";
pub const CERT_KEY: &str = "tls.crt";
pub const PRIVATE_KEY: &str = "tls.key";
pub const CA_KEY: &str = "ca.crt";
// name of the hash of hashes over every cert a service uses
pub const TLS_HASH_NAME: &str = "certs";

const DEFAULT_CA_BUNDLE_MOUNT: &str = "/etc/pki/ca-trust/extracted/pem/tls-ca-bundle.pem";
const DEFAULT_DB_CLIENT_CERT: &str = "/etc/pki/tls/certs/tls.crt";
const DEFAULT_DB_CLIENT_KEY: &str = "/etc/pki/tls/private/tls.key";
const CERT_SECRET_REQUEUE: Duration = Duration::from_secs(5);

err_impl! {TlsError,
    #[error("no endpoint defined for service '{0}'")]
    NoEndpoint(String),
}

// Server-side TLS config for a single service, with optional overrides for where things get
// mounted in the pod
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Service {
    pub secret_name: Option<String>,
    pub issuer_name: Option<String>,
    // defaults to /etc/pki/tls/certs/<service id>.crt
    pub cert_mount: Option<String>,
    // defaults to /etc/pki/tls/private/<service id>.key
    pub key_mount: Option<String>,
    // only mounted if set
    pub ca_mount: Option<String>,
    pub disable_non_tls_listeners: bool,
}

impl From<&ApiService> for Service {
    fn from(api: &ApiService) -> Service {
        Service {
            secret_name: api.secret_name.clone(),
            issuer_name: api.issuer_name.clone(),
            disable_non_tls_listeners: api.disable_non_tls_listeners,
            ..Default::default()
        }
    }
}

impl Service {
    // Checks that the cert secret has the key and cert (and the CA, if it's going to be mounted)
    // and returns its hash; a service without a secret has nothing to validate.
    pub async fn validate_cert_secret(&self, h: &Helper, namespace: &str) -> anyhow::Result<(String, ReconcileOutcome)> {
        let Some(secret_name) = &self.secret_name else {
            return Ok((String::new(), ReconcileOutcome::Done));
        };

        let mut keys = vec![PRIVATE_KEY, CERT_KEY];
        if self.ca_mount.is_some() {
            keys.push(CA_KEY);
        }
        verify_secret(h.client(), namespace, secret_name, &keys, CERT_SECRET_REQUEUE).await
    }

    pub fn create_volume_mounts(&self, service_id: &str) -> Vec<corev1::VolumeMount> {
        let volume_name = format!("{service_id}-tls-certs");
        let mount = |path: String, sub_path: &str| corev1::VolumeMount {
            name: volume_name.clone(),
            mount_path: path,
            sub_path: Some(sub_path.into()),
            read_only: Some(true),
            ..Default::default()
        };

        let mut mounts = vec![];
        if self.secret_name.is_some() {
            let cert_path = self.cert_mount.clone().unwrap_or_else(|| format!("/etc/pki/tls/certs/{service_id}.crt"));
            let key_path = self.key_mount.clone().unwrap_or_else(|| format!("/etc/pki/tls/private/{service_id}.key"));
            mounts.push(mount(cert_path, CERT_KEY));
            mounts.push(mount(key_path, PRIVATE_KEY));
        }
        if let Some(ca_path) = &self.ca_mount {
            mounts.push(mount(ca_path.clone(), CA_KEY));
        }
        mounts
    }

    // Returns None when there's no cert secret to mount
    pub fn create_volume(&self, prefix: &str) -> Option<corev1::Volume> {
        let secret_name = self.secret_name.as_ref()?;
        Some(corev1::Volume {
            name: format!("{prefix}-tls-certs"),
            secret: Some(corev1::SecretVolumeSource {
                secret_name: Some(secret_name.clone()),
                default_mode: Some(0o440),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ca {
    pub ca_bundle_secret_name: String,
    pub ca_bundle_mount: Option<String>,
}

impl From<&ApiCa> for Ca {
    fn from(api: &ApiCa) -> Ca {
        Ca {
            ca_bundle_secret_name: api.ca_bundle_secret_name.clone(),
            ca_bundle_mount: None,
        }
    }
}

impl Ca {
    pub fn bundle_mount(&self) -> &str {
        self.ca_bundle_mount.as_deref().unwrap_or(DEFAULT_CA_BUNDLE_MOUNT)
    }

    pub fn create_volume_mounts(&self) -> Vec<corev1::VolumeMount> {
        vec![corev1::VolumeMount {
            name: CA_BUNDLE_LABEL.into(),
            mount_path: self.bundle_mount().into(),
            sub_path: Some(CA_BUNDLE_KEY.into()),
            read_only: Some(true),
            ..Default::default()
        }]
    }

    pub fn create_volume(&self) -> Option<corev1::Volume> {
        if self.ca_bundle_secret_name.is_empty() {
            return None;
        }
        Some(corev1::Volume {
            name: CA_BUNDLE_LABEL.into(),
            secret: Some(corev1::SecretVolumeSource {
                secret_name: Some(self.ca_bundle_secret_name.clone()),
                default_mode: Some(0o444),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

pub fn endpoint_to_service_map(api: &Api) -> BTreeMap<Endpoint, Service> {
    api.endpoint
        .iter()
        .flatten()
        .map(|(endpt, cfg)| (*endpt, Service::from(cfg)))
        .collect()
}

// Checks that the CA bundle secret has the bundle in it, and returns its hash
pub async fn validate_ca_cert_secret(
    client: kube::Client,
    namespace: &str,
    name: &str,
) -> anyhow::Result<(String, ReconcileOutcome)> {
    verify_secret(client, namespace, name, &[CA_BUNDLE_KEY], CERT_SECRET_REQUEUE).await
}

// Validates the cert secret of every endpoint and returns a single hash over all of them
pub async fn validate_endpoint_certs(
    h: &Helper,
    namespace: &str,
    endpoint_cfgs: &BTreeMap<Endpoint, Service>,
) -> anyhow::Result<(String, ReconcileOutcome)> {
    let mut cert_hashes = BTreeMap::new();
    for (endpt, cfg) in endpoint_cfgs {
        let (hash, outcome) = cfg.validate_cert_secret(h, namespace).await?;
        if !outcome.is_done() {
            return Ok((String::new(), outcome));
        }
        cert_hashes.insert(format!("cert-{endpt}"), EnvSetter::Value(hash));
    }

    Ok((hash_of_input_hashes(&cert_hashes)?, ReconcileOutcome::Done))
}

// All of the TLS config for a deployment: API endpoint certs keyed by endpoint type, other certs
// keyed by service name, and the CA bundle
#[derive(Clone, Debug, Default)]
pub struct Tls {
    pub api_service: BTreeMap<Endpoint, Service>,
    pub service: BTreeMap<String, Service>,
    pub ca: Option<Ca>,
}

impl Tls {
    pub async fn new(
        h: &Helper,
        namespace: &str,
        services: BTreeMap<String, Service>,
        endpoint_map: &BTreeMap<String, Endpoint>,
        ca: Option<Ca>,
    ) -> anyhow::Result<(Option<Tls>, ReconcileOutcome)> {
        let mut api_service = BTreeMap::new();
        for (name, svc) in &services {
            let (_, outcome) = svc.validate_cert_secret(h, namespace).await?;
            if !outcome.is_done() {
                return Ok((None, outcome));
            }

            let Some(endpt) = endpoint_map.get(name) else {
                bail!(TlsError::no_endpoint(name));
            };
            api_service.insert(*endpt, svc.clone());
        }

        Ok((Some(Tls { api_service, service: services, ca }), ReconcileOutcome::Done))
    }

    // mysql client options for connecting to the database over TLS; empty if there is nothing to
    // configure
    pub fn create_database_client_config(&self) -> String {
        let mut conn = vec![];
        for svc in self.service.values().filter(|s| s.secret_name.is_some()) {
            let cert_path = svc.cert_mount.as_deref().unwrap_or(DEFAULT_DB_CLIENT_CERT);
            let key_path = svc.key_mount.as_deref().unwrap_or(DEFAULT_DB_CLIENT_KEY);
            conn.push(format!("ssl-cert={cert_path}"));
            conn.push(format!("ssl-key={key_path}"));
        }

        if let Some(ca) = self.ca.as_ref().filter(|ca| !ca.ca_bundle_secret_name.is_empty()) {
            conn.push(format!("ssl-ca={}", ca.bundle_mount()));
        }

        if !conn.is_empty() {
            conn.insert(0, "ssl=1".into());
        }
        conn.join("\n")
    }
}
