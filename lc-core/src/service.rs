use std::collections::BTreeMap;
use std::time::Duration;

use kube::api::DeleteParams;
use tracing::*;

use crate::errors::*;
use crate::helper::create_or_patch;
use crate::prelude::*;
use crate::util::merge_string_maps;

#[derive(Clone, Debug, Default)]
pub struct GenericServicePort {
    pub name: String,
    pub port: i32,
    pub protocol: String,
}

#[derive(Clone, Debug, Default)]
pub struct GenericServiceDetails {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub port: GenericServicePort,
}

#[derive(Clone, Debug, Default)]
pub struct MetalLBServiceDetails {
    pub name: String,
    pub namespace: String,
    pub annotations: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub port: GenericServicePort,
}

fn service_port(port: &GenericServicePort) -> corev1::ServicePort {
    corev1::ServicePort {
        name: Some(port.name.clone()),
        port: port.port,
        protocol: Some(port.protocol.clone()),
        ..Default::default()
    }
}

// A plain ClusterIP service in front of the selected pods
pub fn generic_service(details: &GenericServiceDetails) -> corev1::Service {
    corev1::Service {
        metadata: metav1::ObjectMeta {
            name: Some(details.name.clone()),
            namespace: Some(details.namespace.clone()),
            labels: Some(details.labels.clone()),
            ..Default::default()
        },
        spec: Some(corev1::ServiceSpec {
            selector: Some(details.selector.clone()),
            ports: Some(vec![service_port(&details.port)]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

// A LoadBalancer service whose address is handed out by MetalLB; the annotations pick the pool
// and (optionally) the IPs to use
pub fn metallb_service(details: &MetalLBServiceDetails) -> corev1::Service {
    corev1::Service {
        metadata: metav1::ObjectMeta {
            name: Some(details.name.clone()),
            namespace: Some(details.namespace.clone()),
            annotations: Some(details.annotations.clone()),
            labels: Some(details.labels.clone()),
            ..Default::default()
        },
        spec: Some(corev1::ServiceSpec {
            selector: Some(details.selector.clone()),
            ports: Some(vec![service_port(&details.port)]),
            type_: Some("LoadBalancer".into()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub struct Service {
    service: corev1::Service,
    labels: BTreeMap<String, String>,
    timeout: Duration,
}

impl Service {
    pub fn new(service: corev1::Service, labels: BTreeMap<String, String>, timeout: Duration) -> Service {
        Service { service, labels, timeout }
    }

    pub async fn create_or_patch(&mut self, h: &Helper) -> anyhow::Result<ReconcileOutcome> {
        let name = self.service.name_any();
        let ns = self.service.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let svc_api = kube::Api::<corev1::Service>::namespaced(h.client(), &ns);

        let seed = corev1::Service {
            metadata: metav1::ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(ns.clone()),
                ..Default::default()
            },
            ..Default::default()
        };

        let desired = &self.service;
        let labels = &self.labels;
        let res = create_or_patch(&svc_api, seed, |svc| {
            svc.metadata.labels = Some(merge_string_maps(&[svc.labels(), labels, desired.labels()]));
            svc.metadata.annotations = Some(merge_string_maps(&[desired.annotations(), svc.annotations()]));

            // the cluster IP is allocated by the apiserver, so leave whatever is already there
            let desired_spec = desired.spec.clone().unwrap_or_default();
            let spec = svc.spec.get_or_insert_with(Default::default);
            spec.selector = desired_spec.selector;
            spec.ports = desired_spec.ports;
            spec.type_ = desired_spec.type_;
            spec.external_traffic_policy = desired_spec.external_traffic_policy;

            h.set_controller_reference(&mut svc.metadata)
        })
        .await;

        let (svc, op) = match res {
            Ok(r) => r,
            Err(err) if is_not_found(&err) => {
                info!("Service {name} not found, reconcile in {:?}", self.timeout);
                return Ok(ReconcileOutcome::RequeueAfter(self.timeout));
            },
            Err(err) => return Err(err),
        };
        if op != OperationResult::Unchanged {
            info!("Service {name} {op}");
        }
        self.service = svc;

        Ok(ReconcileOutcome::Done)
    }

    // <name>.<namespace>.svc
    pub fn service_hostname(&self) -> String {
        let ns = self.service.namespace().unwrap_or_default();
        format!("{}.{ns}.svc", self.service.name_any())
    }

    // <name>.<namespace>.svc:<port> for the first port of the service
    pub fn service_hostname_port(&self) -> String {
        let port = self
            .service
            .spec
            .as_ref()
            .and_then(|s| s.ports.as_ref())
            .and_then(|ports| ports.first())
            .map(|p| p.port)
            .unwrap_or_default();
        format!("{}:{port}", self.service_hostname())
    }

    pub fn service(&self) -> &corev1::Service {
        &self.service
    }

    pub async fn delete(&self, h: &Helper) -> EmptyResult {
        let name = self.service.name_any();
        let ns = self.service.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let svc_api = kube::Api::<corev1::Service>::namespaced(h.client(), &ns);
        match svc_api.delete(&name, &DeleteParams::default()).await {
            Err(err) if !is_kube_not_found(&err) => Err(anyhow!(err).context(format!("error deleting service {name}"))),
            _ => Ok(()),
        }
    }
}
