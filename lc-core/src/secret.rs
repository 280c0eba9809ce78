use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use k8s_openapi::ByteString;
use kube::api::{
    DeleteParams,
    PostParams,
};
use tracing::*;

use crate::env::EnvSetter;
use crate::errors::*;
use crate::helper::{
    KubernetesError,
    create_or_patch,
};
use crate::prelude::*;
use crate::util::{
    Template,
    TemplateType,
    object_hash,
};

pub fn secret_hash(secret: &corev1::Secret) -> anyhow::Result<String> {
    object_hash(&secret.data).context("error calculating secret hash")
}

fn to_secret_data(data: BTreeMap<String, String>) -> BTreeMap<String, ByteString> {
    data.into_iter().map(|(k, v)| (k, ByteString(v.into_bytes()))).collect()
}

pub async fn get_secret(h: &Helper, name: &str, namespace: &str) -> anyhow::Result<(corev1::Secret, String)> {
    let secret_api = kube::Api::<corev1::Secret>::namespaced(h.client(), namespace);
    let secret = secret_api.get(name).await?;
    let hash = secret_hash(&secret)?;
    Ok((secret, hash))
}

// Checks that the secret exists and has every one of the expected keys, and returns a hash of the
// expected values (in the order given).  A missing secret means "try again after `requeue`"; a
// missing key is an error.
pub async fn verify_secret(
    client: kube::Client,
    namespace: &str,
    name: &str,
    expected_keys: &[&str],
    requeue: Duration,
) -> anyhow::Result<(String, ReconcileOutcome)> {
    let secret_api = kube::Api::<corev1::Secret>::namespaced(client, namespace);
    let Some(secret) = secret_api.get_opt(name).await? else {
        info!("secret {namespace}/{name} not found, requeuing in {requeue:?}");
        return Ok((String::new(), ReconcileOutcome::RequeueAfter(requeue)));
    };

    let data = secret.data.unwrap_or_default();
    let mut values = Vec::with_capacity(expected_keys.len());
    for key in expected_keys {
        let Some(val) = data.get(*key) else {
            bail!(KubernetesError::field_not_found(&format!("{key} in secret {namespace}/{name}")));
        };
        values.push(val);
    }

    Ok((object_hash(&values)?, ReconcileOutcome::Done))
}

// Reads a single value out of a secret in the owner's namespace
pub async fn get_data_from_secret(
    h: &Helper,
    name: &str,
    key: &str,
    requeue: Duration,
) -> anyhow::Result<(Option<String>, ReconcileOutcome)> {
    let secret_api = kube::Api::<corev1::Secret>::namespaced(h.client(), h.owner_namespace());
    let Some(secret) = secret_api.get_opt(name).await? else {
        info!("secret {name} not found, requeuing in {requeue:?}");
        return Ok((None, ReconcileOutcome::RequeueAfter(requeue)));
    };

    let Some(val) = secret.data.unwrap_or_default().remove(key) else {
        bail!(KubernetesError::field_not_found(&format!("{key} in secret {name}")));
    };
    let val = String::from_utf8(val.0).with_context(|| format!("{key} in secret {name} is not valid utf8"))?;
    Ok((Some(val), ReconcileOutcome::Done))
}

pub async fn create_or_patch_secret(h: &Helper, tmpl: &Template) -> anyhow::Result<(String, OperationResult)> {
    let ns = if tmpl.namespace.is_empty() { h.owner_namespace() } else { &tmpl.namespace };
    let secret_api = kube::Api::<corev1::Secret>::namespaced(h.client(), ns);

    let seed = corev1::Secret {
        metadata: metav1::ObjectMeta {
            name: Some(tmpl.name.clone()),
            namespace: Some(ns.into()),
            annotations: Some(tmpl.annotations.clone()),
            ..Default::default()
        },
        ..Default::default()
    };

    let (secret, op) = create_or_patch(&secret_api, seed, |secret| {
        secret.metadata.labels = Some(tmpl.labels.clone());
        secret.data = Some(to_secret_data(tmpl.rendered_data()));
        if !tmpl.skip_set_owner {
            h.set_controller_reference(&mut secret.metadata)?;
        }
        Ok(())
    })
    .await
    .with_context(|| format!("error create/updating secret {}", tmpl.name))?;

    Ok((secret_hash(&secret)?, op))
}

async fn create_or_get_custom_secret(h: &Helper, tmpl: &Template) -> anyhow::Result<String> {
    let ns = if tmpl.namespace.is_empty() { h.owner_namespace() } else { &tmpl.namespace };
    let secret_api = kube::Api::<corev1::Secret>::namespaced(h.client(), ns);

    let secret = match secret_api.get_opt(&tmpl.name).await? {
        Some(secret) => secret,
        None => {
            let mut secret = corev1::Secret {
                metadata: metav1::ObjectMeta {
                    name: Some(tmpl.name.clone()),
                    namespace: Some(ns.into()),
                    labels: Some(tmpl.labels.clone()),
                    annotations: Some(tmpl.annotations.clone()),
                    ..Default::default()
                },
                ..Default::default()
            };
            if !tmpl.skip_set_owner {
                h.set_controller_reference(&mut secret.metadata)?;
            }

            info!("creating a new Secret {ns}/{}", tmpl.name);
            secret_api.create(&PostParams::default(), &secret).await?
        },
    };

    secret_hash(&secret)
}

// Same as `ensure_config_maps`, but for secrets
pub async fn ensure_secrets(
    h: &Helper,
    templates: &[Template],
    mut env_vars: Option<&mut BTreeMap<String, EnvSetter>>,
) -> EmptyResult {
    for tmpl in templates {
        let hash = if tmpl.type_ == TemplateType::Custom {
            create_or_get_custom_secret(h, tmpl).await?
        } else {
            let (hash, op) = create_or_patch_secret(h, tmpl).await?;
            if op != OperationResult::Unchanged {
                info!("Secret {} successfully reconciled - operation: {op}", tmpl.name);
            }
            hash
        };

        if let Some(envs) = env_vars.as_deref_mut() {
            envs.insert(tmpl.name.clone(), EnvSetter::Value(hash));
        }
    }
    Ok(())
}

pub async fn delete_secret(h: &Helper, name: &str, namespace: &str) -> EmptyResult {
    let secret_api = kube::Api::<corev1::Secret>::namespaced(h.client(), namespace);
    match secret_api.delete(name, &DeleteParams::default()).await {
        Err(err) if !is_kube_not_found(&err) => Err(anyhow!(err).context(format!("error deleting secret {name}"))),
        _ => Ok(()),
    }
}
