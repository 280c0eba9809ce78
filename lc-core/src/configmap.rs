use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use kube::api::PostParams;
use tracing::*;

use crate::env::EnvSetter;
use crate::errors::*;
use crate::helper::create_or_patch;
use crate::prelude::*;
use crate::util::{
    Template,
    TemplateType,
    object_hash,
};

fn template_namespace<'a>(h: &'a Helper, tmpl: &'a Template) -> &'a str {
    if tmpl.namespace.is_empty() { h.owner_namespace() } else { &tmpl.namespace }
}

// Content hash of a configmap; only the data is hashed, so metadata churn doesn't trigger
// restarts of whatever consumes it
pub fn config_map_hash(cm: &corev1::ConfigMap) -> anyhow::Result<String> {
    object_hash(&(&cm.data, &cm.binary_data)).context("error calculating configuration hash")
}

// Creates or patches every configmap in `templates`; custom-type templates are only created if
// missing.  The hash of each configmap is recorded in `env_vars` under the configmap's name.
pub async fn ensure_config_maps(
    h: &Helper,
    templates: &[Template],
    mut env_vars: Option<&mut BTreeMap<String, EnvSetter>>,
) -> EmptyResult {
    for tmpl in templates {
        let hash = if tmpl.type_ == TemplateType::Custom {
            create_or_get_custom_config_map(h, tmpl).await?
        } else {
            let (hash, op) = create_or_patch_config_map(h, tmpl).await?;
            if op != OperationResult::Unchanged {
                info!("ConfigMap {} successfully reconciled - operation: {op}", tmpl.name);
            }
            hash
        };

        if let Some(envs) = env_vars.as_deref_mut() {
            envs.insert(tmpl.name.clone(), EnvSetter::Value(hash));
        }
    }
    Ok(())
}

pub async fn create_or_patch_config_map(h: &Helper, tmpl: &Template) -> anyhow::Result<(String, OperationResult)> {
    let ns = template_namespace(h, tmpl);
    let cm_api = kube::Api::<corev1::ConfigMap>::namespaced(h.client(), ns);

    // annotations are only applied when the configmap is first created
    let seed = corev1::ConfigMap {
        metadata: metav1::ObjectMeta {
            name: Some(tmpl.name.clone()),
            namespace: Some(ns.into()),
            annotations: Some(tmpl.annotations.clone()),
            ..Default::default()
        },
        ..Default::default()
    };

    let (cm, op) = create_or_patch(&cm_api, seed, |cm| {
        cm.metadata.labels = Some(tmpl.labels.clone());
        cm.data = Some(tmpl.rendered_data());
        if !tmpl.skip_set_owner {
            h.set_controller_reference(&mut cm.metadata)?;
        }
        Ok(())
    })
    .await
    .with_context(|| format!("error create/updating configmap {}", tmpl.name))?;

    Ok((config_map_hash(&cm)?, op))
}

// Custom configmaps belong to the user: create an empty one if it's missing, but otherwise only
// read it
pub async fn create_or_get_custom_config_map(h: &Helper, tmpl: &Template) -> anyhow::Result<String> {
    let ns = template_namespace(h, tmpl);
    let cm_api = kube::Api::<corev1::ConfigMap>::namespaced(h.client(), ns);

    let cm = match cm_api.get_opt(&tmpl.name).await? {
        Some(cm) => cm,
        None => {
            let mut cm = corev1::ConfigMap {
                metadata: metav1::ObjectMeta {
                    name: Some(tmpl.name.clone()),
                    namespace: Some(ns.into()),
                    labels: Some(tmpl.labels.clone()),
                    annotations: Some(tmpl.annotations.clone()),
                    ..Default::default()
                },
                data: Some(BTreeMap::new()),
                ..Default::default()
            };
            if !tmpl.skip_set_owner {
                h.set_controller_reference(&mut cm.metadata)?;
            }

            info!("creating a new ConfigMap {ns}/{}", tmpl.name);
            cm_api.create(&PostParams::default(), &cm).await?
        },
    };

    config_map_hash(&cm)
}

// Fetches each named configmap, records its hash in `env_vars`, and returns the hashes for the
// owner's status
pub async fn get_config_maps(
    h: &Helper,
    names: &[&str],
    namespace: &str,
    env_vars: &mut BTreeMap<String, EnvSetter>,
) -> anyhow::Result<Vec<Hash>> {
    let mut hashes = Vec::with_capacity(names.len());
    for name in names {
        let (_, hash) = get_config_map_and_hash_with_name(h, name, namespace).await?;
        env_vars.insert(name.to_string(), EnvSetter::Value(hash.clone()));
        hashes.push(Hash { name: name.to_string(), hash });
    }
    Ok(hashes)
}

pub async fn get_config_map_and_hash_with_name(
    h: &Helper,
    name: &str,
    namespace: &str,
) -> anyhow::Result<(corev1::ConfigMap, String)> {
    let cm_api = kube::Api::<corev1::ConfigMap>::namespaced(h.client(), namespace);
    let cm = cm_api
        .get(name)
        .await
        .inspect_err(|err| error!("ConfigMap {namespace}/{name} not found: {err}"))?;
    let hash = config_map_hash(&cm)?;
    Ok((cm, hash))
}

// Fetches a configmap from the owner's namespace; a missing configmap isn't an error, the caller
// should just try again after `requeue`
pub async fn get_config_map(
    h: &Helper,
    name: &str,
    requeue: Duration,
) -> anyhow::Result<(Option<corev1::ConfigMap>, ReconcileOutcome)> {
    let cm_api = kube::Api::<corev1::ConfigMap>::namespaced(h.client(), h.owner_namespace());
    match cm_api.get_opt(name).await {
        Ok(Some(cm)) => Ok((Some(cm), ReconcileOutcome::Done)),
        Ok(None) => {
            info!("{name} config map does not exist, requeuing in {requeue:?}");
            Ok((None, ReconcileOutcome::RequeueAfter(requeue)))
        },
        Err(err) => Err(anyhow!(err).context(format!("error getting {name} config map"))),
    }
}
