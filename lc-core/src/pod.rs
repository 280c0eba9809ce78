use std::collections::BTreeMap;

use anyhow::Context;
use kube::api::ListParams;

use crate::errors::*;
use crate::helper::KubernetesError;
use crate::labels::label_selector_string;
use crate::prelude::*;

pub async fn get_pod_list_with_label(
    h: &Helper,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> anyhow::Result<Vec<corev1::Pod>> {
    let selector = label_selector_string(labels);
    let pod_api = kube::Api::<corev1::Pod>::namespaced(h.client(), namespace);
    let pods = pod_api
        .list(&ListParams::default().labels(&selector))
        .await
        .with_context(|| format!("error listing pods for labels: {selector}"))?;
    Ok(pods.items)
}

// Returns `<hostname>.<subdomain>` for every pod matching the labels
pub async fn get_pod_fqdn_list(
    h: &Helper,
    namespace: &str,
    labels: &BTreeMap<String, String>,
) -> anyhow::Result<Vec<String>> {
    let pods = get_pod_list_with_label(h, namespace, labels).await?;

    let mut fqdns = Vec::with_capacity(pods.len());
    for pod in &pods {
        let spec = pod.spec.as_ref();
        let hostname = spec.and_then(|s| s.hostname.as_deref()).unwrap_or_default();
        let subdomain = spec.and_then(|s| s.subdomain.as_deref()).unwrap_or_default();
        if hostname.is_empty() || subdomain.is_empty() {
            bail!(KubernetesError::no_pod_subdomain(&pod.name_any()));
        }
        fqdns.push(format!("{hostname}.{subdomain}"));
    }
    Ok(fqdns)
}

pub fn get_condition<'a>(conditions: &'a [corev1::PodCondition], type_: &str) -> Option<&'a corev1::PodCondition> {
    conditions.iter().find(|c| c.type_ == type_)
}

// A pod is ready when its Ready condition is True; the condition itself (if any) is returned so
// that callers can report why it isn't.
pub fn is_ready(status: Option<&corev1::PodStatus>) -> (bool, Option<&corev1::PodCondition>) {
    let conditions = status.and_then(|s| s.conditions.as_deref()).unwrap_or_default();
    match get_condition(conditions, "Ready") {
        Some(cond) => (cond.status == "True", Some(cond)),
        None => (false, None),
    }
}

// Checks every pod in the list; stops at the first one that isn't ready and returns the message
// from its Ready condition.  An empty list is never ready.
pub fn status_pod_list(pods: &[corev1::Pod]) -> (bool, String) {
    for pod in pods {
        let (ready, cond) = is_ready(pod.status.as_ref());
        if !ready {
            let message = cond.and_then(|c| c.message.clone()).unwrap_or_default();
            return (false, message);
        }
    }
    (!pods.is_empty(), String::new())
}
