use std::collections::BTreeMap;

use anyhow::Context;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json as json;

use crate::macros::*;
use crate::pod::get_pod_list_with_label;
use crate::prelude::*;

// An entry in the multus `networks` annotation
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct NetworkSelectionElement {
    pub name: String,
    pub namespace: String,
}

// An entry in the multus `network-status` annotation; only the fields we look at
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkStatus {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(default)]
    pub default: bool,
}

// Builds the pod annotation that attaches it to each of the named network attachment definitions,
// e.g. `k8s.v1.cni.cncf.io/networks: [{"name":"internalapi","namespace":"openstack"}]`
pub fn create_networks_annotation(namespace: &str, nads: &[&str]) -> anyhow::Result<BTreeMap<String, String>> {
    let networks: Vec<_> = nads
        .iter()
        .map(|nad| NetworkSelectionElement { name: nad.to_string(), namespace: namespace.into() })
        .collect();
    let value = json::to_string(&networks).with_context(|| format!("failed to encode networks {nads:?} into json"))?;
    Ok(kmap!(NETWORK_ATTACHMENT_ANNOTATION => value))
}

// A pod without the annotation has no network status, which isn't an error
pub fn get_network_status_from_annotation(annotations: &BTreeMap<String, String>) -> anyhow::Result<Vec<NetworkStatus>> {
    let Some(status) = annotations.get(NETWORK_STATUS_ANNOTATION) else {
        return Ok(vec![]);
    };
    json::from_str(status).with_context(|| format!("failed to decode network status {status}"))
}

// Looks at the network status of every pod matching `labels` and collects the IPs each of the
// `nads` (given as `<namespace>/<name>`) has handed out.  The networks are ready once every one of
// them has been attached to at least `ready_count` pods.
pub async fn verify_network_status_from_annotation(
    h: &Helper,
    nads: &[&str],
    labels: &BTreeMap<String, String>,
    ready_count: usize,
) -> anyhow::Result<(bool, BTreeMap<String, Vec<String>>)> {
    let pods = get_pod_list_with_label(h, h.owner_namespace(), labels).await?;

    let mut ips: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut attached: BTreeMap<String, usize> = BTreeMap::new();
    for pod in &pods {
        for status in get_network_status_from_annotation(pod.annotations())? {
            if nads.contains(&status.name.as_str()) {
                *attached.entry(status.name.clone()).or_default() += 1;
                ips.entry(status.name).or_default().extend(status.ips);
            }
        }
    }

    let ready = nads.iter().all(|nad| attached.get(*nad).copied().unwrap_or_default() >= ready_count);
    Ok((ready, ips))
}
