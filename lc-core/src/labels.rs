use std::collections::BTreeMap;

use kube::Resource;

use crate::macros::*;
use crate::prelude::*;
use crate::util::merge_string_maps;

pub fn group_label(service_name: &str) -> String {
    format!("{service_name}.{GROUP_LABEL_SUFFIX}")
}

pub fn owner_uid_label_selector(group_label: &str) -> String {
    format!("{group_label}/{OWNER_UID_LABEL_SUFFIX}")
}

pub fn owner_namespace_label_selector(group_label: &str) -> String {
    format!("{group_label}/{OWNER_NAMESPACE_LABEL_SUFFIX}")
}

pub fn owner_name_label_selector(group_label: &str) -> String {
    format!("{group_label}/{OWNER_NAME_LABEL_SUFFIX}")
}

// Default labels for objects created on behalf of `owner`; custom labels are added on top but
// can't override the owner labels.
pub fn get_labels(
    owner: &impl Resource,
    group_label: &str,
    custom: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let owner_labels = kmap!(
        owner_uid_label_selector(group_label) => owner.uid().unwrap_or_default(),
        owner_namespace_label_selector(group_label) => owner.namespace().unwrap_or_default(),
        owner_name_label_selector(group_label) => owner.name_any(),
    );

    merge_string_maps(&[&owner_labels, custom])
}

// Renders a label map as a `k=v,k2=v2` selector string
pub fn label_selector_string(labels: &BTreeMap<String, String>) -> String {
    labels.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",")
}
