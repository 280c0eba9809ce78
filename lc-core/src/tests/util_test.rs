use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::env::EnvSetter;
use crate::errors::*;
use crate::macros::*;
use crate::util::*;

#[rstest]
fn test_object_hash_stable() {
    let obj = json!({"foo": "bar", "baz": [1, 2, 3]});
    let h1 = object_hash(&obj).unwrap();
    let h2 = object_hash(&obj.clone()).unwrap();
    assert_eq!(h1, h2);
    assert_eq!(h1.len(), 64);
    assert_ne!(h1, object_hash(&json!({"foo": "bar"})).unwrap());
}

#[rstest]
fn test_calculate_hash_known_value() {
    // sha256 of the empty string
    assert_eq!(calculate_hash(b""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
}

#[rstest]
fn test_hash_of_input_hashes_order_independent() {
    let mut a = BTreeMap::new();
    a.insert("cert-public".to_string(), EnvSetter::value("abc"));
    a.insert("cert-internal".to_string(), EnvSetter::value("def"));

    let mut b = BTreeMap::new();
    b.insert("cert-internal".to_string(), EnvSetter::value("def"));
    b.insert("cert-public".to_string(), EnvSetter::value("abc"));

    assert_eq!(hash_of_input_hashes(&a).unwrap(), hash_of_input_hashes(&b).unwrap());

    b.insert("cert-public".to_string(), EnvSetter::value("xyz"));
    assert_ne!(hash_of_input_hashes(&a).unwrap(), hash_of_input_hashes(&b).unwrap());
}

#[rstest]
fn test_merge_string_maps_first_wins() {
    let m1 = kmap!("a" => "1", "b" => "2");
    let m2 = kmap!("b" => "3", "c" => "4");
    let merged = merge_string_maps(&[&m1, &m2]);
    assert_eq!(merged, kmap!("a" => "1", "b" => "2", "c" => "4"));
}

#[rstest]
fn test_merge_string_maps_empty() {
    assert!(merge_string_maps(&[]).is_empty());
}

#[rstest]
fn test_template_rendered_data_custom_wins() {
    let tmpl = Template {
        name: "keystone-config-data".into(),
        data: kmap!("keystone.conf" => "[DEFAULT]", "policy.yaml" => ""),
        custom_data: kmap!("policy.yaml" => "admin: true", "custom.conf" => "[x]"),
        ..Default::default()
    };
    assert_eq!(
        tmpl.rendered_data(),
        kmap!("keystone.conf" => "[DEFAULT]", "policy.yaml" => "admin: true", "custom.conf" => "[x]"),
    );
}

#[rstest]
fn test_template_defaults_to_operator_rendered() {
    assert_eq!(Template::default().type_, TemplateType::None);
}

#[rstest]
#[tokio::test]
async fn test_poller_waits() {
    let poller = Poller::new(Duration::from_millis(1), Duration::from_secs(60));
    poller.wait().await.unwrap();
}

#[rstest]
#[tokio::test]
async fn test_poller_times_out() {
    let poller = Poller::new(Duration::from_millis(100), Duration::from_millis(50));
    let err = poller.wait().await.unwrap_err();
    assert!(is_poll_timeout(&err));
}

#[rstest]
fn test_is_poll_timeout_other_error() {
    assert!(!is_poll_timeout(&anyhow!("something else")));
}
