use std::collections::BTreeMap;

use serde_json::json;

use super::*;
use crate::macros::*;
use crate::networkattachment::*;

fn pod_with_networks(name: &str, networks: serde_json::Value) -> corev1::Pod {
    let mut pod = test_pod(name, true, "");
    pod.annotations_mut().insert(NETWORK_STATUS_ANNOTATION.into(), networks.to_string());
    pod
}

fn network_status(pod_ip: &str, internal_ip: &str) -> serde_json::Value {
    json!([
        {"name": "ovn-kubernetes", "interface": "eth0", "ips": [pod_ip], "default": true},
        {"name": "test-namespace/internalapi", "interface": "internalapi", "ips": [internal_ip], "mac": "de:39:07:a0:b9:2c"},
    ])
}

#[rstest]
fn test_create_networks_annotation() {
    let annotations = create_networks_annotation(TEST_NAMESPACE, &["internalapi", "storage"]).unwrap();
    assert_eq!(
        annotations,
        kmap!(
            NETWORK_ATTACHMENT_ANNOTATION =>
            r#"[{"name":"internalapi","namespace":"test-namespace"},{"name":"storage","namespace":"test-namespace"}]"#
        )
    );
}

#[rstest]
fn test_create_networks_annotation_empty() {
    let annotations = create_networks_annotation(TEST_NAMESPACE, &[]).unwrap();
    assert_eq!(annotations.get(NETWORK_ATTACHMENT_ANNOTATION).map(String::as_str), Some("[]"));
}

#[rstest]
fn test_get_network_status_from_annotation() {
    let annotations = kmap!(NETWORK_STATUS_ANNOTATION => network_status("10.217.0.10", "172.17.0.30").to_string());
    let status = get_network_status_from_annotation(&annotations).unwrap();
    assert_eq!(
        status,
        vec![
            NetworkStatus {
                name: "ovn-kubernetes".into(),
                interface: Some("eth0".into()),
                ips: vec!["10.217.0.10".into()],
                mac: None,
                default: true,
            },
            NetworkStatus {
                name: "test-namespace/internalapi".into(),
                interface: Some("internalapi".into()),
                ips: vec!["172.17.0.30".into()],
                mac: Some("de:39:07:a0:b9:2c".into()),
                default: false,
            },
        ]
    );
}

#[rstest]
fn test_get_network_status_from_annotation_missing() {
    assert!(get_network_status_from_annotation(&BTreeMap::new()).unwrap().is_empty());
}

#[rstest]
fn test_get_network_status_from_annotation_invalid() {
    let annotations = kmap!(NETWORK_STATUS_ANNOTATION => "not json");
    assert!(get_network_status_from_annotation(&annotations).is_err());
}

#[rstest]
#[tokio::test]
#[case::all_attached(2, true)]
#[case::not_enough_pods(3, false)]
#[traced_test]
async fn test_verify_network_status_from_annotation(#[case] ready_count: usize, #[case] expected_ready: bool) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let pods = vec![
        pod_with_networks("keystone-0", network_status("10.217.0.10", "172.17.0.30")),
        pod_with_networks("keystone-1", network_status("10.217.0.11", "172.17.0.31")),
    ];
    fake_apiserver.handle(move |when, then| {
        when.method(GET).path(ns_path("v1", "pods"));
        then.json_body(list_of("PodList", &pods));
    });
    fake_apiserver.build();

    let h = test_helper(client);
    let (ready, ips) = verify_network_status_from_annotation(
        &h,
        &["test-namespace/internalapi"],
        &kmap!(TEST_SERVICE_LABEL => TEST_OWNER_NAME),
        ready_count,
    )
    .await
    .unwrap();

    assert_eq!(ready, expected_ready);
    assert_eq!(
        ips,
        BTreeMap::from([(
            "test-namespace/internalapi".to_string(),
            vec!["172.17.0.30".to_string(), "172.17.0.31".to_string()]
        )])
    );
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_verify_network_status_no_annotation() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let pods = vec![test_pod("keystone-0", true, "")];
    fake_apiserver.handle(move |when, then| {
        when.method(GET).path(ns_path("v1", "pods"));
        then.json_body(list_of("PodList", &pods));
    });
    fake_apiserver.build();

    let h = test_helper(client);
    let (ready, ips) = verify_network_status_from_annotation(
        &h,
        &["test-namespace/internalapi"],
        &kmap!(TEST_SERVICE_LABEL => TEST_OWNER_NAME),
        1,
    )
    .await
    .unwrap();

    assert!(!ready);
    assert!(ips.is_empty());
    fake_apiserver.assert();
}
