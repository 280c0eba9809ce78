use std::collections::BTreeMap;

use k8s_openapi::ByteString;
use k8s_openapi::api::apps::v1 as appsv1;
use k8s_openapi::api::batch::v1 as batchv1;
use k8s_openapi::api::core::v1 as corev1;
use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
use kube::api::{
    DynamicObject,
    TypeMeta,
};
use rstest::fixture;

use crate::constants::*;

fn test_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(TEST_SERVICE_LABEL.into(), TEST_OWNER_NAME.into())])
}

pub fn owner_reference() -> metav1::OwnerReference {
    metav1::OwnerReference {
        api_version: TEST_OWNER_API_VERSION.into(),
        kind: TEST_OWNER_KIND.into(),
        name: TEST_OWNER_NAME.into(),
        uid: TEST_OWNER_UID.into(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

// The custom resource being reconciled in tests
#[fixture]
pub fn test_owner() -> DynamicObject {
    DynamicObject {
        types: Some(TypeMeta {
            api_version: TEST_OWNER_API_VERSION.into(),
            kind: TEST_OWNER_KIND.into(),
        }),
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(TEST_OWNER_NAME.into()),
            uid: Some(TEST_OWNER_UID.into()),
            ..Default::default()
        },
        data: serde_json::json!({"spec": {}}),
    }
}

fn test_pod_template() -> corev1::PodTemplateSpec {
    corev1::PodTemplateSpec {
        metadata: Some(metav1::ObjectMeta { labels: Some(test_labels()), ..Default::default() }),
        spec: Some(corev1::PodSpec {
            containers: vec![corev1::Container {
                name: "keystone-api".into(),
                image: Some("quay.io/podified-antelope-centos9/openstack-keystone:current-podified".into()),
                ..Default::default()
            }],
            ..Default::default()
        }),
    }
}

#[fixture]
pub fn test_statefulset(#[default(TEST_STATEFULSET)] name: &str, #[default(1)] replicas: i32) -> appsv1::StatefulSet {
    appsv1::StatefulSet {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(name.into()),
            labels: Some(test_labels()),
            ..Default::default()
        },
        spec: Some(appsv1::StatefulSetSpec {
            replicas: Some(replicas),
            selector: metav1::LabelSelector { match_labels: Some(test_labels()), ..Default::default() },
            template: test_pod_template(),
            ..Default::default()
        }),
        status: None,
    }
}

#[fixture]
pub fn test_deployment(#[default(TEST_DEPLOYMENT)] name: &str, #[default(1)] replicas: i32) -> appsv1::Deployment {
    appsv1::Deployment {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(name.into()),
            labels: Some(test_labels()),
            ..Default::default()
        },
        spec: Some(appsv1::DeploymentSpec {
            replicas: Some(replicas),
            selector: metav1::LabelSelector { match_labels: Some(test_labels()), ..Default::default() },
            template: test_pod_template(),
            ..Default::default()
        }),
        status: None,
    }
}

#[fixture]
pub fn test_job(#[default(TEST_JOB)] name: &str) -> batchv1::Job {
    let mut template = test_pod_template();
    if let Some(spec) = template.spec.as_mut() {
        spec.restart_policy = Some("OnFailure".into());
    }
    batchv1::Job {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(name.into()),
            ..Default::default()
        },
        spec: Some(batchv1::JobSpec { template, ..Default::default() }),
        status: None,
    }
}

// A pod matching the test labels, whose Ready condition has the given status
pub fn test_pod(name: &str, ready: bool, message: &str) -> corev1::Pod {
    corev1::Pod {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(name.into()),
            labels: Some(test_labels()),
            ..Default::default()
        },
        spec: Some(corev1::PodSpec {
            hostname: Some(name.into()),
            subdomain: Some(TEST_OWNER_NAME.into()),
            ..Default::default()
        }),
        status: Some(corev1::PodStatus {
            conditions: Some(vec![corev1::PodCondition {
                type_: "Ready".into(),
                status: if ready { "True".into() } else { "False".into() },
                message: (!message.is_empty()).then(|| message.into()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

pub fn test_secret(name: &str, data: &[(&str, &str)]) -> corev1::Secret {
    corev1::Secret {
        metadata: metav1::ObjectMeta {
            namespace: Some(TEST_NAMESPACE.into()),
            name: Some(name.into()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        ..Default::default()
    }
}

// Wraps objects in the envelope returned by a list call
pub fn list_of<T: serde::Serialize>(kind: &str, items: &[T]) -> serde_json::Value {
    serde_json::json!({
        "kind": kind,
        "apiVersion": "v1",
        "metadata": {},
        "items": items,
    })
}
