use std::str::FromStr;

use super::*;
use crate::errors::*;

const SERVICE_ID: &str = "1234";
const PUBLIC_URL: &str = "http://keystone-public-openstack.apps-crc.testing";

fn public_endpoint() -> Endpoint {
    Endpoint {
        name: "keystone".into(),
        service_id: SERVICE_ID.into(),
        availability: Availability::Public,
        url: PUBLIC_URL.into(),
    }
}

fn endpoint_json(id: &str, interface: &str) -> serde_json::Value {
    json!({
        "id": id,
        "interface": interface,
        "region": TEST_REGION,
        "service_id": SERVICE_ID,
        "url": PUBLIC_URL,
    })
}

#[rstest]
#[case::admin("admin", Availability::Admin)]
#[case::internal("internal", Availability::Internal)]
#[case::public("public", Availability::Public)]
fn test_availability_from_str(#[case] s: &str, #[case] expected: Availability) {
    let a = Availability::from_str(s).unwrap();
    assert_eq!(a, expected);
    assert_eq!(a.to_string(), s);
}

#[rstest]
fn test_availability_invalid() {
    let err = Availability::from_str("private").unwrap_err();
    assert!(matches!(err.downcast_ref::<OpenStackError>(), Some(OpenStackError::InvalidAvailability(_))));
}

#[rstest]
fn test_availability_from_endpoint_type() {
    assert_eq!(Availability::from(lc_api::Endpoint::Internal), Availability::Internal);
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_endpoint(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET)
            .path("/v3/endpoints")
            .query_param("service_id", SERVICE_ID)
            .query_param("region_id", TEST_REGION)
            .query_param("interface", "public");
        then.json_body(json!({"endpoints": []}));
    });
    let create = keystone.mock(|when, then| {
        when.method(POST).path("/v3/endpoints").json_body(json!({
            "endpoint": {
                "interface": "public",
                "name": "keystone",
                "region": TEST_REGION,
                "service_id": SERVICE_ID,
                "url": PUBLIC_URL,
            },
        }));
        then.status(201).json_body(json!({"endpoint": endpoint_json("5678", "public")}));
    });

    let id = client(&keystone).create_endpoint(&public_endpoint()).await.unwrap();
    assert_eq!(id, "5678");
    list.assert();
    create.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_endpoint_already_exists(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/endpoints");
        then.json_body(json!({"endpoints": [endpoint_json("5678", "public")]}));
    });
    let create = keystone.mock(|when, then| {
        when.method(POST).path("/v3/endpoints");
        then.status(201);
    });

    let id = client(&keystone).create_endpoint(&public_endpoint()).await.unwrap();
    assert_eq!(id, "5678");
    list.assert();
    create.assert_calls(0);
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_get_endpoints_all_interfaces(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET)
            .path("/v3/endpoints")
            .query_param("service_id", SERVICE_ID)
            .query_param("region_id", TEST_REGION);
        then.json_body(json!({
            "endpoints": [endpoint_json("5678", "public"), endpoint_json("9abc", "internal")],
        }));
    });

    let endpoints = client(&keystone).get_endpoints(SERVICE_ID, None).await.unwrap();
    let interfaces: Vec<_> = endpoints.iter().map(|e| e.interface).collect();
    assert_eq!(interfaces, vec![Availability::Public, Availability::Internal]);
    list.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_update_endpoint(keystone: MockServer) {
    let update = keystone.mock(|when, then| {
        when.method(PATCH).path("/v3/endpoints/5678");
        then.json_body(json!({"endpoint": endpoint_json("5678", "public")}));
    });

    let id = client(&keystone).update_endpoint(&public_endpoint(), "5678").await.unwrap();
    assert_eq!(id, "5678");
    update.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_delete_endpoint(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/endpoints");
        then.json_body(json!({"endpoints": [endpoint_json("5678", "public")]}));
    });
    let delete = keystone.mock(|when, then| {
        when.method(DELETE).path("/v3/endpoints/5678");
        then.status(204);
    });

    client(&keystone).delete_endpoint(&public_endpoint()).await.unwrap();
    list.assert();
    delete.assert();
}
