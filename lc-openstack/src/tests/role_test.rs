use super::*;
use crate::errors::*;

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_role(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/roles").query_param("name", "service");
        then.json_body(json!({"roles": []}));
    });
    let create = keystone.mock(|when, then| {
        when.method(POST).path("/v3/roles").json_body(json!({"role": {"name": "service"}}));
        then.status(201).json_body(json!({"role": {"id": "r1", "name": "service"}}));
    });

    let id = client(&keystone).create_role("service").await.unwrap();
    assert_eq!(id, "r1");
    list.assert();
    create.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_role_exists(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/roles");
        then.json_body(json!({"roles": [{"id": "r1", "name": "service"}]}));
    });
    let create = keystone.mock(|when, then| {
        when.method(POST).path("/v3/roles");
        then.status(201);
    });

    let id = client(&keystone).create_role("service").await.unwrap();
    assert_eq!(id, "r1");
    list.assert();
    create.assert_calls(0);
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_role_list_error(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/roles");
        then.status(503);
    });

    let err = client(&keystone).create_role("service").await.unwrap_err();
    assert!(!is_keystone_not_found(&err));
    list.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_get_role_not_found(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/roles");
        then.json_body(json!({"roles": []}));
    });

    let err = client(&keystone).get_role("service").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<OpenStackError>(), Some(OpenStackError::NotFound(_))));
    list.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_assign_user_role(keystone: MockServer) {
    let list = keystone.mock(|when, then| {
        when.method(GET).path("/v3/roles").query_param("name", "admin");
        then.json_body(json!({"roles": [{"id": "r1", "name": "admin"}]}));
    });
    let assign = keystone.mock(|when, then| {
        when.method(PUT).path("/v3/projects/p1/users/u1/roles/r1");
        then.status(204);
    });

    client(&keystone).assign_user_role("admin", "u1", "p1").await.unwrap();
    list.assert();
    assign.assert();
}
