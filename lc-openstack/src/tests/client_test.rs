use super::*;
use crate::errors::*;

fn auth_opts(server: &MockServer) -> AuthOpts {
    AuthOpts {
        auth_url: server.url("/v3"),
        username: "admin".into(),
        password: "12345678".into(),
        tenant_name: "admin".into(),
        domain_name: "Default".into(),
        region: TEST_REGION.into(),
    }
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_authenticate(keystone: MockServer) {
    let auth = keystone.mock(|when, then| {
        when.method(POST).path("/v3/auth/tokens").json_body(json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {"name": "admin", "domain": {"name": "Default"}, "password": "12345678"},
                    },
                },
                "scope": {"project": {"name": "admin", "domain": {"name": "Default"}}},
            },
        }));
        then.status(201)
            .header("X-Subject-Token", TEST_TOKEN)
            .json_body(json!({"token": {"methods": ["password"]}}));
    });
    let roles = keystone.mock(|when, then| {
        when.method(GET).path("/v3/roles").header("X-Auth-Token", TEST_TOKEN);
        then.json_body(json!({"roles": [{"id": "abc", "name": "admin"}]}));
    });

    let os = OpenStack::authenticate(&auth_opts(&keystone)).await.unwrap();
    assert_eq!(os.region(), TEST_REGION);
    os.get_role("admin").await.unwrap();

    auth.assert();
    roles.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_authenticate_missing_token(keystone: MockServer) {
    let auth = keystone.mock(|when, then| {
        when.method(POST).path("/v3/auth/tokens");
        then.status(201).json_body(json!({"token": {}}));
    });

    let err = OpenStack::authenticate(&auth_opts(&keystone)).await.unwrap_err();
    assert!(matches!(err.downcast_ref::<OpenStackError>(), Some(OpenStackError::MissingToken(_))));
    auth.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_authenticate_unauthorized(keystone: MockServer) {
    let auth = keystone.mock(|when, then| {
        when.method(POST).path("/v3/auth/tokens");
        then.status(401);
    });

    assert!(OpenStack::authenticate(&auth_opts(&keystone)).await.is_err());
    auth.assert();
}
