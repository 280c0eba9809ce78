use serde_json::json;

use super::*;
use crate::database::*;
use crate::macros::*;

fn db_path() -> String {
    format!("{}/{TEST_OWNER_NAME}", ns_path("mariadb.openstack.org/v1beta1", "mariadbdatabases"))
}

fn test_database() -> Database {
    Database::new(
        "openstack.test-namespace.svc",
        "keystone",
        "keystone",
        TEST_SECRET,
        kmap!("dbName" => "openstack"),
    )
}

fn existing_db(secret: &str) -> serde_json::Value {
    json!({
        "apiVersion": "mariadb.openstack.org/v1beta1",
        "kind": "MariaDBDatabase",
        "metadata": {
            "name": TEST_OWNER_NAME,
            "namespace": TEST_NAMESPACE,
            "resourceVersion": "7",
            "labels": {"dbName": "openstack"},
            "ownerReferences": [owner_reference()],
        },
        "spec": {"name": "keystone", "secret": secret},
        "status": {"completed": true},
    })
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_db_created() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_not_found(db_path()).handle(move |when, then| {
        when.method(POST).path(ns_path("mariadb.openstack.org/v1beta1", "mariadbdatabases"));
        then.json_body(existing_db(TEST_SECRET));
    });
    fake_apiserver.build();

    let h = test_helper(client);
    let (op, outcome) = test_database().create_or_patch_db(&h).await.unwrap();

    assert_eq!(op, OperationResult::Created);
    assert_eq!(outcome, ReconcileOutcome::RequeueAfter(DEFAULT_REQUEUE_DURATION));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_db_unchanged() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle(move |when, then| {
        when.method(GET).path(db_path());
        then.json_body(existing_db(TEST_SECRET));
    });
    fake_apiserver.build();

    let h = test_helper(client);
    let (op, outcome) = test_database().create_or_patch_db(&h).await.unwrap();

    assert_eq!(op, OperationResult::Unchanged);
    assert_eq!(outcome, ReconcileOutcome::Done);
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_db_secret_changed() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path(db_path());
            then.json_body(existing_db("old-secret"));
        })
        .handle(move |when, then| {
            when.method(PATCH).path(db_path()).json_body(json!([
                {"op": "test", "path": "/metadata/resourceVersion", "value": "7"},
                {"op": "replace", "path": "/spec/secret", "value": TEST_SECRET},
            ]));
            then.json_body(existing_db(TEST_SECRET));
        });
    fake_apiserver.build();

    let h = test_helper(client);
    let (op, outcome) = test_database().create_or_patch_db(&h).await.unwrap();

    assert_eq!(op, OperationResult::Updated);
    assert_eq!(outcome, ReconcileOutcome::RequeueAfter(DEFAULT_REQUEUE_DURATION));
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_get_db_with_name() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle(move |when, then| {
        when.method(GET).path(db_path());
        then.json_body(existing_db(TEST_SECRET));
    });
    fake_apiserver.build();

    let h = test_helper(client);
    let db = test_database().get_db_with_name(&h).await.unwrap();

    assert_eq!(db.spec.name, "keystone");
    assert_eq!(db.status.map(|s| s.completed), Some(true));
    fake_apiserver.assert();
}
