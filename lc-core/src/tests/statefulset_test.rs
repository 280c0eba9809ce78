use std::time::Duration;

use assertables::*;

use super::*;
use crate::rollout::*;
use crate::statefulset::*;

fn sts_path() -> String {
    format!("{}/{TEST_STATEFULSET}", ns_path("apps/v1", "statefulsets"))
}

fn existing_statefulset(updated: i32, available: i32) -> appsv1::StatefulSet {
    let mut sts = test_statefulset(TEST_STATEFULSET, 1);
    sts.metadata.resource_version = Some("42".into());
    sts.metadata.generation = Some(2);
    sts.status = Some(appsv1::StatefulSetStatus {
        replicas: 1,
        updated_replicas: Some(updated),
        available_replicas: Some(available),
        observed_generation: Some(2),
        ..Default::default()
    });
    sts
}

#[rstest]
#[case::complete(1, 1, 1, 2, true)]
#[case::not_updated(1, 0, 1, 2, false)]
#[case::not_available(1, 1, 0, 2, false)]
#[case::old_generation(1, 1, 1, 1, false)]
#[case::scaled_to_zero(0, 0, 0, 2, true)]
fn test_complete(
    #[case] replicas: i32,
    #[case] updated: i32,
    #[case] available: i32,
    #[case] observed: i64,
    #[case] expected: bool,
) {
    let status = appsv1::StatefulSetStatus {
        replicas,
        updated_replicas: Some(updated),
        available_replicas: Some(available),
        observed_generation: Some(observed),
        ..Default::default()
    };
    assert_eq!(complete(&status, 2), expected);
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_created(test_statefulset: appsv1::StatefulSet) {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let created = test_statefulset.clone();
    fake_apiserver.handle_not_found(sts_path()).handle(move |when, then| {
        when.method(POST).path(ns_path("apps/v1", "statefulsets"));
        then.json_body_obj(&created);
    });
    fake_apiserver.build();

    let h = test_helper(client);
    let mut sts = StatefulSet::new(test_statefulset, DEFAULT_REQUEUE_DURATION);
    let outcome = sts.create_or_patch(&h).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Done);
    assert_none!(sts.rollout_status());
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_updated_rollout_complete() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let existing = existing_statefulset(1, 1);
    let patched = existing.clone();
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(sts_path());
            then.json_body_obj(&existing);
        })
        .handle(move |when, then| {
            when.method(PATCH).path(sts_path());
            then.json_body_obj(&patched);
        });
    fake_apiserver.build();

    let h = test_helper(client);
    let mut sts = StatefulSet::new(test_statefulset(TEST_STATEFULSET, 1), DEFAULT_REQUEUE_DURATION);
    let outcome = sts.create_or_patch(&h).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Done);
    assert!(sts.rollout_complete());
    assert_eq!(sts.rollout_message(), "keystone-api rollout complete");
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_updated_rollout_progressing() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let existing = existing_statefulset(0, 0);
    let patched = existing.clone();
    let pods = vec![test_pod("keystone-api-0", false, "containers with unready status: [keystone-api]")];
    fake_apiserver
        .handle_multiple(2, move |when, then| {
            when.method(GET).path(sts_path());
            then.json_body_obj(&existing);
        })
        .handle(move |when, then| {
            when.method(PATCH).path(sts_path());
            then.json_body_obj(&patched);
        })
        .handle(move |when, then| {
            when.method(GET).path(ns_path("v1", "pods"));
            then.json_body(list_of("PodList", &pods));
        });
    fake_apiserver.build();

    let h = test_helper(client);
    let options = RolloutOptions {
        poll_interval: Duration::from_millis(100),
        poll_timeout: Duration::from_millis(50),
    };
    let mut sts = StatefulSet::new(test_statefulset(TEST_STATEFULSET, 1), DEFAULT_REQUEUE_DURATION)
        .with_rollout_options(options);
    let outcome = sts.create_or_patch(&h).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::Done);
    assert!(!sts.rollout_complete());
    assert_eq!(sts.rollout_status(), Some(RolloutStatus::Progressing));
    assert_contains!(sts.rollout_message(), "0/1 replicas updated");
    assert_contains!(sts.rollout_message(), "unready status");
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_delete_not_found() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    fake_apiserver.handle_not_found(sts_path());
    fake_apiserver.build();

    let h = test_helper(client);
    let sts = StatefulSet::new(test_statefulset(TEST_STATEFULSET, 1), DEFAULT_REQUEUE_DURATION);
    sts.delete(&h).await.unwrap();
    fake_apiserver.assert();
}

#[rstest]
#[tokio::test]
#[traced_test]
async fn test_create_or_patch_deleted_while_patching() {
    let (mut fake_apiserver, client) = make_fake_apiserver();
    let existing = existing_statefulset(1, 1);
    fake_apiserver
        .handle(move |when, then| {
            when.method(GET).path(sts_path());
            then.json_body_obj(&existing);
        })
        .handle(move |when, then| {
            when.method(PATCH).path(sts_path());
            then.status(404).json_body(status_not_found());
        });
    fake_apiserver.build();

    let timeout = Duration::from_secs(7);
    let h = test_helper(client);
    let mut sts = StatefulSet::new(test_statefulset(TEST_STATEFULSET, 1), timeout);
    let outcome = sts.create_or_patch(&h).await.unwrap();

    assert_eq!(outcome, ReconcileOutcome::RequeueAfter(timeout));
    assert_none!(sts.rollout_status());
    fake_apiserver.assert();
}
