use std::time::Duration;

use kube::api::DeleteParams;
use tracing::*;

use crate::errors::*;
use crate::helper::create_or_patch;
use crate::pod::{
    get_pod_list_with_label,
    status_pod_list,
};
use crate::prelude::*;
use crate::rollout::*;
use crate::util::{
    is_poll_timeout,
    merge_string_maps,
};

pub struct StatefulSet {
    statefulset: appsv1::StatefulSet,
    timeout: Duration,
    options: RolloutOptions,
    rollout: RolloutState,
}

impl StatefulSet {
    pub fn new(statefulset: appsv1::StatefulSet, timeout: Duration) -> StatefulSet {
        StatefulSet {
            statefulset,
            timeout,
            options: Default::default(),
            rollout: Default::default(),
        }
    }

    pub fn with_rollout_options(mut self, options: RolloutOptions) -> StatefulSet {
        self.options = options;
        self
    }

    // Creates the statefulset, or patches the existing one to match.  Rollout progress is only
    // polled after an update of a statefulset that has replicas; the caller can check
    // `rollout_complete` afterwards and requeue if it isn't.
    #[instrument(skip_all, fields(statefulset = %self.statefulset.name_any()))]
    pub async fn create_or_patch(&mut self, h: &Helper) -> anyhow::Result<ReconcileOutcome> {
        let name = self.statefulset.name_any();
        let ns = self.statefulset.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let sts_api = kube::Api::<appsv1::StatefulSet>::namespaced(h.client(), &ns);

        let seed = appsv1::StatefulSet {
            metadata: metav1::ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(ns.clone()),
                ..Default::default()
            },
            ..Default::default()
        };

        let desired = &self.statefulset;
        let res = create_or_patch(&sts_api, seed, |sts| {
            let creating = sts.metadata.creation_timestamp.is_none();
            let desired_spec = desired.spec.clone().unwrap_or_default();

            sts.metadata.labels = Some(merge_string_maps(&[sts.labels(), desired.labels()]));
            sts.metadata.annotations = Some(merge_string_maps(&[sts.annotations(), desired.annotations()]));

            let spec = sts.spec.get_or_insert_with(Default::default);
            // the selector is immutable once the statefulset exists
            if creating {
                spec.selector = desired_spec.selector;
            }
            spec.replicas = desired_spec.replicas;
            spec.template = desired_spec.template;
            spec.volume_claim_templates = desired_spec.volume_claim_templates;
            spec.service_name = desired_spec.service_name;
            spec.pod_management_policy = desired_spec.pod_management_policy;
            spec.update_strategy = desired_spec.update_strategy;
            spec.revision_history_limit = desired_spec.revision_history_limit;
            spec.min_ready_seconds = desired_spec.min_ready_seconds;
            spec.persistent_volume_claim_retention_policy = desired_spec.persistent_volume_claim_retention_policy;

            h.set_controller_reference(&mut sts.metadata)
        })
        .await;

        let (sts, op) = match res {
            Ok(r) => r,
            Err(err) if is_not_found(&err) => {
                info!("StatefulSet {name} not found, reconcile in {:?}", self.timeout);
                return Ok(ReconcileOutcome::RequeueAfter(self.timeout));
            },
            Err(err) => return Err(err),
        };
        self.statefulset = sts;
        info!("StatefulSet {name} {op}");

        let replicas = self.statefulset.spec.as_ref().and_then(|s| s.replicas).unwrap_or_default();
        if op != OperationResult::Created && replicas > 0 {
            // Running out of time isn't an error; the rollout status records how far we got
            if let Err(err) = self.poll_rollout_status(h).await
                && !is_poll_timeout(&err)
            {
                return Err(err.context("poll rollout error"));
            }
        }

        Ok(ReconcileOutcome::Done)
    }

    #[instrument(skip_all, fields(statefulset = %self.statefulset.name_any()))]
    pub async fn poll_rollout_status(&mut self, h: &Helper) -> EmptyResult {
        let poller = self.options.poller();
        loop {
            if self.check_rollout(h).await? {
                return Ok(());
            }
            poller.wait().await?;
        }
    }

    async fn check_rollout(&mut self, h: &Helper) -> anyhow::Result<bool> {
        let name = self.statefulset.name_any();
        let ns = self.statefulset.namespace().unwrap_or_else(|| h.owner_namespace().into());
        self.statefulset = get_statefulset_with_name(h, &name, &ns).await?;

        let status = self.statefulset.status.clone().unwrap_or_default();
        let generation = self.statefulset.metadata.generation.unwrap_or_default();
        if complete(&status, generation) {
            self.rollout.set(RolloutStatus::Completed, completed_message(&name));
            info!("{}", self.rollout.message);
            return Ok(true);
        }

        // statefulsets don't carry rollout conditions, so look at the pods instead
        let labels = self
            .statefulset
            .spec
            .as_ref()
            .and_then(|s| s.template.metadata.as_ref())
            .and_then(|m| m.labels.clone())
            .unwrap_or_default();
        let pods = get_pod_list_with_label(h, &ns, &labels).await?;

        let (ready, msg) = status_pod_list(&pods);
        if !ready {
            let updated = status.updated_replicas.unwrap_or_default();
            self.rollout
                .set(RolloutStatus::Progressing, progressing_message(&name, updated, status.replicas, &msg));
            return Ok(false);
        }

        Ok(true)
    }

    pub fn rollout_complete(&self) -> bool {
        self.rollout.complete()
    }

    pub fn rollout_status(&self) -> Option<RolloutStatus> {
        self.rollout.status
    }

    pub fn rollout_message(&self) -> &str {
        &self.rollout.message
    }

    pub fn statefulset(&self) -> &appsv1::StatefulSet {
        &self.statefulset
    }

    pub async fn delete(&self, h: &Helper) -> EmptyResult {
        let name = self.statefulset.name_any();
        let ns = self.statefulset.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let sts_api = kube::Api::<appsv1::StatefulSet>::namespaced(h.client(), &ns);
        match sts_api.delete(&name, &DeleteParams::default()).await {
            Err(err) if !is_kube_not_found(&err) => {
                Err(anyhow!(err).context(format!("error deleting statefulset {name}")))
            },
            _ => Ok(()),
        }
    }
}

// A statefulset rollout is complete when every replica has been updated and is available, and the
// controller has seen the latest generation of the spec
pub fn complete(status: &appsv1::StatefulSetStatus, generation: i64) -> bool {
    let updated = status.updated_replicas.unwrap_or_default();
    let available = status.available_replicas.unwrap_or_default();
    updated == status.replicas
        && status.replicas == available
        && status.observed_generation.unwrap_or_default() == generation
}

pub async fn get_statefulset_with_name(h: &Helper, name: &str, namespace: &str) -> anyhow::Result<appsv1::StatefulSet> {
    let sts_api = kube::Api::<appsv1::StatefulSet>::namespaced(h.client(), namespace);
    Ok(sts_api.get(name).await?)
}
