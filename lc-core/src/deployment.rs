use std::time::Duration;

use kube::api::DeleteParams;
use tracing::*;

use crate::errors::*;
use crate::helper::create_or_patch;
use crate::prelude::*;
use crate::rollout::*;
use crate::util::{
    is_poll_timeout,
    merge_string_maps,
};

const DEPLOYMENT_PROGRESSING_CONDITION: &str = "Progressing";
const PROGRESS_DEADLINE_EXCEEDED_REASON: &str = "ProgressDeadlineExceeded";

pub struct Deployment {
    deployment: appsv1::Deployment,
    timeout: Duration,
    options: RolloutOptions,
    rollout: RolloutState,
}

impl Deployment {
    pub fn new(deployment: appsv1::Deployment, timeout: Duration) -> Deployment {
        Deployment {
            deployment,
            timeout,
            options: Default::default(),
            rollout: Default::default(),
        }
    }

    pub fn with_rollout_options(mut self, options: RolloutOptions) -> Deployment {
        self.options = options;
        self
    }

    #[instrument(skip_all, fields(deployment = %self.deployment.name_any()))]
    pub async fn create_or_patch(&mut self, h: &Helper) -> anyhow::Result<ReconcileOutcome> {
        let name = self.deployment.name_any();
        let ns = self.deployment.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let depl_api = kube::Api::<appsv1::Deployment>::namespaced(h.client(), &ns);

        let seed = appsv1::Deployment {
            metadata: metav1::ObjectMeta {
                name: Some(name.clone()),
                namespace: Some(ns.clone()),
                ..Default::default()
            },
            ..Default::default()
        };

        let desired = &self.deployment;
        let res = create_or_patch(&depl_api, seed, |depl| {
            let creating = depl.metadata.creation_timestamp.is_none();
            let desired_spec = desired.spec.clone().unwrap_or_default();

            depl.metadata.labels = Some(merge_string_maps(&[depl.labels(), desired.labels()]));
            depl.metadata.annotations = Some(merge_string_maps(&[depl.annotations(), desired.annotations()]));

            let spec = depl.spec.get_or_insert_with(Default::default);
            if creating {
                spec.selector = desired_spec.selector;
            }
            spec.replicas = desired_spec.replicas;
            spec.template = desired_spec.template;
            spec.strategy = desired_spec.strategy;
            spec.min_ready_seconds = desired_spec.min_ready_seconds;
            spec.revision_history_limit = desired_spec.revision_history_limit;
            spec.progress_deadline_seconds = desired_spec.progress_deadline_seconds;
            spec.paused = desired_spec.paused;

            h.set_controller_reference(&mut depl.metadata)
        })
        .await;

        let (depl, op) = match res {
            Ok(r) => r,
            Err(err) if is_not_found(&err) => {
                info!("Deployment {name} not found, reconcile in {:?}", self.timeout);
                return Ok(ReconcileOutcome::RequeueAfter(self.timeout));
            },
            Err(err) => return Err(err),
        };
        self.deployment = depl;
        info!("Deployment {name} {op}");

        let replicas = self.deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or_default();
        if op != OperationResult::Created
            && replicas > 0
            && let Err(err) = self.poll_rollout_status(h).await
            && !is_poll_timeout(&err)
        {
            return Err(err.context("poll rollout error"));
        }

        Ok(ReconcileOutcome::Done)
    }

    // Polls until the rollout completes or the deployment reports that it has stopped making
    // progress; either way the result is recorded in the rollout status.
    #[instrument(skip_all, fields(deployment = %self.deployment.name_any()))]
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
        let name = self.deployment.name_any();
        let ns = self.deployment.namespace().unwrap_or_else(|| h.owner_namespace().into());
        self.deployment = get_deployment_with_name(h, &name, &ns).await?;

        let status = self.deployment.status.clone().unwrap_or_default();
        let generation = self.deployment.metadata.generation.unwrap_or_default();
        let replicas = self.deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);

        if complete(&status, generation, replicas) {
            self.rollout.set(RolloutStatus::Completed, completed_message(&name));
            info!("{}", self.rollout.message);
            return Ok(true);
        }

        let progressing = status
            .conditions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|c| c.type_ == DEPLOYMENT_PROGRESSING_CONDITION);
        let detail = progressing.and_then(|c| c.message.clone()).unwrap_or_default();

        if progress_deadline_exceeded(&status) {
            self.rollout
                .set(RolloutStatus::ProgressDeadlineExceeded, deadline_exceeded_message(&name, &detail));
            warn!("{}", self.rollout.message);
            return Ok(true);
        }

        let updated = status.updated_replicas.unwrap_or_default();
        self.rollout
            .set(RolloutStatus::Progressing, progressing_message(&name, updated, replicas, &detail));
        Ok(false)
    }

    pub fn rollout_complete(&self) -> bool {
        self.rollout.complete()
    }

    pub fn progress_deadline_exceeded(&self) -> bool {
        self.rollout.status == Some(RolloutStatus::ProgressDeadlineExceeded)
    }

    pub fn rollout_status(&self) -> Option<RolloutStatus> {
        self.rollout.status
    }

    pub fn rollout_message(&self) -> &str {
        &self.rollout.message
    }

    pub fn deployment(&self) -> &appsv1::Deployment {
        &self.deployment
    }

    pub async fn delete(&self, h: &Helper) -> EmptyResult {
        let name = self.deployment.name_any();
        let ns = self.deployment.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let depl_api = kube::Api::<appsv1::Deployment>::namespaced(h.client(), &ns);
        match depl_api.delete(&name, &DeleteParams::default()).await {
            Err(err) if !is_kube_not_found(&err) => Err(anyhow!(err).context(format!("error deleting deployment {name}"))),
            _ => Ok(()),
        }
    }
}

pub fn complete(status: &appsv1::DeploymentStatus, generation: i64, replicas: i32) -> bool {
    status.updated_replicas.unwrap_or_default() == replicas
        && status.available_replicas.unwrap_or_default() == replicas
        && status.replicas.unwrap_or_default() == replicas
        && status.observed_generation.unwrap_or_default() >= generation
}

pub fn progress_deadline_exceeded(status: &appsv1::DeploymentStatus) -> bool {
    status.conditions.as_deref().unwrap_or_default().iter().any(|c| {
        c.type_ == DEPLOYMENT_PROGRESSING_CONDITION && c.reason.as_deref() == Some(PROGRESS_DEADLINE_EXCEEDED_REASON)
    })
}

pub async fn get_deployment_with_name(h: &Helper, name: &str, namespace: &str) -> anyhow::Result<appsv1::Deployment> {
    let depl_api = kube::Api::<appsv1::Deployment>::namespaced(h.client(), namespace);
    Ok(depl_api.get(name).await?)
}
