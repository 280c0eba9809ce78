use std::time::Duration;

use anyhow::Context;
use kube::api::{
    DeleteParams,
    PostParams,
};
use tracing::*;

use crate::errors::*;
use crate::helper::KubernetesError;
use crate::prelude::*;
use crate::util::object_hash;

// A one-shot job (db sync, bootstrap, etc) that should run again whenever its definition changes.
// The caller persists `hash()` in its status and passes it back in as `before_hash` next time.
pub struct Job {
    job: batchv1::Job,
    job_type: String,
    preserve: bool,
    timeout: Duration,
    before_hash: String,
    hash: String,
    changed: bool,
}

impl Job {
    pub fn new(job: batchv1::Job, job_type: &str, preserve: bool, timeout: Duration, before_hash: &str) -> Job {
        Job {
            job,
            job_type: job_type.into(),
            preserve,
            timeout,
            before_hash: before_hash.into(),
            hash: String::new(),
            changed: false,
        }
    }

    fn api(&self, h: &Helper) -> kube::Api<batchv1::Job> {
        let ns = self.job.namespace().unwrap_or_else(|| h.owner_namespace().into());
        kube::Api::namespaced(h.client(), &ns)
    }

    #[instrument(skip_all, fields(job = %self.job.name_any(), job_type = %self.job_type))]
    pub async fn do_job(&mut self, h: &Helper) -> anyhow::Result<ReconcileOutcome> {
        self.hash = object_hash(&self.job).with_context(|| format!("error calculating {} hash", self.job_type))?;
        self.changed = self.before_hash != self.hash;

        let name = self.job.name_any();
        let Some(existing) = self.api(h).get_opt(&name).await? else {
            if self.changed {
                return self.create_job(h).await;
            }
            return Ok(ReconcileOutcome::Done);
        };

        // A job that was already started from this exact definition is left alone until it
        // finishes, even though the caller hasn't recorded its hash yet
        let running_hash = existing.annotations().get(JOB_HASH_ANNOTATION);
        if self.changed && running_hash != Some(&self.hash) {
            self.delete_job(h).await?;
            return self.create_job(h).await;
        }

        if self.wait_on_job(h).await? {
            info!("waiting on {} job {name}", self.job_type);
            return Ok(ReconcileOutcome::RequeueAfter(self.timeout));
        }

        if !self.preserve {
            self.delete_job(h).await?;
        }

        Ok(ReconcileOutcome::Done)
    }

    async fn create_job(&self, h: &Helper) -> anyhow::Result<ReconcileOutcome> {
        let name = self.job.name_any();
        let mut job = self.job.clone();
        job.annotations_mut().insert(JOB_HASH_ANNOTATION.into(), self.hash.clone());
        h.set_controller_reference(&mut job.metadata)?;

        match self.api(h).create(&PostParams::default(), &job).await {
            Ok(_) => info!("{} job {name} created", self.job_type),
            // the previous job is still being cleaned up
            Err(err) if is_kube_conflict(&err) => info!("{} job {name} still terminating", self.job_type),
            Err(err) if is_kube_not_found(&err) => info!("job {name} not found"),
            Err(err) => return Err(err.into()),
        }
        Ok(ReconcileOutcome::RequeueAfter(self.timeout))
    }

    // Deletes the job (if it exists) along with its pods
    pub async fn delete_job(&self, h: &Helper) -> EmptyResult {
        let name = self.job.name_any();
        let job_api = self.api(h);
        if job_api.get_opt(&name).await?.is_some() {
            info!("deleting job {name}");
            job_api.delete(&name, &DeleteParams::background()).await?;
        }
        Ok(())
    }

    // Returns true if the caller should requeue and check again later
    pub async fn wait_on_job(&self, h: &Helper) -> anyhow::Result<bool> {
        let name = self.job.name_any();
        let job = self.api(h).get(&name).await.inspect_err(|err| error!("could not fetch job {name}: {err}"))?;
        let status = job.status.unwrap_or_default();

        if status.active.unwrap_or_default() > 0 {
            info!("job {name} active, requeuing");
            Ok(true)
        } else if status.failed.unwrap_or_default() > 0 {
            info!("job {name} failed");
            bail!(KubernetesError::job_failed(&name));
        } else if status.succeeded.unwrap_or_default() > 0 {
            info!("job {name} succeeded");
            Ok(false)
        } else {
            info!("job {name} incomplete, requeuing");
            Ok(true)
        }
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }
}
