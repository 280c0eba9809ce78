use std::fmt;
use std::fmt::Debug;
use std::time::Duration;

use kube::Resource;
use kube::api::{
    DynamicObject,
    Patch,
    PatchParams,
    PostParams,
    TypeMeta,
};
use kube::runtime::controller::Action;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{
    self as json,
    json,
};
use tracing::*;

use crate::errors::*;
use crate::prelude::*;

err_impl! {KubernetesError,
    #[error("object is missing required metadata: {0}")]
    MissingMetadata(String),

    #[error("object is already owned by another controller: {0}")]
    AlreadyOwned(String),

    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("job failed, check job logs: {0}")]
    JobFailed(String),

    #[error("pod does not have the hostname and subdomain required to form an FQDN: {0}")]
    NoPodSubdomain(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationResult::Created => "created",
            OperationResult::Updated => "updated",
            OperationResult::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

// What the caller's reconcile loop should do next.  Helpers return `RequeueAfter` when something
// they depend on isn't there yet (a secret that hasn't been created, a job still running) rather
// than treating it as an error.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReconcileOutcome {
    #[default]
    Done,
    RequeueAfter(Duration),
}

impl ReconcileOutcome {
    pub fn is_done(&self) -> bool {
        *self == ReconcileOutcome::Done
    }
}

impl From<ReconcileOutcome> for Action {
    fn from(outcome: ReconcileOutcome) -> Action {
        match outcome {
            ReconcileOutcome::Done => Action::await_change(),
            ReconcileOutcome::RequeueAfter(d) => Action::requeue(d),
        }
    }
}

// A Helper captures the custom resource currently being reconciled, so that everything created
// on its behalf can be namespaced, labelled, and owned by it.
#[derive(Clone)]
pub struct Helper {
    client: kube::Client,
    types: TypeMeta,
    name: String,
    namespace: String,
    uid: String,
}

impl Helper {
    pub fn new<K>(owner: &K, client: kube::Client) -> anyhow::Result<Helper>
    where
        K: Resource<DynamicType = ()>,
    {
        let types = TypeMeta {
            api_version: K::api_version(&()).into(),
            kind: K::kind(&()).into(),
        };
        Helper::from_parts(client, types, owner.meta())
    }

    pub fn new_dynamic(owner: &DynamicObject, client: kube::Client) -> anyhow::Result<Helper> {
        let types = owner
            .types
            .clone()
            .ok_or_else(|| KubernetesError::missing_metadata("type meta"))?;
        Helper::from_parts(client, types, &owner.metadata)
    }

    fn from_parts(client: kube::Client, types: TypeMeta, meta: &metav1::ObjectMeta) -> anyhow::Result<Helper> {
        let name = meta.name.clone().ok_or_else(|| KubernetesError::missing_metadata("name"))?;
        let uid = meta.uid.clone().ok_or_else(|| KubernetesError::missing_metadata("uid"))?;
        Ok(Helper {
            client,
            types,
            name,
            namespace: meta.namespace.clone().unwrap_or_default(),
            uid,
        })
    }

    pub fn client(&self) -> kube::Client {
        self.client.clone()
    }

    pub fn owner_name(&self) -> &str {
        &self.name
    }

    pub fn owner_namespace(&self) -> &str {
        &self.namespace
    }

    pub fn owner_uid(&self) -> &str {
        &self.uid
    }

    pub fn owner_type_meta(&self) -> &TypeMeta {
        &self.types
    }

    pub fn controller_reference(&self) -> metav1::OwnerReference {
        metav1::OwnerReference {
            api_version: self.types.api_version.clone(),
            kind: self.types.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    // Makes the owner the controller of `meta`.  An object can only have one controller, so this
    // fails if some other object already controls it.
    pub fn set_controller_reference(&self, meta: &mut metav1::ObjectMeta) -> EmptyResult {
        let owner_ref = self.controller_reference();
        let refs = meta.owner_references.get_or_insert_with(Vec::new);

        if let Some(existing) = refs.iter().find(|r| r.controller == Some(true) && r.uid != owner_ref.uid) {
            bail!(KubernetesError::already_owned(&format!("{} {}", existing.kind, existing.name)));
        }

        match refs.iter_mut().find(|r| r.uid == owner_ref.uid) {
            Some(r) => *r = owner_ref,
            None => refs.push(owner_ref),
        }
        Ok(())
    }
}

// JSON patch turning `before` into `after`, or `None` if they're equal.  When a resource version
// is given, the patch starts with a `test` op against it so the apiserver rejects the patch if the
// object was written after we read it.
pub fn guarded_json_patch(
    before: &json::Value,
    after: &json::Value,
    resource_version: Option<&str>,
) -> anyhow::Result<Option<json_patch::Patch>> {
    let diff = json_patch::diff(before, after);
    if diff.0.is_empty() {
        return Ok(None);
    }

    let mut ops: Vec<json_patch::PatchOperation> = Vec::with_capacity(diff.0.len() + 1);
    if let Some(rv) = resource_version {
        ops.push(json::from_value(json!({"op": "test", "path": "/metadata/resourceVersion", "value": rv}))?);
    }
    ops.extend(diff.0);
    Ok(Some(json_patch::Patch(ops)))
}

// Fetches the object named by `seed`; if it doesn't exist, `mutate` is applied to the seed and the
// result is created.  Otherwise `mutate` is applied to the live object and, if that changed
// anything, the difference is sent as a JSON patch.  `mutate` can tell the two cases apart by
// checking for a creation timestamp.
pub async fn create_or_patch<K, F>(api: &kube::Api<K>, seed: K, mutate: F) -> anyhow::Result<(K, OperationResult)>
where
    K: Resource + Clone + Debug + Serialize + DeserializeOwned,
    F: FnOnce(&mut K) -> EmptyResult,
{
    let name = seed.name_any();
    let Some(existing) = api.get_opt(&name).await? else {
        let mut obj = seed;
        mutate(&mut obj)?;
        let created = api.create(&PostParams::default(), &obj).await?;
        return Ok((created, OperationResult::Created));
    };

    let mut obj = existing.clone();
    mutate(&mut obj)?;

    let before = json::to_value(&existing)?;
    let after = json::to_value(&obj)?;
    let Some(patch) = guarded_json_patch(&before, &after, existing.resource_version().as_deref())? else {
        debug!("{name} unchanged, skipping patch");
        return Ok((existing, OperationResult::Unchanged));
    };

    let patched = api.patch(&name, &PatchParams::default(), &Patch::Json::<()>(patch)).await?;
    Ok((patched, OperationResult::Updated))
}
