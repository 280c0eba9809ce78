use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json as json;
use sha2::{
    Digest,
    Sha256,
};
use tokio::time::{
    Instant,
    sleep,
};

use crate::env::{
    EnvSetter,
    merge_envs,
};
use crate::errors::*;

err_impl! {UtilError,
    #[error("timed out waiting for condition after {0:?}")]
    PollTimeout(Duration),
}

// Hex-encoded sha256 of the JSON serialization of an object; used everywhere we need to detect
// that some input (a configmap, a secret, a job spec) has changed between reconciles.
pub fn object_hash<T: Serialize + ?Sized>(obj: &T) -> anyhow::Result<String> {
    let data = json::to_vec(obj)?;
    Ok(calculate_hash(&data))
}

pub fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// Computes a single hash over a set of named input hashes; the inputs are flattened into a sorted
// env var list first, so the result doesn't depend on insertion order.
pub fn hash_of_input_hashes(hashes: &BTreeMap<String, EnvSetter>) -> anyhow::Result<String> {
    let merged = merge_envs(vec![], hashes);
    object_hash(&merged)
}

// Merges string maps together; if a key exists in more than one map, the value from the first
// map that has it is preserved.
pub fn merge_string_maps(maps: &[&BTreeMap<String, String>]) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    for m in maps {
        for (k, v) in m.iter() {
            merged.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
    merged
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TemplateType {
    // operator-rendered content, written on every reconcile
    #[default]
    None,
    // a user-provided object: created empty if missing, otherwise never touched
    Custom,
}

// Description of a ConfigMap or Secret an operator wants to exist.  `data` holds content the
// operator already rendered; `custom_data` is layered on top and wins on key conflicts.
#[derive(Clone, Debug, Default)]
pub struct Template {
    pub name: String,
    pub namespace: String,
    pub type_: TemplateType,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub data: BTreeMap<String, String>,
    pub custom_data: BTreeMap<String, String>,
    pub skip_set_owner: bool,
}

impl Template {
    pub fn rendered_data(&self) -> BTreeMap<String, String> {
        let mut data = self.data.clone();
        data.extend(self.custom_data.iter().map(|(k, v)| (k.clone(), v.clone())));
        data
    }
}

// Bounded poll loop: the caller checks its condition, and then calls `wait` to sleep until the
// next attempt.  `wait` fails instead of sleeping if the next attempt would land past the
// deadline.
pub struct Poller {
    interval: Duration,
    timeout: Duration,
    deadline: Instant,
}

impl Poller {
    pub fn new(interval: Duration, timeout: Duration) -> Poller {
        Poller { interval, timeout, deadline: Instant::now() + timeout }
    }

    pub async fn wait(&self) -> EmptyResult {
        if Instant::now() + self.interval > self.deadline {
            bail!(UtilError::poll_timeout(&self.timeout));
        }
        sleep(self.interval).await;
        Ok(())
    }
}

pub fn is_poll_timeout(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<UtilError>(), Some(UtilError::PollTimeout(_)))
}
