use std::collections::BTreeMap;

use anyhow::Context;
use kube::discovery::ApiResource;
use serde::{
    Deserialize,
    Serialize,
};
use tracing::*;

use crate::errors::*;
use crate::helper::create_or_patch;
use crate::prelude::*;
use crate::util::merge_string_maps;

// keys in the database secret
pub const DATABASE_USER_PASSWORD_KEY: &str = "DatabasePassword";
pub const DATABASE_ADMIN_PASSWORD_KEY: &str = "AdminPassword";

pub const MARIADB_GROUP: &str = "mariadb.openstack.org";
pub const MARIADB_VERSION: &str = "v1beta1";
pub const MARIADB_DATABASE_KIND: &str = "MariaDBDatabase";
pub const MARIADB_DATABASE_PLURAL: &str = "mariadbdatabases";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMariaDBDatabaseSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secret: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialMariaDBDatabaseStatus {
    #[serde(default)]
    pub completed: bool,
}

pub type PartialMariaDBDatabase = kube::api::Object<PartialMariaDBDatabaseSpec, PartialMariaDBDatabaseStatus>;

fn api_version() -> String {
    format!("{MARIADB_GROUP}/{MARIADB_VERSION}")
}

pub fn api_resource() -> ApiResource {
    ApiResource {
        group: MARIADB_GROUP.into(),
        version: MARIADB_VERSION.into(),
        api_version: api_version(),
        kind: MARIADB_DATABASE_KIND.into(),
        plural: MARIADB_DATABASE_PLURAL.into(),
    }
}

// A service's database, as requested from the mariadb operator.  The MariaDBDatabase object is
// named after the owner.
#[derive(Clone, Debug, Default)]
pub struct Database {
    pub database_hostname: String,
    pub database_name: String,
    pub database_user: String,
    pub secret: String,
    pub labels: BTreeMap<String, String>,
}

impl Database {
    pub fn new(
        database_hostname: &str,
        database_name: &str,
        database_user: &str,
        secret: &str,
        labels: BTreeMap<String, String>,
    ) -> Database {
        Database {
            database_hostname: database_hostname.into(),
            database_name: database_name.into(),
            database_user: database_user.into(),
            secret: secret.into(),
            labels,
        }
    }

    fn api(&self, h: &Helper) -> kube::Api<PartialMariaDBDatabase> {
        kube::Api::namespaced_with(h.client(), h.owner_namespace(), &api_resource())
    }

    // Any change to the database object means the mariadb operator has work to do, so the caller
    // is asked to come back later
    pub async fn create_or_patch_db(&self, h: &Helper) -> anyhow::Result<(OperationResult, ReconcileOutcome)> {
        let mut seed = PartialMariaDBDatabase::new(
            h.owner_name(),
            &api_resource(),
            // the database name can't change, so it's only set on create
            PartialMariaDBDatabaseSpec { name: self.database_name.clone(), ..Default::default() },
        );
        seed.metadata.namespace = Some(h.owner_namespace().into());

        let res = create_or_patch(&self.api(h), seed, |db| {
            db.metadata.labels = Some(merge_string_maps(&[db.labels(), &self.labels]));
            db.spec.secret = self.secret.clone();
            h.set_controller_reference(&mut db.metadata)
        })
        .await;

        match res {
            Ok((_, OperationResult::Unchanged)) => Ok((OperationResult::Unchanged, ReconcileOutcome::Done)),
            Ok((_, op)) => {
                info!("MariaDBDatabase {} {op}", h.owner_name());
                Ok((op, ReconcileOutcome::RequeueAfter(DEFAULT_REQUEUE_DURATION)))
            },
            Err(err) if is_not_found(&err) => {
                Ok((OperationResult::Unchanged, ReconcileOutcome::RequeueAfter(DEFAULT_REQUEUE_DURATION)))
            },
            Err(err) => Err(err),
        }
    }

    pub async fn get_db_with_name(&self, h: &Helper) -> anyhow::Result<PartialMariaDBDatabase> {
        let name = h.owner_name();
        self.api(h)
            .get(name)
            .await
            .with_context(|| format!("failed to get database {name} in {}", h.owner_namespace()))
    }
}
