pub mod configmap;
pub mod constants;
pub mod database;
pub mod deployment;
pub mod endpoint;
pub mod env;
pub mod errors;
pub mod helper;
pub mod job;
pub mod labels;
pub mod logging;
pub mod macros;
pub mod networkattachment;
pub mod pod;
pub mod rollout;
pub mod route;
pub mod secret;
pub mod service;
pub mod statefulset;
pub mod tls;
pub mod util;

pub mod prelude {
    pub use k8s_openapi::api::apps::v1 as appsv1;
    pub use k8s_openapi::api::batch::v1 as batchv1;
    pub use k8s_openapi::api::core::v1 as corev1;
    pub use k8s_openapi::apimachinery::pkg::apis::meta::v1 as metav1;
    pub use kube::ResourceExt;
    pub use lc_api::{
        Endpoint,
        Hash,
    };

    pub use crate::constants::*;
    pub use crate::errors::EmptyResult;
    pub use crate::helper::{
        Helper,
        OperationResult,
        ReconcileOutcome,
    };
}

#[cfg(test)]
mod tests;
