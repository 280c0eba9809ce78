use std::collections::BTreeMap;
use std::time::Duration;

use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{
    DeleteParams,
    TypeMeta,
};
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

// Just the parts of the OpenShift route API that we need

pub const ROUTE_GROUP: &str = "route.openshift.io";
pub const ROUTE_VERSION: &str = "v1";
pub const ROUTE_KIND: &str = "Route";
pub const ROUTE_PLURAL: &str = "routes";

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTargetReference {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePort {
    pub target_port: IntOrString,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    pub termination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_edge_termination_policy: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub to: RouteTargetReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<RoutePort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteIngress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRouteStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<Vec<RouteIngress>>,
}

pub type PartialRoute = kube::api::Object<PartialRouteSpec, PartialRouteStatus>;

fn api_version() -> String {
    format!("{ROUTE_GROUP}/{ROUTE_VERSION}")
}

pub fn api_resource() -> ApiResource {
    ApiResource {
        group: ROUTE_GROUP.into(),
        version: ROUTE_VERSION.into(),
        api_version: api_version(),
        kind: ROUTE_KIND.into(),
        plural: ROUTE_PLURAL.into(),
    }
}

#[derive(Clone, Debug, Default)]
pub struct GenericRouteDetails {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub service_name: String,
    pub target_port_name: String,
}

pub fn generic_route(details: &GenericRouteDetails) -> PartialRoute {
    PartialRoute {
        metadata: metav1::ObjectMeta {
            name: Some(details.name.clone()),
            namespace: Some(details.namespace.clone()),
            labels: Some(details.labels.clone()),
            ..Default::default()
        },
        spec: PartialRouteSpec {
            to: RouteTargetReference {
                kind: SERVICE_KIND.into(),
                name: details.service_name.clone(),
                ..Default::default()
            },
            port: Some(RoutePort {
                target_port: IntOrString::String(details.target_port_name.clone()),
            }),
            ..Default::default()
        },
        status: None,
        types: Some(TypeMeta { api_version: api_version(), kind: ROUTE_KIND.into() }),
    }
}

pub struct Route {
    route: PartialRoute,
    labels: BTreeMap<String, String>,
    timeout: Duration,
}

impl Route {
    pub fn new(route: PartialRoute, labels: BTreeMap<String, String>, timeout: Duration) -> Route {
        Route { route, labels, timeout }
    }

    pub async fn create_or_patch(&mut self, h: &Helper) -> anyhow::Result<ReconcileOutcome> {
        let name = self.route.name_any();
        let ns = self.route.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let route_api = kube::Api::<PartialRoute>::namespaced_with(h.client(), &ns, &api_resource());

        let mut seed = PartialRoute::new(&name, &api_resource(), self.route.spec.clone());
        seed.metadata.namespace = Some(ns.clone());

        let desired = &self.route;
        let labels = &self.labels;
        let res = create_or_patch(&route_api, seed, |route| {
            route.metadata.labels = Some(merge_string_maps(&[route.labels(), labels, desired.labels()]));
            route.metadata.annotations = Some(merge_string_maps(&[route.annotations(), desired.annotations()]));

            // the host is filled in by the router if we don't ask for one
            let host = desired.spec.host.clone().or_else(|| route.spec.host.clone());
            route.spec = PartialRouteSpec { host, ..desired.spec.clone() };

            h.set_controller_reference(&mut route.metadata)
        })
        .await;

        let (route, op) = match res {
            Ok(r) => r,
            Err(err) if is_not_found(&err) => {
                info!("Route {name} not found, reconcile in {:?}", self.timeout);
                return Ok(ReconcileOutcome::RequeueAfter(self.timeout));
            },
            Err(err) => return Err(err),
        };
        if op != OperationResult::Unchanged {
            info!("Route {name} {op}");
        }
        self.route = route;

        Ok(ReconcileOutcome::Done)
    }

    pub fn hostname(&self) -> String {
        self.route.spec.host.clone().unwrap_or_default()
    }

    pub fn route(&self) -> &PartialRoute {
        &self.route
    }

    pub async fn delete(&self, h: &Helper) -> EmptyResult {
        let name = self.route.name_any();
        let ns = self.route.namespace().unwrap_or_else(|| h.owner_namespace().into());
        let route_api = kube::Api::<PartialRoute>::namespaced_with(h.client(), &ns, &api_resource());
        match route_api.delete(&name, &DeleteParams::default()).await {
            Err(err) if !is_kube_not_found(&err) => Err(anyhow!(err).context(format!("error deleting route {name}"))),
            _ => Ok(()),
        }
    }
}
