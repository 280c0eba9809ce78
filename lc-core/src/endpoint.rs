use std::collections::BTreeMap;

use tracing::*;
use url::Url;

use crate::macros::*;
use crate::prelude::*;
use crate::route::{
    GenericRouteDetails,
    Route,
    generic_route,
};
use crate::service::{
    GenericServiceDetails,
    GenericServicePort,
    MetalLBServiceDetails,
    Service,
    generic_service,
    metallb_service,
};
use crate::util::merge_string_maps;

// How a single OpenStack API endpoint should be exposed
#[derive(Clone, Debug, Default)]
pub struct EndpointData {
    pub port: i32,
    // appended to the URL as-is, since it often contains things like `%(project_id)s`
    pub path: String,
    pub metallb: Option<MetalLBData>,
}

#[derive(Clone, Debug, Default)]
pub struct MetalLBData {
    pub ip_address_pool: String,
    pub shared_ip: bool,
    // more than one for dual-stack
    pub load_balancer_ips: Vec<String>,
}

fn metallb_annotations(data: &MetalLBData) -> BTreeMap<String, String> {
    let mut annotations = kmap!(METALLB_ADDRESS_POOL_ANNOTATION => data.ip_address_pool);
    if !data.load_balancer_ips.is_empty() {
        annotations.insert(METALLB_LOADBALANCER_IPS_ANNOTATION.into(), data.load_balancer_ips.join(","));
    }
    if data.shared_ip {
        annotations.insert(METALLB_ALLOW_SHARED_IP_ANNOTATION.into(), format!("{}-vip", data.ip_address_pool));
    }
    annotations
}

pub(crate) fn endpoint_url(hostname: &str, path: &str) -> anyhow::Result<String> {
    let protocol = if hostname.starts_with("http") { "" } else { "http://" };
    let url = Url::parse(&format!("{protocol}{hostname}"))?;

    // Url always serializes an empty path as "/"
    let base = if url.path() == "/" { url.as_str().trim_end_matches('/') } else { url.as_str() };
    Ok(format!("{base}{path}"))
}

// Creates a service (and for public endpoints without MetalLB, a route) named
// `<service_name>-<endpoint type>` for each endpoint, and returns the URL each one is reachable at.
// Stops at the first object that isn't ready yet and returns the requeue.
#[instrument(skip_all, fields(service = service_name))]
pub async fn expose_endpoints(
    h: &Helper,
    service_name: &str,
    selector: &BTreeMap<String, String>,
    endpoints: &BTreeMap<Endpoint, EndpointData>,
) -> anyhow::Result<(BTreeMap<Endpoint, String>, ReconcileOutcome)> {
    let mut urls = BTreeMap::new();

    for (endpoint_type, data) in endpoints {
        let endpoint_name = format!("{service_name}-{endpoint_type}");
        let export_labels = merge_string_maps(&[selector, &kmap!(endpoint_type => "true")]);
        let port = GenericServicePort {
            name: endpoint_name.clone(),
            port: data.port,
            protocol: "TCP".into(),
        };

        let svc_obj = match &data.metallb {
            Some(metallb) => metallb_service(&MetalLBServiceDetails {
                name: endpoint_name.clone(),
                namespace: h.owner_namespace().into(),
                annotations: metallb_annotations(metallb),
                labels: export_labels.clone(),
                selector: selector.clone(),
                port,
            }),
            None => generic_service(&GenericServiceDetails {
                name: endpoint_name.clone(),
                namespace: h.owner_namespace().into(),
                labels: export_labels.clone(),
                selector: selector.clone(),
                port,
            }),
        };

        let mut svc = Service::new(svc_obj, export_labels.clone(), DEFAULT_REQUEUE_DURATION);
        let outcome = svc.create_or_patch(h).await?;
        if !outcome.is_done() {
            return Ok((urls, outcome));
        }
        let mut hostname = svc.service_hostname_port();

        if data.metallb.is_none() && *endpoint_type == Endpoint::Public {
            let route_obj = generic_route(&GenericRouteDetails {
                name: endpoint_name.clone(),
                namespace: h.owner_namespace().into(),
                labels: export_labels.clone(),
                service_name: endpoint_name.clone(),
                target_port_name: endpoint_name.clone(),
            });
            let mut route = Route::new(route_obj, export_labels, DEFAULT_REQUEUE_DURATION);
            let outcome = route.create_or_patch(h).await?;
            if !outcome.is_done() {
                return Ok((urls, outcome));
            }
            hostname = route.hostname();
            // the router fills in spec.host once it admits the route
            if hostname.is_empty() {
                info!("Route {endpoint_name} has no host yet, reconcile in {DEFAULT_REQUEUE_DURATION:?}");
                return Ok((urls, ReconcileOutcome::RequeueAfter(DEFAULT_REQUEUE_DURATION)));
            }
        }

        let url = endpoint_url(&hostname, &data.path)?;
        debug!("{endpoint_type} endpoint exposed at {url}");
        urls.insert(*endpoint_type, url);
    }

    Ok((urls, ReconcileOutcome::Done))
}
