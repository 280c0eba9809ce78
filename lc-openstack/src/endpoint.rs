use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;
use tracing::*;

use crate::OpenStack;
use crate::errors::*;

// The keystone "interface" an endpoint is registered under
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Admin,
    Internal,
    Public,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Admin => "admin",
            Availability::Internal => "internal",
            Availability::Public => "public",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Availability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Availability> {
        match s {
            "admin" => Ok(Availability::Admin),
            "internal" => Ok(Availability::Internal),
            "public" => Ok(Availability::Public),
            _ => Err(OpenStackError::invalid_availability(s)),
        }
    }
}

impl From<lc_api::Endpoint> for Availability {
    fn from(endpt: lc_api::Endpoint) -> Availability {
        match endpt {
            lc_api::Endpoint::Admin => Availability::Admin,
            lc_api::Endpoint::Internal => Availability::Internal,
            lc_api::Endpoint::Public => Availability::Public,
        }
    }
}

// An endpoint to register for a service
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoint {
    pub name: String,
    pub service_id: String,
    pub availability: Availability,
    pub url: String,
}

// An endpoint as returned by keystone
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct KeystoneEndpoint {
    pub id: String,
    pub interface: Availability,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub service_id: String,
    pub url: String,
}

#[derive(Deserialize)]
struct EndpointResponse {
    endpoint: KeystoneEndpoint,
}

#[derive(Deserialize)]
struct EndpointList {
    endpoints: Vec<KeystoneEndpoint>,
}

impl OpenStack {
    fn endpoint_body(&self, e: &Endpoint) -> serde_json::Value {
        json!({
            "endpoint": {
                "interface": e.availability,
                "name": e.name,
                "region": self.region(),
                "service_id": e.service_id,
                "url": e.url,
            },
        })
    }

    // If the service already has an endpoint for this availability, its id is returned and nothing
    // is created
    pub async fn create_endpoint(&self, e: &Endpoint) -> anyhow::Result<String> {
        let existing = self.get_endpoints(&e.service_id, Some(e.availability)).await?;
        if let Some(endpt) = existing.into_iter().next() {
            return Ok(endpt.id);
        }

        let resp: EndpointResponse = self.post("endpoints", &self.endpoint_body(e)).await?;
        info!("{} endpoint {} created with id {}", e.availability, e.url, resp.endpoint.id);
        Ok(resp.endpoint.id)
    }

    // All of the service's endpoints in our region, or only those for `availability` if it's given
    pub async fn get_endpoints(
        &self,
        service_id: &str,
        availability: Option<Availability>,
    ) -> anyhow::Result<Vec<KeystoneEndpoint>> {
        debug!("getting endpoints for service {service_id} {availability:?}");
        let mut query = vec![("service_id", service_id), ("region_id", self.region())];
        if let Some(a) = availability {
            query.push(("interface", a.as_str()));
        }

        let resp: EndpointList = self.get("endpoints", &query).await?;
        Ok(resp.endpoints)
    }

    pub async fn update_endpoint(&self, e: &Endpoint, endpoint_id: &str) -> anyhow::Result<String> {
        info!("updating {} endpoint {}", e.availability, e.name);
        let resp: EndpointResponse = self.patch(&format!("endpoints/{endpoint_id}"), &self.endpoint_body(e)).await?;
        Ok(resp.endpoint.id)
    }

    // Removes every endpoint registered for the service with this availability
    pub async fn delete_endpoint(&self, e: &Endpoint) -> EmptyResult {
        info!("deleting {} endpoint {}", e.availability, e.name);
        for endpt in self.get_endpoints(&e.service_id, Some(e.availability)).await? {
            debug!("deleting endpoint {} {} - {}", endpt.id, endpt.interface, endpt.url);
            self.delete(&format!("endpoints/{}", endpt.id)).await?;
        }
        Ok(())
    }
}
