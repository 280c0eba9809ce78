use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;
use tracing::*;

use crate::OpenStack;
use crate::errors::*;

// A service to register in the keystone catalog
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Service {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub description: String,
    pub enabled: bool,
}

// A service as returned by keystone
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct KeystoneService {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Deserialize)]
struct ServiceResponse {
    service: KeystoneService,
}

#[derive(Deserialize)]
struct ServiceList {
    services: Vec<KeystoneService>,
}

impl OpenStack {
    // Returns the id of the new service
    pub async fn create_service(&self, s: &Service) -> anyhow::Result<String> {
        let resp: ServiceResponse = self.post("services", &json!({ "service": s })).await?;
        info!("service {} ({}) created with id {}", s.name, s.type_, resp.service.id);
        Ok(resp.service.id)
    }

    // Errors with NotFound if there is no service with this type and name
    pub async fn get_service(&self, service_type: &str, service_name: &str) -> anyhow::Result<KeystoneService> {
        let resp: ServiceList = self.get("services", &[("type", service_type), ("name", service_name)]).await?;
        match resp.services.into_iter().next() {
            Some(svc) => Ok(svc),
            None => bail!(OpenStackError::not_found(&format!("{service_name} service"))),
        }
    }

    pub async fn update_service(&self, s: &Service, service_id: &str) -> EmptyResult {
        let _: ServiceResponse = self.patch(&format!("services/{service_id}"), &json!({ "service": s })).await?;
        info!("service {service_id} updated");
        Ok(())
    }

    pub async fn delete_service(&self, service_id: &str) -> EmptyResult {
        info!("deleting service with id {service_id}");
        self.delete(&format!("services/{service_id}")).await
    }
}
