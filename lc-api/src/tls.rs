use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

use crate::endpoint::Endpoint;

// TLS settings as they appear in a service's custom resource spec: per-endpoint certificate
// secrets plus the namespace CA bundle.
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Api {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    // keyed by the endpoint type (public, internal)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<BTreeMap<Endpoint, ApiService>>,

    #[serde(flatten)]
    pub ca: ApiCa,
}

impl Api {
    // TLS is enabled when it isn't explicitly disabled and there is endpoint configuration
    pub fn enabled(&self) -> bool {
        !self.disabled.unwrap_or(false) && self.endpoint.is_some()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiService {
    // holds the cert and key for the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,

    #[serde(rename = "disableNonTLSListeners", default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_non_tls_listeners: bool,
}

// CA settings usable both by services (to define their own CA) and by clients (to verify the
// server's certificate)
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCa {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_bundle_secret_name: String,
}
