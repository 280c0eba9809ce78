use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{
    Deserialize,
    Serialize,
};

// The interface an OpenStack API endpoint is exposed on; also used as the key for per-endpoint
// TLS configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, JsonSchema, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Admin,
    Internal,
    Public,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Admin => "admin",
            Endpoint::Internal => "internal",
            Endpoint::Public => "public",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Endpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Endpoint::Admin),
            "internal" => Ok(Endpoint::Internal),
            "public" => Ok(Endpoint::Public),
            _ => Err(format!("invalid endpoint type: {s}")),
        }
    }
}

// A named content hash, as stored in the status of the owning custom resource
#[derive(Clone, Debug, Default, Deserialize, Eq, JsonSchema, PartialEq, Serialize)]
pub struct Hash {
    pub name: String,
    pub hash: String,
}
