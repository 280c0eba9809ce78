mod client;
pub mod endpoint;
pub mod errors;
pub mod role;
pub mod service;

pub use client::{
    AuthOpts,
    OpenStack,
};
pub use endpoint::{
    Availability,
    Endpoint,
    KeystoneEndpoint,
};
pub use errors::OpenStackError;
pub use role::Role;
pub use service::{
    KeystoneService,
    Service,
};

#[cfg(test)]
mod tests;
