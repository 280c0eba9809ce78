pub use lc_core::errors::*;

err_impl! {OpenStackError,
    #[error("{0} not found in keystone")]
    NotFound(String),

    #[error("invalid availability: {0}")]
    InvalidAvailability(String),

    #[error("no token returned by {0}")]
    MissingToken(String),
}

pub fn is_keystone_not_found(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<OpenStackError>(), Some(OpenStackError::NotFound(_)))
}
