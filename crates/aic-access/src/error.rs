//! Access-control error types.

use aic_core::error::AicError;
use aic_core::models::permission::{Action, Module};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("no authenticated caller")]
    NoCaller,

    #[error("missing permission {module}.{action}")]
    PermissionDenied { module: Module, action: Action },

    #[error("system role '{role}' requires elevated privilege")]
    SystemRoleProtected { role: String },

    #[error("notification belongs to another account")]
    NotRecipient,
}

impl From<AccessError> for AicError {
    fn from(err: AccessError) -> Self {
        AicError::AuthorizationDenied {
            reason: err.to_string(),
        }
    }
}
