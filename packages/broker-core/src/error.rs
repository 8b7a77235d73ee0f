//! Failure taxonomy shared by the router and every service capability.
//!
//! Capabilities report a failure *kind*; the transport decides which status
//! code that becomes. The router passes delegate failures through unchanged.

use crate::token::TokenError;

/// Coarse failure category, used by the transport to choose a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AsyncRequired,
    ValidationFailed,
    Conflict,
    Unimplemented,
    Internal,
}

impl ErrorKind {
    /// Stable machine-readable code used in error bodies and metrics labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::AsyncRequired => "AsyncRequired",
            Self::ValidationFailed => "ValidationFailed",
            Self::Conflict => "Conflict",
            Self::Unimplemented => "Unimplemented",
            Self::Internal => "InternalError",
        }
    }
}

/// Errors returned by broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("service not found: {service_id}")]
    ServiceNotFound { service_id: String },
    #[error("instance not found: {instance_id}")]
    InstanceNotFound { instance_id: String },
    #[error("binding {binding_id} not found on instance {instance_id}")]
    BindingNotFound {
        instance_id: String,
        binding_id: String,
    },
    #[error("invalid operation token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("this service plan requires client support for asynchronous service operations")]
    AsyncRequired,
    #[error("validation failed: {message}")]
    ValidationFailed { message: String },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("operation not supported: {operation}")]
    Unimplemented { operation: &'static str },
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl BrokerError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ServiceNotFound { .. }
            | Self::InstanceNotFound { .. }
            | Self::BindingNotFound { .. }
            | Self::InvalidToken(_) => ErrorKind::NotFound,
            Self::AsyncRequired => ErrorKind::AsyncRequired,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unimplemented { .. } => ErrorKind::Unimplemented,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn instance_not_found(instance_id: impl Into<String>) -> Self {
        Self::InstanceNotFound {
            instance_id: instance_id.into(),
        }
    }
}
