//! HTTP error responses for the broker API.
//!
//! Every failure leaves the server as `{"error": <code>, "description": <message>}`
//! with a status chosen from the failure kind and, for not-found, the verb.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use broker_core::{BrokerError, ErrorKind};
use serde::Serialize;

use crate::service::Verb;

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub description: String,
}

/// Structured API error returned by handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, description: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: code.to_string(),
                description: description.into(),
            },
        }
    }

    /// Translates a broker failure for `verb` into a response.
    ///
    /// Internal failures are logged here and reach the client with a generic
    /// description.
    #[must_use]
    pub fn from_broker(verb: Verb, err: &BrokerError) -> Self {
        let kind = err.kind();
        let status = status_for(verb, kind);
        if kind == ErrorKind::Internal {
            tracing::error!(verb = verb.as_str(), error = ?err, "broker operation failed");
            return Self::new(status, kind.as_str(), "internal error");
        }
        Self::new(status, kind.as_str(), err.to_string())
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "missing or invalid broker credentials",
        )
    }

    #[must_use]
    pub fn precondition_failed(description: impl Into<String>) -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, "PreconditionFailed", description)
    }

    #[must_use]
    pub fn bad_request(description: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ErrorKind::ValidationFailed.as_str(),
            description,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Status code for a failure of `kind` raised by `verb`.
///
/// Deprovision and unbind report a missing target as 410 Gone, which the
/// platform treats as already removed.
#[must_use]
pub fn status_for(verb: Verb, kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => match verb {
            Verb::Deprovision | Verb::Unbind => StatusCode::GONE,
            _ => StatusCode::NOT_FOUND,
        },
        ErrorKind::AsyncRequired => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_gone_for_removals() {
        assert_eq!(status_for(Verb::Deprovision, ErrorKind::NotFound), StatusCode::GONE);
        assert_eq!(status_for(Verb::Unbind, ErrorKind::NotFound), StatusCode::GONE);
        assert_eq!(status_for(Verb::Bind, ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(Verb::LastOperation, ErrorKind::NotFound),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (ErrorKind::AsyncRequired, StatusCode::UNPROCESSABLE_ENTITY),
            (ErrorKind::ValidationFailed, StatusCode::BAD_REQUEST),
            (ErrorKind::Conflict, StatusCode::CONFLICT),
            (ErrorKind::Unimplemented, StatusCode::NOT_IMPLEMENTED),
            (ErrorKind::Internal, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            assert_eq!(status_for(Verb::Provision, kind), status, "{kind:?}");
        }
    }

    #[test]
    fn async_required_body_uses_protocol_code() {
        let api = ApiError::from_broker(Verb::Provision, &BrokerError::AsyncRequired);
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.body.error, "AsyncRequired");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = BrokerError::Internal(anyhow::anyhow!("database password is hunter2"));
        let api = ApiError::from_broker(Verb::Bind, &err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.error, "InternalError");
        assert!(!api.body.description.contains("hunter2"));
    }

    #[test]
    fn helper_statuses() {
        assert_eq!(ApiError::unauthorized().status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::precondition_failed("old").status,
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(ApiError::bad_request("bad").body.error, "ValidationFailed");
    }
}
