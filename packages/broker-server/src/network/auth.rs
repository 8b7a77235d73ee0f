//! Request guards for the `/v2` routes: basic auth and the API version header.

use axum::extract::{Request, State};
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::prelude::*;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::config::{ApiVersion, BrokerCredentials};
use super::error::ApiError;
use super::handlers::AppState;

pub const API_VERSION_HEADER: &str = "x-broker-api-version";

/// Rejects requests whose basic-auth credentials do not match the configured
/// ones. Passes everything through when no credentials are configured.
pub async fn require_broker_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.config.credentials {
        if !credentials_match(request.headers(), expected) {
            debug!(path = %request.uri().path(), "rejected unauthenticated request");
            let mut response = ApiError::unauthorized().into_response();
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"broker\""),
            );
            return response;
        }
    }
    next.run(request).await
}

/// Rejects requests without an `X-Broker-API-Version` at least as new as the
/// configured minimum.
pub async fn require_api_version(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let minimum = state.config.min_api_version;
    let version = request
        .headers()
        .get(API_VERSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::parse::<ApiVersion>);

    match version {
        Some(Ok(version)) if version >= minimum => next.run(request).await,
        Some(Ok(version)) => ApiError::precondition_failed(format!(
            "broker API version {version} is not supported, need {minimum} or later"
        ))
        .into_response(),
        Some(Err(_)) | None => ApiError::precondition_failed(format!(
            "X-Broker-API-Version header {minimum} or later is required"
        ))
        .into_response(),
    }
}

/// Constant-time comparison of the `Authorization: Basic` header against
/// `expected`.
fn credentials_match(headers: &HeaderMap, expected: &BrokerCredentials) -> bool {
    let Some(encoded) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
    else {
        return false;
    };
    let Ok(decoded) = BASE64_STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Some(sep) = decoded.iter().position(|&b| b == b':') else {
        return false;
    };
    let (username, password) = (&decoded[..sep], &decoded[sep + 1..]);

    let username_ok = username.ct_eq(expected.username.as_bytes());
    let password_ok = password.ct_eq(expected.password.as_bytes());
    (username_ok & password_ok).into()
}
