//! Open Service Broker v2 endpoint handlers.
//!
//! Each handler turns path, query and body into a [`BrokerRequest`], runs it
//! through the pipeline and renders the [`BrokerResponse`] with the status the
//! protocol expects.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use broker_core::{
    BindDetails, BindState, Credentials, DeprovisionDetails, ProvisionDetails, ProvisionState,
    UnbindDetails, UpdateDetails,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;

use super::AppState;
use crate::network::error::ApiError;
use crate::service::{BrokerRequest, BrokerResponse};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct AsyncQuery {
    #[serde(default)]
    pub accepts_incomplete: bool,
}

/// Query of the two DELETE routes.
#[derive(Debug, Default, Deserialize)]
pub struct RemovalQuery {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub accepts_incomplete: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct LastOperationQuery {
    pub operation: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn dispatch(state: AppState, request: BrokerRequest) -> Result<BrokerResponse, ApiError> {
    let verb = request.verb();
    state
        .pipeline
        .oneshot(request)
        .await
        .map_err(|err| ApiError::from_broker(verb, &err))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(details)| details)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// `GET /v2/catalog`
pub async fn catalog_handler(State(state): State<AppState>) -> Result<BrokerResponse, ApiError> {
    dispatch(state, BrokerRequest::Catalog).await
}

/// `PUT /v2/service_instances/{instance_id}`
pub async fn provision_handler(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    payload: Result<Json<ProvisionDetails>, JsonRejection>,
) -> Result<BrokerResponse, ApiError> {
    let details = body(payload)?;
    dispatch(
        state,
        BrokerRequest::Provision {
            instance_id,
            details,
            async_allowed: query.accepts_incomplete,
        },
    )
    .await
}

/// `PATCH /v2/service_instances/{instance_id}`
pub async fn update_handler(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<AsyncQuery>,
    payload: Result<Json<UpdateDetails>, JsonRejection>,
) -> Result<BrokerResponse, ApiError> {
    let details = body(payload)?;
    dispatch(
        state,
        BrokerRequest::Update {
            instance_id,
            details,
            async_allowed: query.accepts_incomplete,
        },
    )
    .await
}

/// `DELETE /v2/service_instances/{instance_id}`
pub async fn deprovision_handler(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<RemovalQuery>,
) -> Result<BrokerResponse, ApiError> {
    dispatch(
        state,
        BrokerRequest::Deprovision {
            instance_id,
            details: DeprovisionDetails {
                service_id: query.service_id,
                plan_id: query.plan_id,
            },
            async_allowed: query.accepts_incomplete,
        },
    )
    .await
}

/// `GET /v2/service_instances/{instance_id}/last_operation`
pub async fn last_operation_handler(
    State(state): State<AppState>,
    Path(instance_id): Path<String>,
    Query(query): Query<LastOperationQuery>,
) -> Result<BrokerResponse, ApiError> {
    dispatch(
        state,
        BrokerRequest::LastOperation {
            instance_id,
            operation: query.operation,
        },
    )
    .await
}

/// `PUT /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
pub async fn bind_handler(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    payload: Result<Json<BindDetails>, JsonRejection>,
) -> Result<BrokerResponse, ApiError> {
    let details = body(payload)?;
    dispatch(
        state,
        BrokerRequest::Bind {
            instance_id,
            binding_id,
            details,
        },
    )
    .await
}

/// `DELETE /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
pub async fn unbind_handler(
    State(state): State<AppState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Query(query): Query<RemovalQuery>,
) -> Result<BrokerResponse, ApiError> {
    dispatch(
        state,
        BrokerRequest::Unbind {
            instance_id,
            binding_id,
            details: UnbindDetails {
                service_id: query.service_id,
                plan_id: query.plan_id,
            },
        },
    )
    .await
}

// ---------------------------------------------------------------------------
// Response rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
struct OperationBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    dashboard_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
}

#[derive(Debug, Serialize)]
struct BindingBody {
    credentials: Credentials,
    #[serde(skip_serializing_if = "Option::is_none")]
    syslog_drain_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    route_service_url: Option<String>,
}

fn accepted_or_ok(is_async: bool) -> StatusCode {
    if is_async {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    }
}

impl IntoResponse for BrokerResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Catalog(catalog) => Json(catalog).into_response(),
            Self::Provisioned(spec) => {
                let status = match spec.state {
                    ProvisionState::Created => StatusCode::CREATED,
                    ProvisionState::IdenticalAlreadyExists => StatusCode::OK,
                    ProvisionState::Async => StatusCode::ACCEPTED,
                };
                let body = OperationBody {
                    dashboard_url: spec.dashboard_url,
                    operation: spec.operation,
                };
                (status, Json(body)).into_response()
            }
            Self::Updated(spec) => {
                let body = OperationBody {
                    dashboard_url: spec.dashboard_url,
                    operation: spec.operation,
                };
                (accepted_or_ok(spec.is_async), Json(body)).into_response()
            }
            Self::Deprovisioned(spec) => {
                let body = OperationBody {
                    operation: spec.operation,
                    ..OperationBody::default()
                };
                (accepted_or_ok(spec.is_async), Json(body)).into_response()
            }
            Self::LastOperation(operation) => Json(operation).into_response(),
            Self::Bound(binding) => {
                let status = match binding.state {
                    BindState::Created => StatusCode::CREATED,
                    BindState::IdenticalAlreadyExists => StatusCode::OK,
                };
                let body = BindingBody {
                    credentials: binding.credentials,
                    syslog_drain_url: binding.syslog_drain_url,
                    route_service_url: binding.route_service_url,
                };
                (status, Json(body)).into_response()
            }
            Self::Unbound => Json(serde_json::json!({})).into_response(),
        }
    }
}
