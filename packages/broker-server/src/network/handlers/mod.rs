//! HTTP handler definitions for the broker server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod broker;
pub mod health;

pub use broker::{
    bind_handler, catalog_handler, deprovision_handler, last_operation_handler,
    provision_handler, unbind_handler, update_handler,
};
pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::{NetworkConfig, ShutdownController};
use crate::service::middleware::BrokerPipeline;

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references and the cheaply clonable pipeline, so cloning is
/// cheap.
#[derive(Clone)]
pub struct AppState {
    /// Router wrapped in the operation-level layers.
    pub pipeline: BrokerPipeline,
    /// Health state and shutdown signalling.
    pub shutdown: Arc<ShutdownController>,
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
