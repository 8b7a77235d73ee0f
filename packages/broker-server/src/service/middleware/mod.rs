//! Tower middleware layers for the broker request pipeline.
//!
//! - [`metrics`]: per-verb tracing span, request counter and latency histogram
//! - [`pipeline`]: composes the layers around the `BrokerRouter`

pub mod metrics;
pub mod pipeline;

pub use metrics::{MetricsLayer, MetricsService};
pub use pipeline::{build_broker_pipeline, BrokerPipeline};
