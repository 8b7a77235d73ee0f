//! Pipeline composition: wraps the router in the operation-level layers.

use tower::ServiceBuilder;

use super::metrics::{MetricsLayer, MetricsService};
use crate::service::router::BrokerRouter;

/// The composed request pipeline handed to the transport.
pub type BrokerPipeline = MetricsService<BrokerRouter>;

/// Build the broker pipeline around `router`.
///
/// The router itself never times out, retries or sheds requests; the only
/// operation-level layer is instrumentation. Transport concerns (request
/// timeouts, request ids) live in the HTTP middleware stack.
#[must_use]
pub fn build_broker_pipeline(router: BrokerRouter) -> BrokerPipeline {
    ServiceBuilder::new().layer(MetricsLayer).service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
