//! Metrics middleware for broker requests.
//!
//! Wraps each request in a `broker_op` tracing span and records a request
//! counter and a latency histogram per verb and outcome.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use broker_core::BrokerError;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};

use crate::service::operation::{BrokerRequest, BrokerResponse};

// ---------------------------------------------------------------------------
// MetricsLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments broker requests.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsService { inner }
    }
}

// ---------------------------------------------------------------------------
// MetricsService
// ---------------------------------------------------------------------------

/// Service wrapper that records duration and outcome of each request.
#[derive(Debug, Clone)]
pub struct MetricsService<S> {
    inner: S,
}

impl<S> MetricsService<S> {
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.inner
    }
}

impl<S> Service<BrokerRequest> for MetricsService<S>
where
    S: Service<BrokerRequest, Response = BrokerResponse, Error = BrokerError> + Send,
    S::Future: Send + 'static,
{
    type Response = BrokerResponse;
    type Error = BrokerError;
    type Future = Pin<Box<dyn Future<Output = Result<BrokerResponse, BrokerError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: BrokerRequest) -> Self::Future {
        let verb = request.verb().as_str();
        let span = info_span!(
            "broker_op",
            verb = verb,
            instance_id = request.instance_id().unwrap_or_default(),
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        let fut = self.inner.call(request);

        Box::pin(
            async move {
                let start = Instant::now();
                let result = fut.await;
                let elapsed = start.elapsed();

                let outcome = match &result {
                    Ok(_) => "ok",
                    Err(err) => err.kind().as_str(),
                };

                #[allow(clippy::cast_possible_truncation)]
                let duration_ms = elapsed.as_millis() as u64;
                let span = tracing::Span::current();
                span.record("duration_ms", duration_ms);
                span.record("outcome", outcome);

                metrics::counter!("broker_requests_total", "verb" => verb, "outcome" => outcome)
                    .increment(1);
                metrics::histogram!("broker_request_duration_seconds", "verb" => verb)
                    .record(elapsed.as_secs_f64());

                match &result {
                    Ok(_) => tracing::info!(verb, duration_ms, "broker request complete"),
                    Err(err) => {
                        tracing::warn!(
                            verb,
                            duration_ms,
                            outcome,
                            error = %err,
                            "broker request failed"
                        );
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use broker_core::{Catalog, LastOperation};
    use tower::ServiceExt;

    use super::*;

    /// Answers catalog requests and fails everything else.
    struct CatalogOnly;

    impl Service<BrokerRequest> for CatalogOnly {
        type Response = BrokerResponse;
        type Error = BrokerError;
        type Future =
            Pin<Box<dyn Future<Output = Result<BrokerResponse, BrokerError>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, request: BrokerRequest) -> Self::Future {
            Box::pin(async move {
                match request {
                    BrokerRequest::Catalog => Ok(BrokerResponse::Catalog(Catalog::default())),
                    BrokerRequest::LastOperation { instance_id, .. } => {
                        Err(BrokerError::instance_not_found(instance_id))
                    }
                    _ => Ok(BrokerResponse::LastOperation(LastOperation::succeeded())),
                }
            })
        }
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_response() {
        let svc = MetricsLayer.layer(CatalogOnly);
        let resp = svc.oneshot(BrokerRequest::Catalog).await.unwrap();
        assert!(matches!(resp, BrokerResponse::Catalog(_)));
    }

    #[tokio::test]
    async fn metrics_layer_passes_through_error() {
        let svc = MetricsLayer.layer(CatalogOnly);
        let err = svc
            .oneshot(BrokerRequest::LastOperation {
                instance_id: "gone".to_string(),
                operation: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BrokerError::InstanceNotFound { instance_id } if instance_id == "gone"
        ));
    }
}
