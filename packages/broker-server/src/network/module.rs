//! Broker HTTP server with deferred startup lifecycle.
//!
//! `new()` assembles shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown future resolves. Binding
//! separately lets the caller learn the OS-assigned port before serving.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, put};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use super::auth::{require_api_version, require_broker_auth};
use super::config::NetworkConfig;
use super::handlers::{
    bind_handler, catalog_handler, deprovision_handler, health_handler, last_operation_handler,
    liveness_handler, provision_handler, readiness_handler, unbind_handler, update_handler,
    AppState,
};
use super::middleware::build_http_layers;
use super::shutdown::ShutdownController;
use crate::service::middleware::{build_broker_pipeline, BrokerPipeline};
use crate::service::BrokerRouter;

/// Manages the HTTP server lifecycle around a [`BrokerRouter`].
pub struct BrokerServer {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    pipeline: BrokerPipeline,
    shutdown: Arc<ShutdownController>,
    start_time: Instant,
}

impl BrokerServer {
    /// Creates the server without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, router: BrokerRouter) -> Self {
        Self {
            config,
            listener: None,
            pipeline: build_broker_pipeline(router),
            shutdown: Arc::new(ShutdownController::new()),
            start_time: Instant::now(),
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health`, `/health/live`, `/health/ready` -- probes, unauthenticated
    /// - `GET /v2/catalog`
    /// - `PUT | PATCH | DELETE /v2/service_instances/{instance_id}`
    /// - `GET /v2/service_instances/{instance_id}/last_operation`
    /// - `PUT | DELETE /v2/service_instances/{instance_id}/service_bindings/{binding_id}`
    ///
    /// The `/v2` routes check credentials first, then the API version.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            pipeline: self.pipeline.clone(),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::new(self.config.clone()),
            start_time: self.start_time,
        };

        let broker_api = Router::new()
            .route("/v2/catalog", get(catalog_handler))
            .route(
                "/v2/service_instances/{instance_id}",
                put(provision_handler)
                    .patch(update_handler)
                    .delete(deprovision_handler),
            )
            .route(
                "/v2/service_instances/{instance_id}/last_operation",
                get(last_operation_handler),
            )
            .route(
                "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
                put(bind_handler).delete(unbind_handler),
            )
            .route_layer(from_fn_with_state(state.clone(), require_api_version))
            .route_layer(from_fn_with_state(state.clone(), require_broker_auth));

        Router::new()
            .route("/health", get(health_handler))
            .route("/health/live", get(liveness_handler))
            .route("/health/ready", get(readiness_handler))
            .merge(broker_api)
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured one
    /// when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then lets in-flight
    /// requests finish.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let controller = Arc::clone(&self.shutdown);

        let signal = {
            let controller = Arc::clone(&controller);
            async move {
                shutdown.await;
                info!("shutdown signalled, draining in-flight requests");
                controller.trigger_shutdown();
            }
        };

        controller.set_ready();
        axum::serve(listener, router)
            .with_graceful_shutdown(signal)
            .await?;

        controller.mark_stopped();
        info!("server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
    use axum::http::{Method, Request, StatusCode};
    use base64::prelude::*;
    use broker_core::{OperationToken, ServiceCapability};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::network::config::BrokerCredentials;
    use crate::network::HealthState;
    use crate::service::domain::CatService;
    use crate::service::ServiceRegistry;

    fn server() -> BrokerServer {
        let mut registry = ServiceRegistry::new();
        registry.register(CatService::new()).unwrap();
        let config = NetworkConfig {
            credentials: Some(BrokerCredentials::new("admin", "secret")),
            ..NetworkConfig::default()
        };
        BrokerServer::new(config, BrokerRouter::new(registry))
    }

    fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
        let auth = format!("Basic {}", BASE64_STANDARD.encode("admin:secret"));
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, auth)
            .header("x-broker-api-version", "2.14");
        match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[test]
    fn new_creates_server_without_binding() {
        let server = server();
        assert!(server.listener.is_none());
        assert_eq!(server.shutdown_controller().health_state(), HealthState::Starting);
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut server = server();
        let port = server.start().await.unwrap();
        assert!(port > 0);
        assert!(server.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let result = server().serve(std::future::pending::<()>()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown_signal() {
        let mut server = server();
        server.start().await.unwrap();
        let controller = server.shutdown_controller();

        server.serve(async {}).await.unwrap();
        assert_eq!(controller.health_state(), HealthState::Stopped);
    }

    #[tokio::test]
    async fn missing_credentials_are_rejected() {
        let router = server().build_router();
        let request = Request::builder()
            .uri("/v2/catalog")
            .header("x-broker-api-version", "2.14")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn old_or_missing_api_version_is_rejected() {
        let router = server().build_router();

        let mut old = request(Method::GET, "/v2/catalog", None);
        old.headers_mut()
            .insert("x-broker-api-version", "2.12".parse().unwrap());
        let (status, body) = send(&router, old).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error"], "PreconditionFailed");

        let mut missing = request(Method::GET, "/v2/catalog", None);
        missing.headers_mut().remove("x-broker-api-version");
        let (status, _) = send(&router, missing).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn probes_skip_authentication() {
        let server = server();
        let router = server.build_router();
        let probe = || Request::builder().uri("/health/ready").body(Body::empty()).unwrap();

        let response = router.clone().oneshot(probe()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        server.shutdown_controller().set_ready();
        let response = router.oneshot(probe()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn catalog_lists_registered_offering() {
        let router = server().build_router();
        let (status, body) = send(&router, request(Method::GET, "/v2/catalog", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["services"][0]["name"], "example-service");
        assert_eq!(body["services"][0]["plans"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let router = server().build_router();
        let mut req = request(Method::PUT, "/v2/service_instances/x?accepts_incomplete=true", None);
        *req.body_mut() = Body::from("{not json");
        req.headers_mut()
            .insert(CONTENT_TYPE, "application/json".parse().unwrap());

        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationFailed");
    }

    #[tokio::test]
    async fn unknown_instance_last_operation_is_not_found() {
        let router = server().build_router();
        let (status, body) = send(
            &router,
            request(
                Method::GET,
                "/v2/service_instances/x/last_operation?operation=unknown-service%20create",
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn instance_lifecycle_over_http() {
        let router = server().build_router();
        let cat = CatService::new();
        let service_id = cat.id().to_string();
        let plan_m = cat.offering().plan_by_name("m").unwrap().id.clone();
        let instance = "/v2/service_instances/x";

        // Synchronous provisioning is refused before anything happens.
        let provision = json!({"service_id": service_id, "plan_id": plan_m});
        let (status, body) = send(
            &router,
            request(Method::PUT, instance, Some(provision.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "AsyncRequired");

        let async_instance = format!("{instance}?accepts_incomplete=true");
        let (status, body) = send(
            &router,
            request(Method::PUT, &async_instance, Some(provision)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationFailed");

        let provision = json!({
            "service_id": service_id,
            "plan_id": plan_m,
            "parameters": {"hello": "world"},
        });
        let (status, body) = send(
            &router,
            request(Method::PUT, &async_instance, Some(provision)),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let token = body["operation"].as_str().unwrap().to_string();
        let decoded = OperationToken::decode(&token).unwrap();
        assert_eq!(decoded.service_id(), service_id);
        assert_eq!(decoded.operation_data(), Some("create"));

        let poll = format!(
            "{instance}/last_operation?operation={}",
            token.replace(' ', "%20")
        );
        let (status, body) = send(&router, request(Method::GET, &poll, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "succeeded");

        let binding = format!("{instance}/service_bindings/b1");
        let bind = json!({"service_id": service_id, "plan_id": plan_m, "app_guid": "app"});
        let (status, body) = send(&router, request(Method::PUT, &binding, Some(bind))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["credentials"]["uri"], "cat://x/b1");

        let unbind = format!("{binding}?service_id={service_id}&plan_id={plan_m}");
        let (status, body) = send(&router, request(Method::DELETE, &unbind, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
        let (status, _) = send(&router, request(Method::DELETE, &unbind, None)).await;
        assert_eq!(status, StatusCode::GONE);

        let deprovision = format!("{instance}?accepts_incomplete=true&service_id={service_id}");
        let (status, body) = send(&router, request(Method::DELETE, &deprovision, None)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body["operation"].as_str().unwrap().ends_with(" delete"));

        let (status, _) = send(&router, request(Method::DELETE, &deprovision, None)).await;
        assert_eq!(status, StatusCode::GONE);
    }
}
