//! HTTP server setup and the request pipeline.
//!
//! # Responsibilities
//! - Create the Axum router and wire up middleware (request ID, trace,
//!   timeout, optional body limit)
//! - Drive a request through the pipeline: route match, auth gate, path
//!   rewrite, dispatch, response streaming
//! - Serve the gateway's own health endpoint
//! - Bind to the listener and drain gracefully on shutdown
//!
//! # Design Decisions
//! - Collaborators (route table, auth gate, dispatcher) are constructed
//!   by the caller and passed in, so every seam can be substituted in
//!   tests
//! - A request is either rejected before dispatch (404, 401) or
//!   dispatched exactly once (no retries); each terminal state is
//!   recorded exactly once in metrics

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_http::ServiceBuilderExt;

use crate::auth::{AuthError, AuthGate};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::request::{build_outbound, MakeGatewayRequestId, X_REQUEST_ID};
use crate::http::response::forward_response;
use crate::observability::metrics;
use crate::routing::RouteTable;
use crate::upstream::Dispatcher;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub table: Arc<RouteTable>,
    pub gate: Arc<AuthGate>,
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Assemble the pipeline from its parts.
    pub fn new(
        config: &GatewayConfig,
        table: RouteTable,
        gate: AuthGate,
        dispatcher: Dispatcher,
    ) -> Self {
        let state = AppState {
            table: Arc::new(table),
            gate: Arc::new(gate),
            dispatcher: Arc::new(dispatcher),
        };

        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        // The wildcard route does not cover "/", so the root gets its own
        // route. /healthz is a static route and wins over the wildcard.
        let mut router = Router::new()
            .route("/healthz", get(health_handler))
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .set_x_request_id(MakeGatewayRequestId)
                    .layer(TraceLayer::new_for_http())
                    .propagate_x_request_id()
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            );

        if let Some(limit) = config.listener.max_body_bytes {
            router = router.layer(RequestBodyLimitLayer::new(limit));
        }

        router
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown signal fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Liveness endpoint answered by the gateway itself, never proxied.
async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Main gateway handler.
/// Matches a route, clears the auth gate, rewrites the path, dispatches
/// upstream, and streams the response back.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "handling request"
    );

    // 1. Route lookup; first match wins.
    let Some(matched) = state.table.match_path(&path) else {
        tracing::warn!(request_id = %request_id, path = %path, "no route matched");
        return fail(GatewayError::NoRouteFound { path }, &method, "none", start);
    };
    let route = matched.rule.name();

    // 2. Authentication gate; runs before any upstream I/O.
    let relay = match state.gate.authorize(matched.rule, request.headers()).await {
        Ok(relay) => relay,
        Err(e) => {
            match &e {
                AuthError::Provider(reason) => tracing::error!(
                    request_id = %request_id,
                    route = %route,
                    reason = %reason,
                    "token provider unavailable, rejecting"
                ),
                _ => tracing::warn!(
                    request_id = %request_id,
                    route = %route,
                    error = %e,
                    "authentication failed"
                ),
            }
            return fail(GatewayError::Unauthenticated(e), &method, route, start);
        }
    };

    // 3. Path rewrite from the rule's compiled template.
    let target_path = matched.target_path().into_owned();

    // 4. Build the outbound request; the body is moved, not buffered.
    let origin = matched.rule.upstream();
    let (parts, body) = request.into_parts();
    let outbound = match build_outbound(&parts, body, origin, &target_path, relay.as_ref(), addr.ip())
    {
        Ok(outbound) => outbound,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "failed to build upstream request");
            metrics::record_request(method.as_str(), 500, route, "failed", start);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // 5. Dispatch exactly once and stream the response straight back.
    match state.dispatcher.dispatch(origin, outbound).await {
        Ok(upstream_response) => {
            let status = upstream_response.status();
            metrics::record_request(method.as_str(), status.as_u16(), route, "completed", start);
            tracing::debug!(
                request_id = %request_id,
                route = %route,
                status = %status,
                "request completed"
            );
            forward_response(upstream_response)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route = %route,
                error = %e,
                "upstream dispatch failed"
            );
            fail(e, &method, route, start)
        }
    }
}

/// Record a failed request and produce its response.
fn fail(error: GatewayError, method: &Method, route: &str, start: Instant) -> Response {
    metrics::record_request(
        method.as_str(),
        error.status_code().as_u16(),
        route,
        error.outcome(),
        start,
    );
    error.into_response()
}
