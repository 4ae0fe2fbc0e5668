//! Upstream dispatch.
//!
//! # Responsibilities
//! - Hold one pooled HTTP client per distinct origin in the route table
//! - Enforce the upstream response-header deadline
//! - Map transport failures onto the caller-visible error taxonomy
//!
//! # Design Decisions
//! - Pools are keyed by origin authority and built once at startup, so a
//!   burst of traffic to one origin cannot starve another origin's
//!   connections
//! - The deadline covers connect plus waiting for response headers; body
//!   streaming after that is bounded by the overall request timeout
//!   layer, not here

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::TimeoutConfig;
use crate::error::GatewayError;
use crate::observability::metrics;
use crate::routing::{Origin, RouteTable};

/// Streams requests to upstream origins over per-origin connection pools.
pub struct Dispatcher {
    clients: HashMap<String, Client<HttpConnector, Body>>,
    upstream_timeout: Duration,
}

impl Dispatcher {
    /// Build one pooled client per distinct origin in the table.
    pub fn new(table: &RouteTable, timeouts: &TimeoutConfig) -> Self {
        let mut clients = HashMap::new();
        for rule in table.rules() {
            clients
                .entry(rule.upstream().authority().to_string())
                .or_insert_with(|| build_client(timeouts));
        }

        Self {
            clients,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }

    /// Number of distinct origin pools.
    pub fn origin_count(&self) -> usize {
        self.clients.len()
    }

    /// Send a request to `origin` and wait for response headers.
    ///
    /// The response body is *not* consumed here; it streams back through
    /// the returned response.
    pub async fn dispatch(
        &self,
        origin: &Origin,
        request: Request<Body>,
    ) -> Result<Response<Incoming>, GatewayError> {
        let Some(client) = self.clients.get(origin.authority()) else {
            // Only reachable if a rule was matched against a table this
            // dispatcher was not built from.
            metrics::record_upstream_error(origin.authority(), "no_pool");
            return Err(GatewayError::UpstreamUnavailable {
                origin: origin.to_string(),
                reason: "no connection pool for origin".to_string(),
            });
        };

        match tokio::time::timeout(self.upstream_timeout, client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                let kind = if e.is_connect() { "connect" } else { "exchange" };
                metrics::record_upstream_error(origin.authority(), kind);
                Err(GatewayError::UpstreamUnavailable {
                    origin: origin.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                metrics::record_upstream_error(origin.authority(), "timeout");
                Err(GatewayError::UpstreamTimeout {
                    origin: origin.to_string(),
                    deadline_secs: self.upstream_timeout.as_secs(),
                })
            }
        }
    }
}

fn build_client(timeouts: &TimeoutConfig) -> Client<HttpConnector, Body> {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
        .build(connector)
}
