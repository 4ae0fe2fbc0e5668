//! Request-scoped error taxonomy.
//!
//! Every failure a caller can observe maps onto exactly one variant and
//! one status code. Startup problems (bad origins, malformed rewrite
//! templates) are configuration errors and never reach this type; they
//! live in [`crate::config`] and [`crate::routing`] and abort the process
//! before the listener binds.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::auth::AuthError;

/// A failed request, as surfaced to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No rule in the route table matched the request path.
    #[error("no route matches {path:?}")]
    NoRouteFound { path: String },

    /// The matched route requires authentication and the credential was
    /// missing or rejected.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    /// The upstream connection was refused, reset, or otherwise failed.
    #[error("upstream {origin} unavailable: {reason}")]
    UpstreamUnavailable { origin: String, reason: String },

    /// The upstream produced no response headers within the deadline.
    #[error("upstream {origin} timed out after {deadline_secs}s")]
    UpstreamTimeout { origin: String, deadline_secs: u64 },
}

impl GatewayError {
    /// Status code returned to the caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::NoRouteFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            GatewayError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Terminal state of the request, used as the metrics `outcome` label.
    ///
    /// Rejections happen before any upstream I/O; failures happen after
    /// dispatch began.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::NoRouteFound { .. } | GatewayError::Unauthenticated(_) => "rejected",
            GatewayError::UpstreamUnavailable { .. } | GatewayError::UpstreamTimeout { .. } => {
                "failed"
            }
        }
    }

    /// Short body for the client. Internal detail (origin addresses,
    /// provider errors) stays in the logs.
    fn client_message(&self) -> &'static str {
        match self {
            GatewayError::NoRouteFound { .. } => "No matching route found",
            GatewayError::Unauthenticated(_) => "Authentication required",
            GatewayError::UpstreamUnavailable { .. } => "Upstream request failed",
            GatewayError::UpstreamTimeout { .. } => "Upstream timed out",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), self.client_message()).into_response()
    }
}
