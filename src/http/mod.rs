//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, pipeline handler)
//!     → routing table (rule match, capture)
//!     → auth gate (credential check, relay token)
//!     → request.rs (outbound request: URI, headers, token)
//!     → upstream dispatcher (pooled connection, deadline)
//!     → response.rs (strip hop-by-hop, stream body)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeGatewayRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
