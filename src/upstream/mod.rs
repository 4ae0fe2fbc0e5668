//! Upstream connection subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request (origin + rewritten path)
//!     → dispatch.rs (pool lookup by origin authority)
//!     → hyper client (pooled connection, connect timeout)
//!     → response headers within the deadline, or 502/504
//!     → Response<Incoming> streamed back to the caller
//! ```

pub mod dispatch;

pub use dispatch::Dispatcher;
