//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape on its own listener)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every request-scoped log event
//! - Metrics are cheap (atomic increments)
//! - Exporter failure never takes the gateway down

pub mod logging;
pub mod metrics;
