//! Startup actions.
//!
//! # Responsibilities
//! - Dump the process environment when asked (deployment debugging)
//! - Maintain the liveness marker file around the serving window
//!
//! # Design Decisions
//! - Fail fast on real startup errors, but liveness file problems only
//!   warn; a broken probe path should not stop traffic
//! - The marker is written after the listener binds, so its presence
//!   means "accepting connections"

use std::fs;
use std::path::Path;

/// Log every process environment variable. Gated behind the
/// `startup.dump_env` config flag since values may hold secrets.
pub fn log_environment() {
    tracing::info!("process environment:");
    for (key, value) in std::env::vars() {
        tracing::info!("\t{}={}", key, value);
    }
}

/// Write the liveness marker.
pub fn write_liveness_file(path: &Path) {
    match fs::write(path, b"ok\n") {
        Ok(()) => tracing::info!(path = %path.display(), "liveness file written"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to write liveness file"),
    }
}

/// Remove the liveness marker on shutdown. Best effort.
pub fn remove_liveness_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "liveness file removed"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove liveness file"),
    }
}
