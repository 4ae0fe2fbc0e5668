//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files.
//!
//! Every section and field is optional in the file; `#[serde(default)]`
//! fills in the rest, so a bare file (or none at all in tests) yields a
//! runnable config. Origins and URLs are kept as strings here; parsing
//! happens in [`crate::config::validation`] and when the route table is
//! compiled, so every problem with a config file is reported at startup
//! rather than on the first request.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, usually loaded from `gateway.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inbound listener settings.
    pub listener: ListenerConfig,

    /// Forwarding targets the route table is built from.
    pub upstreams: UpstreamConfig,

    /// Token provider endpoints and caching.
    pub auth: AuthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// One-shot actions around process start.
    pub startup: StartupConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Cap on inbound request body size in bytes. `None` disables the
    /// cap and bodies stream through without buffering.
    pub max_body_bytes: Option<usize>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: None,
        }
    }
}

/// The two origins the stock route table forwards to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin serving the API, reached via `/api/**` with the prefix
    /// stripped.
    pub api_origin: String,

    /// Origin serving static content, reached by every other path.
    pub content_origin: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_origin: "http://127.0.0.1:8081".to_string(),
            content_origin: "http://127.0.0.1:8082".to_string(),
        }
    }
}

/// Token provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Endpoint that validates inbound credentials.
    pub introspect_url: String,

    /// Endpoint that issues upstream-bound access tokens for a session.
    pub token_url: String,

    /// Timeout for calls to the token provider, in seconds.
    pub request_timeout_secs: u64,

    /// Cached relay tokens are refreshed this many seconds before their
    /// actual expiry.
    pub cache_skew_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            introspect_url: "http://127.0.0.1:9096/introspect".to_string(),
            token_url: "http://127.0.0.1:9096/token".to_string(),
            request_timeout_secs: 5,
            cache_skew_secs: 30,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for an upstream to produce response headers, in seconds.
    /// Expiry maps to 504.
    pub upstream_secs: u64,

    /// Cap on total time handling a single inbound request, in seconds.
    pub request_secs: u64,

    /// Idle upstream connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 10,
            request_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics exporter.
    pub metrics_enabled: bool,

    /// Metrics exporter bind address, separate from the gateway listener.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Startup actions.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StartupConfig {
    /// Log every process environment variable at startup. Off by default
    /// because the environment may hold secrets.
    pub dump_env: bool,

    /// File written once the listener is bound and removed on shutdown,
    /// for file-probe liveness checks.
    pub liveness_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_complete() {
        let config = GatewayConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.listener.max_body_bytes.is_none());
        assert_eq!(config.timeouts.upstream_secs, 10);
        assert!(config.observability.metrics_enabled);
        assert!(!config.startup.dump_env);
        assert!(config.startup.liveness_file.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstreams]
            api_origin = "http://10.0.0.5:8081"

            [timeouts]
            upstream_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.upstreams.api_origin, "http://10.0.0.5:8081");
        assert_eq!(config.upstreams.content_origin, "http://127.0.0.1:8082");
        assert_eq!(config.timeouts.upstream_secs, 3);
        assert_eq!(config.timeouts.connect_secs, 5);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        // An operator running an older binary with a newer file should
        // not be locked out.
        let parsed: Result<GatewayConfig, _> = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:0"
            shiny_new_knob = true
            "#,
        );
        assert!(parsed.is_ok());
    }
}
