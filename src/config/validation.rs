//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Compile the route table once, so bad origins and malformed rewrite
//!   templates abort startup instead of surfacing on the first request
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::routing::{RouteError, RouteTable};

/// A single problem found in a configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {value:?} is not a socket address")]
    BindAddress { value: String },

    #[error("observability.metrics_address {value:?} is not a socket address")]
    MetricsAddress { value: String },

    #[error("auth.{field} {value:?} is not a usable URL: {reason}")]
    AuthUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("route table rejected: {0}")]
    Routes(#[from] RouteError),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress {
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress {
            value: config.observability.metrics_address.clone(),
        });
    }

    check_auth_url(&mut errors, "introspect_url", &config.auth.introspect_url);
    check_auth_url(&mut errors, "token_url", &config.auth.token_url);

    for (field, value) in [
        ("connect_secs", config.timeouts.connect_secs),
        ("upstream_secs", config.timeouts.upstream_secs),
        ("request_secs", config.timeouts.request_secs),
        ("idle_secs", config.timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    // Compiling the table checks both origins and every rewrite template.
    if let Err(e) = RouteTable::standard(
        &config.upstreams.api_origin,
        &config.upstreams.content_origin,
    ) {
        errors.push(ValidationError::Routes(e));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_auth_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError::AuthUrl {
                    field,
                    value: value.to_string(),
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                });
            } else if url.host_str().is_none() {
                errors.push(ValidationError::AuthUrl {
                    field,
                    value: value.to_string(),
                    reason: "missing host".to_string(),
                });
            }
        }
        Err(e) => errors.push(ValidationError::AuthUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
