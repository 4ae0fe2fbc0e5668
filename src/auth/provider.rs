//! HTTP token provider client.
//!
//! Talks to an external identity service over two JSON endpoints: an
//! introspection endpoint that validates inbound credentials and a token
//! endpoint that issues the upstream-bound access token for a session.
//!
//! Provider HTTP 4xx answers mean the credential or session is no longer
//! good and map to [`AuthError::InvalidCredential`]; transport failures
//! and 5xx answers map to [`AuthError::Provider`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::auth::token::{AccessToken, AuthError, Session, TokenProvider};
use crate::config::AuthConfig;

#[derive(Debug, Error)]
#[error("invalid token provider configuration: {0}")]
pub struct ProviderConfigError(String);

#[derive(Serialize)]
struct IntrospectRequest<'a> {
    credential: &'a str,
}

#[derive(Deserialize)]
struct IntrospectResponse {
    active: bool,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    session: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    session: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in_secs: Option<u64>,
}

/// [`TokenProvider`] backed by an HTTP identity service.
pub struct HttpTokenProvider {
    http: reqwest::Client,
    introspect_url: Url,
    token_url: Url,
}

impl HttpTokenProvider {
    pub fn new(config: &AuthConfig) -> Result<Self, ProviderConfigError> {
        let introspect_url = Url::parse(&config.introspect_url)
            .map_err(|e| ProviderConfigError(format!("introspect_url: {e}")))?;
        let token_url = Url::parse(&config.token_url)
            .map_err(|e| ProviderConfigError(format!("token_url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ProviderConfigError(e.to_string()))?;

        Ok(Self {
            http,
            introspect_url,
            token_url,
        })
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn authenticate(&self, credential: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.introspect_url.clone())
            .json(&IntrospectRequest { credential })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(AuthError::InvalidCredential);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "introspection returned {status}"
            )));
        }

        let body: IntrospectResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("introspection body: {e}")))?;

        if !body.active || body.subject.is_empty() {
            return Err(AuthError::InvalidCredential);
        }

        // Providers that do not model sessions separately key everything
        // by subject.
        let id = if body.session.is_empty() {
            body.subject.clone()
        } else {
            body.session
        };

        Ok(Session {
            id,
            subject: body.subject,
        })
    }

    async fn relay_token(&self, session: &Session) -> Result<AccessToken, AuthError> {
        let response = self
            .http
            .post(self.token_url.clone())
            .json(&TokenRequest {
                session: &session.id,
            })
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            // The session the credential resolved to is gone; the caller
            // has to log in again.
            return Err(AuthError::InvalidCredential);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "token endpoint returned {status}"
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("token body: {e}")))?;

        let expires_at = body
            .expires_in_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        Ok(AccessToken::new(body.access_token, expires_at))
    }
}
