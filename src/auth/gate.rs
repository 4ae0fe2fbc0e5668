//! The per-route authentication gate.
//!
//! # Responsibilities
//! - Decide per matched rule whether authentication applies
//! - Extract the bearer credential from the Authorization header
//! - Drive the provider's validate-then-relay sequence
//!
//! # Design Decisions
//! - Runs strictly before dispatch; a rejected request never costs an
//!   upstream connection
//! - Fails closed: provider outages reject with the same 401 surface as
//!   bad credentials, distinguished only in logs and error detail

use std::sync::Arc;

use axum::http::{header, HeaderMap};

use crate::auth::token::{AccessToken, AuthError, TokenProvider};
use crate::routing::RouteRule;

/// Gateway-side authentication orchestration. Token validation itself
/// lives behind [`TokenProvider`].
pub struct AuthGate {
    provider: Arc<dyn TokenProvider>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }

    /// Clear a request for dispatch on `rule`.
    ///
    /// Open rules pass with no token attached. Protected rules yield the
    /// relay token to send upstream, or an error that surfaces as 401.
    pub async fn authorize(
        &self,
        rule: &RouteRule,
        headers: &HeaderMap,
    ) -> Result<Option<AccessToken>, AuthError> {
        if !rule.requires_auth() {
            return Ok(None);
        }

        let credential = bearer_credential(headers).ok_or(AuthError::MissingCredential)?;
        let session = self.provider.authenticate(credential).await?;
        let token = self.provider.relay_token(&session).await?;

        tracing::debug!(
            subject = %session.subject,
            route = %rule.name(),
            "session authenticated"
        );

        Ok(Some(token))
    }
}

/// Pull the bearer credential out of an Authorization header. The scheme
/// is matched case-insensitively; anything other than a non-empty bearer
/// value counts as missing.
fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::Session;
    use crate::routing::{Origin, RouteRule};
    use async_trait::async_trait;
    use axum::http::HeaderValue;

    struct FixedProvider {
        credential: &'static str,
        relay: &'static str,
    }

    #[async_trait]
    impl TokenProvider for FixedProvider {
        async fn authenticate(&self, credential: &str) -> Result<Session, AuthError> {
            if credential == self.credential {
                Ok(Session {
                    id: "sess-1".into(),
                    subject: "josh".into(),
                })
            } else {
                Err(AuthError::InvalidCredential)
            }
        }

        async fn relay_token(&self, _session: &Session) -> Result<AccessToken, AuthError> {
            Ok(AccessToken::bearer(self.relay))
        }
    }

    struct DownProvider;

    #[async_trait]
    impl TokenProvider for DownProvider {
        async fn authenticate(&self, _credential: &str) -> Result<Session, AuthError> {
            Err(AuthError::Provider("connection refused".into()))
        }

        async fn relay_token(&self, _session: &Session) -> Result<AccessToken, AuthError> {
            Err(AuthError::Provider("connection refused".into()))
        }
    }

    fn protected_rule() -> RouteRule {
        let origin = Origin::parse("http://127.0.0.1:8081").unwrap();
        RouteRule::new("api", "/api/**", origin, Some("/{segment}"), true).unwrap()
    }

    fn open_rule() -> RouteRule {
        let origin = Origin::parse("http://127.0.0.1:8082").unwrap();
        RouteRule::new("content", "/**", origin, None, false).unwrap()
    }

    fn gate() -> AuthGate {
        AuthGate::new(Arc::new(FixedProvider {
            credential: "inbound-cred",
            relay: "relay-token",
        }))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn open_rules_skip_the_provider_entirely() {
        let gate = AuthGate::new(Arc::new(DownProvider));
        let token = gate.authorize(&open_rule(), &HeaderMap::new()).await.unwrap();
        assert!(token.is_none());
    }

    #[tokio::test]
    async fn valid_credential_yields_the_relay_token() {
        let token = gate()
            .authorize(&protected_rule(), &headers_with("Bearer inbound-cred"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.value(), "relay-token");
    }

    #[tokio::test]
    async fn scheme_matching_is_case_insensitive() {
        let token = gate()
            .authorize(&protected_rule(), &headers_with("bearer inbound-cred"))
            .await
            .unwrap();
        assert!(token.is_some());
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let err = gate()
            .authorize(&protected_rule(), &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn non_bearer_schemes_are_rejected() {
        let err = gate()
            .authorize(&protected_rule(), &headers_with("Basic am9zaDpwdw=="))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential));
    }

    #[tokio::test]
    async fn bad_credential_is_rejected() {
        let err = gate()
            .authorize(&protected_rule(), &headers_with("Bearer wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn provider_outage_fails_closed() {
        let gate = AuthGate::new(Arc::new(DownProvider));
        let err = gate
            .authorize(&protected_rule(), &headers_with("Bearer inbound-cred"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }
}
