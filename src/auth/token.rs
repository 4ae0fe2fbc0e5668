//! Sessions, access tokens, and the token provider seam.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;

/// Why a request failed authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No bearer credential on the request.
    #[error("missing bearer credential")]
    MissingCredential,

    /// The provider examined the credential and rejected it.
    #[error("credential rejected by token provider")]
    InvalidCredential,

    /// The provider could not be consulted. The gate fails closed on
    /// this, so an outage rejects rather than admits.
    #[error("token provider unavailable: {0}")]
    Provider(String),
}

/// An authenticated inbound session as resolved by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Stable session identifier; relay tokens are cached per session.
    pub id: String,

    /// Subject (end user) the session belongs to. Logged, never sent
    /// upstream.
    pub subject: String,
}

/// An upstream-bound access token.
///
/// The token value is a credential; `Debug` redacts it so it cannot leak
/// through logs.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: Option<Instant>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// A token without a known expiry. Never considered stale.
    pub fn bearer(value: impl Into<String>) -> Self {
        Self::new(value, None)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// True once the token is within `skew` of its expiry.
    pub fn is_stale(&self, skew: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() + skew >= expires_at,
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// The external identity collaborator.
///
/// Implementations validate inbound credentials and mint the
/// upstream-bound token for a session. The HTTP implementation lives in
/// [`crate::auth::provider`]; tests substitute in-process fakes.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Validate an inbound bearer credential and resolve its session.
    async fn authenticate(&self, credential: &str) -> Result<Session, AuthError>;

    /// The current upstream-bound access token for a session.
    async fn relay_token(&self, session: &Session) -> Result<AccessToken, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_the_token_value() {
        let token = AccessToken::bearer("super-secret-token");
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("super-secret-token"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn tokens_without_expiry_never_go_stale() {
        let token = AccessToken::bearer("t");
        assert!(!token.is_stale(Duration::from_secs(3600)));
    }

    #[test]
    fn staleness_respects_the_skew() {
        let soon = Instant::now() + Duration::from_secs(10);
        let token = AccessToken::new("t", Some(soon));
        assert!(token.is_stale(Duration::from_secs(30)));
        assert!(!token.is_stale(Duration::from_secs(1)));
    }

    #[test]
    fn expired_tokens_are_stale_even_without_skew() {
        let past = Instant::now() - Duration::from_secs(1);
        let token = AccessToken::new("t", Some(past));
        assert!(token.is_stale(Duration::ZERO));
    }
}
