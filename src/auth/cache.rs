//! Relay token caching.
//!
//! Wraps any [`TokenProvider`] and caches relay tokens per session id,
//! refreshing each one once it comes within the configured skew of its
//! expiry. Credential validation always goes to the inner provider; only
//! the token mint is cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::auth::token::{AccessToken, AuthError, Session, TokenProvider};

/// Expiry-aware cache over a provider's relay tokens.
pub struct TokenCache {
    inner: Arc<dyn TokenProvider>,
    tokens: DashMap<String, AccessToken>,
    skew: Duration,
}

impl TokenCache {
    pub fn new(inner: Arc<dyn TokenProvider>, skew: Duration) -> Self {
        Self {
            inner,
            tokens: DashMap::new(),
            skew,
        }
    }
}

#[async_trait]
impl TokenProvider for TokenCache {
    async fn authenticate(&self, credential: &str) -> Result<Session, AuthError> {
        self.inner.authenticate(credential).await
    }

    async fn relay_token(&self, session: &Session) -> Result<AccessToken, AuthError> {
        // Clone out of the map before any await; holding a shard guard
        // across an await point can deadlock other sessions on the shard.
        let cached = self
            .tokens
            .get(&session.id)
            .map(|entry| entry.value().clone());

        if let Some(token) = cached {
            if !token.is_stale(self.skew) {
                return Ok(token);
            }
        }

        // Concurrent refreshes for the same session both hit the inner
        // provider; last writer wins, which is harmless.
        let fresh = self.inner.relay_token(session).await?;
        self.tokens.insert(session.id.clone(), fresh.clone());
        Ok(fresh)
    }
}
