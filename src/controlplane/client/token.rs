//! Access token cache
//!
//! One token is shared by every workflow invocation. Readers snapshot it
//! under a short synchronous lock; refresh is single-flight behind an async
//! mutex and re-checks validity once acquired, so concurrent callers never
//! see a half-installed token and only one refresh goes out.

use crate::domain::ports::{AccessToken, TokenSource, TokenSourceRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Tokens are treated as expired this long before their stated expiry
const EXPIRY_SKEW_SECS: i64 = 60;

// =============================================================================
// Token Cache
// =============================================================================

/// Thread-safe, lazily refreshed access token
pub struct TokenCache {
    source: TokenSourceRef,
    current: RwLock<Option<AccessToken>>,
    refresh: Mutex<()>,
}

impl TokenCache {
    pub fn new(source: TokenSourceRef) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Return a valid token, refreshing it first if needed
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        let _guard = self.refresh.lock().await;
        if let Some(token) = self.cached() {
            return Ok(token);
        }

        debug!("Refreshing control plane access token");
        let token = self.source.fetch_token().await?;
        let value = token.value.clone();
        info!("Access token refreshed, valid until {}", token.expires_at);
        *self.current.write() = Some(token);

        Ok(value)
    }

    /// Drop the cached token if it is still `rejected`
    ///
    /// A token installed by a concurrent refresh after `rejected` was
    /// handed out is left in place.
    pub fn invalidate_if(&self, rejected: &str) {
        let mut current = self.current.write();
        if current.as_ref().map_or(false, |token| token.value == rejected) {
            *current = None;
        }
    }

    fn cached(&self) -> Option<String> {
        let skew = chrono::Duration::seconds(EXPIRY_SKEW_SECS);
        let now = Utc::now();
        self.current
            .read()
            .as_ref()
            .filter(|token| token.expires_at - skew > now)
            .map(|token| token.value.clone())
    }
}

// =============================================================================
// Refresh Token Source
// =============================================================================

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponseWire {
    access_token: String,
    expires_in: i64,
}

/// OAuth refresh-token grant against the account service
pub struct RefreshTokenSource {
    http: reqwest::Client,
    auth_url: String,
    client_id: String,
    refresh_token: String,
}

impl RefreshTokenSource {
    pub fn new(
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        refresh_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            refresh_token: refresh_token.into(),
        })
    }
}

#[async_trait]
impl TokenSource for RefreshTokenSource {
    async fn fetch_token(&self) -> Result<AccessToken> {
        let grant = RefreshGrant {
            grant_type: "refresh_token",
            refresh_token: &self.refresh_token,
            client_id: &self.client_id,
        };

        let response = self.http.post(&self.auth_url).json(&grant).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Authentication(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let wire: TokenResponseWire = serde_json::from_str(&body)
            .map_err(|e| Error::Authentication(format!("malformed token response: {}", e)))?;
        if wire.access_token.is_empty() || wire.expires_in <= 0 {
            return Err(Error::Authentication(
                "token response carries no usable token".to_string(),
            ));
        }

        Ok(AccessToken {
            value: wire.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(wire.expires_in),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingSource {
        fetches: AtomicU32,
        lifetime_secs: i64,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch_token(&self) -> Result<AccessToken> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            Ok(AccessToken {
                value: format!("token-{}", n),
                expires_at: Utc::now() + chrono::Duration::seconds(self.lifetime_secs),
            })
        }
    }

    fn source(lifetime_secs: i64) -> Arc<CountingSource> {
        Arc::new(CountingSource {
            fetches: AtomicU32::new(0),
            lifetime_secs,
        })
    }

    #[tokio::test]
    async fn test_token_reused_while_valid() {
        let src = source(3600);
        let cache = TokenCache::new(src.clone());

        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        assert_eq!(src.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_token_within_skew_is_refreshed() {
        let src = source(30);
        let cache = TokenCache::new(src.clone());

        assert_eq!(cache.access_token().await.unwrap(), "token-1");
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let src = source(3600);
        let cache = TokenCache::new(src.clone());

        let rejected = cache.access_token().await.unwrap();
        cache.invalidate_if(&rejected);
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_stale_rejection_keeps_newer_token() {
        let src = source(3600);
        let cache = TokenCache::new(src.clone());

        let stale = cache.access_token().await.unwrap();
        cache.invalidate_if(&stale);
        assert_eq!(cache.access_token().await.unwrap(), "token-2");

        // a second caller reporting the already replaced token
        cache.invalidate_if(&stale);
        assert_eq!(cache.access_token().await.unwrap(), "token-2");
        assert_eq!(src.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_refresh() {
        let src = source(3600);
        let cache = Arc::new(TokenCache::new(src.clone()));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.access_token().await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(src.fetches.load(Ordering::SeqCst), 1);
    }
}
