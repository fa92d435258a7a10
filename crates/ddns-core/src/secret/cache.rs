// # Secret Cache
//
// Holds the last-fetched shared token with its fetch timestamp and serves it
// until it expires.
//
// ## Consistency
//
// The cached token sits behind an async reader/writer lock. The remote fetch
// happens with no lock held; only the commit takes the write lock. A reader
// therefore sees either the previous complete token or the new complete
// token, never a partial write.
//
// ## Concurrency
//
// Refresh is not deduplicated: callers that all find the cache expired each
// fetch. Fetches are idempotent reads, and the last commit wins.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::{Clock, SecretStore};

/// How long a fetched token is served before the store is read again
pub const SECRET_CACHE_TTL_SECS: i64 = 30;

/// A token as fetched from the secret store
#[derive(Clone)]
pub struct SharedToken {
    value: String,
    fetched_at: DateTime<Utc>,
    ttl: chrono::Duration,
}

impl SharedToken {
    fn new(value: String, fetched_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
        Self {
            value,
            fetched_at,
            ttl,
        }
    }

    /// Whether the token may be served at `now` without a refresh
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.value.is_empty() && now.signed_duration_since(self.fetched_at) < self.ttl
    }

    /// When the token was fetched
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

// The token value never appears in Debug output
impl std::fmt::Debug for SharedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedToken")
            .field("value", &"<REDACTED>")
            .field("fetched_at", &self.fetched_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Expiring cache in front of a [`SecretStore`]
///
/// Constructed with an explicit store and clock so a warm process shares
/// one instance (behind an `Arc`) and tests can drive time by hand.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::{MemorySecretStore, SecretCache, SystemClock};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(MemorySecretStore::new(" abc \n"));
///     let cache = SecretCache::new(store, Arc::new(SystemClock));
///
///     assert_eq!(cache.get().await?, "abc");
///     Ok(())
/// }
/// ```
pub struct SecretCache {
    store: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    cached: RwLock<Option<SharedToken>>,
}

impl SecretCache {
    /// Create an empty cache over `store`
    pub fn new(store: Arc<dyn SecretStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: chrono::Duration::seconds(SECRET_CACHE_TTL_SECS),
            cached: RwLock::new(None),
        }
    }

    /// Get the shared token at the clock's current time
    pub async fn get(&self) -> Result<String> {
        self.get_at(self.clock.now()).await
    }

    /// Get the shared token as of `now`
    ///
    /// Serves the cached value while it is fresh and non-empty. Otherwise
    /// reads the store, trims surrounding whitespace, commits the result
    /// stamped with `now`, and returns it.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The trimmed token (may be empty if the store holds nothing)
    /// - `Err(Error::SecretFetch)`: The store could not be read; the cache is left untouched
    pub async fn get_at(&self, now: DateTime<Utc>) -> Result<String> {
        {
            let guard = self.cached.read().await;
            if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(now)) {
                return Ok(token.value.clone());
            }
        }

        let raw = self.store.get_secret().await.map_err(|e| match e {
            Error::SecretFetch(_) => e,
            other => Error::secret_fetch(other.to_string()),
        })?;
        let value = raw.trim().to_string();

        {
            let mut guard = self.cached.write().await;
            *guard = Some(SharedToken::new(value.clone(), now, self.ttl));
        }

        debug!("Refreshed shared token from {} store", self.store.store_name());
        Ok(value)
    }

    /// Drop the cached token so the next read goes to the store
    pub async fn invalidate(&self) {
        let mut guard = self.cached.write().await;
        *guard = None;
    }

    /// The currently cached token, if any (fresh or not)
    pub async fn snapshot(&self) -> Option<SharedToken> {
        self.cached.read().await.clone()
    }
}
