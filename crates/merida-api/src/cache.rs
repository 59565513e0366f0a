//! Client-side query cache.
//!
//! Values are keyed by [`QueryKey`] and remembered with the instant they were
//! fetched. A read within the stale time is served from memory; anything
//! older is fetched again, with a bounded number of retries.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use merida_core::QueryConfig;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::error::ApiResult;

/// Ordered key of a cached query, such as `["plots", "<user id>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    /// Creates a key from its segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Gets the segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Checks if `prefix` is a leading run of this key's segments.
    #[must_use]
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

/// Query cache with stale time and retry.
pub struct QueryCache {
    entries: RwLock<HashMap<QueryKey, CacheEntry>>,
    stale_time: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.read().len())
            .field("stale_time", &self.stale_time)
            .field("retries", &self.retries)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(&QueryConfig::default())
    }
}

impl QueryCache {
    /// Creates a cache from the query settings.
    #[must_use]
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stale_time: config.stale_time,
            retries: config.retries,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Sets the pause before a retry.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Gets the stale time.
    #[must_use]
    pub const fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Returns the number of entries, fresh or stale.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Checks if `key` holds a value younger than the stale time.
    #[must_use]
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.stale_time)
    }

    /// Returns the cached value for `key` if it is fresh and of type `T`.
    #[must_use]
    pub fn get<T: Clone + Send + Sync + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        if entry.fetched_at.elapsed() >= self.stale_time {
            return None;
        }
        entry.value.downcast_ref::<T>().cloned()
    }

    /// Stores a value, stamping it as just fetched.
    pub fn set<T: Send + Sync + 'static>(&self, key: QueryKey, value: T) {
        let entry = CacheEntry {
            value: Arc::new(value),
            fetched_at: Instant::now(),
        };
        self.entries.write().insert(key, entry);
    }

    /// Drops every entry whose key starts with `prefix`.
    ///
    /// Returns the number of entries dropped.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = before - entries.len();
        tracing::debug!(prefix = %prefix, dropped, "invalidated queries");
        dropped
    }

    /// Drops everything.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the fresh value for `key`, or runs `fetcher` and caches its
    /// result.
    ///
    /// A failed fetch is retried while the error is retryable, up to the
    /// configured number of retries.
    ///
    /// # Errors
    ///
    /// Returns the last fetch error.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> ApiResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        if let Some(value) = self.get::<T>(&key) {
            tracing::debug!(key = %key, "cache hit");
            return Ok(value);
        }

        let mut attempt = 0;
        loop {
            match fetcher().await {
                Ok(value) => {
                    tracing::debug!(key = %key, attempt, "fetched");
                    self.set(key, value.clone());
                    return Ok(value);
                }
                Err(e) if attempt < self.retries && e.is_retryable() => {
                    attempt += 1;
                    tracing::debug!(key = %key, error = %e, attempt, "fetch failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
