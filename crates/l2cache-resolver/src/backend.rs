//! Key-value backend contract consumed by the resolver.

use crate::{InMemoryBackend, RedisBackend};
use async_trait::async_trait;
use l2cache_config::RedisConfig;
use l2cache_core::L2Result;
use std::sync::Arc;
use tracing::info;

/// The minimal key-value store the resolver needs.
///
/// Keys and values are byte strings. A write or delete that the store refuses
/// is reported as `Ok(false)`; `Err` is reserved for transport failures
/// (connection, pool, protocol). Implementations own their own timeouts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a value. Returns `None` if the key doesn't exist or has expired.
    async fn get(&self, key: &[u8]) -> L2Result<Option<Vec<u8>>>;

    /// Set a value, expiring after `ttl_seconds` when given.
    async fn set(&self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> L2Result<bool>;

    /// Delete a key. Deleting a missing key is not a failure.
    async fn delete(&self, key: &[u8]) -> L2Result<bool>;

    /// List keys matching a glob-style pattern (`*`, `?`, `[...]`).
    async fn keys(&self, pattern: &str) -> L2Result<Vec<String>>;

    /// Fetch many keys in one round trip.
    ///
    /// The result has one slot per requested key, in request order.
    async fn mget(&self, keys: &[Vec<u8>]) -> L2Result<Vec<Option<Vec<u8>>>>;

    /// Set a value without expiry only if the key is absent.
    ///
    /// Returns `true` if this call stored the value. The default is a plain
    /// read-then-write, so two callers can both observe absence and both
    /// write; backends with an atomic primitive should override it.
    async fn set_if_absent(&self, key: &[u8], value: &[u8]) -> L2Result<bool> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set(key, value, None).await
    }
}

/// Build the backend selected by `config`.
///
/// With `redis.enabled = false` the cache runs on a process-local
/// [`InMemoryBackend`] and no connection is attempted.
pub async fn connect_backend(config: &RedisConfig) -> L2Result<Arc<dyn CacheBackend>> {
    if !config.enabled {
        info!("Redis disabled, using in-memory cache backend");
        return Ok(Arc::new(InMemoryBackend::new()));
    }

    Ok(Arc::new(RedisBackend::connect(config).await?))
}
