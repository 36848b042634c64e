//! Redis-backed implementation of [`CacheBackend`].

use crate::CacheBackend;
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use l2cache_config::RedisConfig;
use l2cache_core::{L2Error, L2Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Create a Redis connection pool and verify it with `PING`.
pub async fn create_pool(config: &RedisConfig) -> L2Result<Pool> {
    info!("Creating Redis connection pool for the second-level cache...");

    let pool = Config::from_url(&config.url)
        .builder()
        .map_err(|e| L2Error::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| L2Error::Configuration(format!("Failed to create pool: {}", e)))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| L2Error::backend(format!("Failed to get Redis connection: {}", e)))?;
    deadpool_redis::redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
        .map_err(|e| L2Error::backend(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Redis cache backend.
///
/// Read commands that fail are returned as [`L2Error::Backend`]. Write
/// commands (`SET`, `DEL`) that fail are logged and reported as `Ok(false)`
/// so the resolver raises a cache write error for them.
#[derive(Clone)]
pub struct RedisBackend {
    pool: Arc<Pool>,
}

impl RedisBackend {
    /// Create a backend over an existing pool.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool }
    }

    /// Connect using the given configuration.
    pub async fn connect(config: &RedisConfig) -> L2Result<Self> {
        Ok(Self::new(Arc::new(create_pool(config).await?)))
    }

    async fn get_conn(&self) -> L2Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| L2Error::backend(format!("Failed to get Redis connection: {}", e)))
    }
}

fn printable(key: &[u8]) -> String {
    String::from_utf8_lossy(key).into_owned()
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &[u8]) -> L2Result<Option<Vec<u8>>> {
        let mut conn = self.get_conn().await?;
        conn.get(key).await.map_err(|e| {
            L2Error::backend(format!("Failed to get key '{}': {}", printable(key), e))
        })
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> L2Result<bool> {
        let mut conn = self.get_conn().await?;

        let result = match ttl_seconds {
            Some(secs) => conn.set_ex::<_, _, ()>(key, value, secs.max(1)).await,
            None => conn.set::<_, _, ()>(key, value).await,
        };

        match result {
            Ok(()) => {
                debug!(key = %printable(key), ttl = ?ttl_seconds, "Redis SET");
                Ok(true)
            }
            Err(e) => {
                warn!(key = %printable(key), error = %e, "Redis SET failed");
                Ok(false)
            }
        }
    }

    async fn delete(&self, key: &[u8]) -> L2Result<bool> {
        let mut conn = self.get_conn().await?;

        match conn.del::<_, i64>(key).await {
            Ok(deleted) => {
                debug!(key = %printable(key), deleted, "Redis DEL");
                Ok(true)
            }
            Err(e) => {
                warn!(key = %printable(key), error = %e, "Redis DEL failed");
                Ok(false)
            }
        }
    }

    async fn keys(&self, pattern: &str) -> L2Result<Vec<String>> {
        let mut conn = self.get_conn().await?;

        // KEYS blocks the server while it scans; bulk removal is expected to be rare.
        conn.keys(pattern)
            .await
            .map_err(|e| L2Error::backend(format!("Failed to scan keys '{}': {}", pattern, e)))
    }

    async fn mget(&self, keys: &[Vec<u8>]) -> L2Result<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn().await?;

        // MGET through cmd so a single key still yields an array reply.
        let mut cmd = deadpool_redis::redis::cmd("MGET");
        for key in keys {
            cmd.arg(key.as_slice());
        }

        cmd.query_async(&mut conn)
            .await
            .map_err(|e| L2Error::backend(format!("Failed to MGET {} keys: {}", keys.len(), e)))
    }

    async fn set_if_absent(&self, key: &[u8], value: &[u8]) -> L2Result<bool> {
        let mut conn = self.get_conn().await?;
        conn.set_nx(key, value).await.map_err(|e| {
            L2Error::backend(format!("Failed to SETNX key '{}': {}", printable(key), e))
        })
    }
}
