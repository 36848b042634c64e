//! Shared fixtures for resolver integration tests.

use async_trait::async_trait;
use l2cache_config::{AppConfig, CacheConfig, ConfigLoader};
use l2cache_core::{CacheEntity, EntityTypeId, L2Result};
use l2cache_resolver::{CacheBackend, InMemoryBackend, LevelTwoCacheResolver};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

/// A cached domain object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub status: String,
    pub total_cents: i64,
}

impl CacheEntity for Order {
    const ENTITY_TYPE: &'static str = "shop.Order";
}

impl Order {
    pub fn new(id: u64, status: &str) -> Self {
        Self {
            id,
            status: status.to_string(),
            total_cents: (id as i64) * 100,
        }
    }
}

/// A query condition as the persistence layer would build it.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCriteria {
    pub status: String,
    pub page: usize,
}

impl OrderCriteria {
    pub fn status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            page: 0,
        }
    }
}

/// Resolver wired to an in-memory backend.
pub struct TestCache {
    pub backend: Arc<InMemoryBackend>,
    pub config: ConfigLoader,
    pub resolver: LevelTwoCacheResolver,
}

impl TestCache {
    /// Creates a resolver with the given query TTL.
    pub async fn with_ttl(ttl_seconds: u64) -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let config = ConfigLoader::from_config(AppConfig {
            cache: CacheConfig {
                ttl_seconds,
                ..CacheConfig::default()
            },
            ..AppConfig::default()
        });
        let resolver = LevelTwoCacheResolver::new(backend.clone(), config.clone()).await;

        Self {
            backend,
            config,
            resolver,
        }
    }

    pub async fn new() -> Self {
        Self::with_ttl(10).await
    }
}

pub fn orders() -> EntityTypeId {
    Order::entity_type_id()
}

/// Backend that holds every reader of an absent key until `callers` readers
/// have seen it absent, forcing them all into the initialisation race.
pub struct RacingBackend {
    inner: InMemoryBackend,
    barrier: Barrier,
    wins: AtomicUsize,
}

impl RacingBackend {
    pub fn new(callers: usize) -> Self {
        Self {
            inner: InMemoryBackend::new(),
            barrier: Barrier::new(callers),
            wins: AtomicUsize::new(0),
        }
    }

    /// How many `set_if_absent` calls stored their value.
    pub fn wins(&self) -> usize {
        self.wins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheBackend for RacingBackend {
    async fn get(&self, key: &[u8]) -> L2Result<Option<Vec<u8>>> {
        let value = self.inner.get(key).await?;
        if value.is_none() {
            self.barrier.wait().await;
        }
        Ok(value)
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> L2Result<bool> {
        self.inner.set(key, value, ttl_seconds).await
    }

    async fn delete(&self, key: &[u8]) -> L2Result<bool> {
        self.inner.delete(key).await
    }

    async fn keys(&self, pattern: &str) -> L2Result<Vec<String>> {
        self.inner.keys(pattern).await
    }

    async fn mget(&self, keys: &[Vec<u8>]) -> L2Result<Vec<Option<Vec<u8>>>> {
        self.inner.mget(keys).await
    }

    async fn set_if_absent(&self, key: &[u8], value: &[u8]) -> L2Result<bool> {
        let stored = self.inner.set_if_absent(key, value).await?;
        if stored {
            self.wins.fetch_add(1, Ordering::SeqCst);
        }
        Ok(stored)
    }
}
