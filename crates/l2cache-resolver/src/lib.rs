//! # L2Cache Resolver
//!
//! Second-level cache between a persistence layer and a remote key-value
//! store. Objects are cached under simple per-type keys; query results are
//! cached under keys hashed from the query condition and scoped by a
//! per-type namespace version, so a whole class of query results can be
//! invalidated by bumping one token.
//!
//! ```no_run
//! use l2cache_config::ConfigLoader;
//! use l2cache_core::EntityTypeId;
//! use l2cache_resolver::{connect_backend, LevelTwoCacheResolver};
//!
//! # async fn run() -> l2cache_core::L2Result<()> {
//! let config = ConfigLoader::from_default_location()?;
//! let backend = connect_backend(&config.get().await.redis).await?;
//! let cache = LevelTwoCacheResolver::new(backend, config).await;
//!
//! let orders = EntityTypeId::from("shop.Order");
//! cache.set_result_key_list(&orders, &serde_json::json!({"status": "OPEN"}), &["7".into()]).await?;
//! cache.mark_for_refresh(&orders).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
pub mod codec;
pub mod keys;
mod memory_backend;
mod namespace;
mod redis_backend;
mod resolver;
mod ttl;

pub use backend::{connect_backend, CacheBackend};
pub use keys::KeyCodec;
pub use memory_backend::InMemoryBackend;
pub use namespace::NamespaceVersioner;
pub use redis_backend::{create_pool, RedisBackend};
pub use resolver::{FieldMap, LevelTwoCacheResolver};
pub use ttl::TtlPolicy;
