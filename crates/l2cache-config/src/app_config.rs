//! Application configuration structures.

use l2cache_core::TracingConfig;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Second-level cache policy.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Redis backend connection.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Cache policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Base TTL in seconds for query-result caches. `0` disables expiry.
    pub ttl_seconds: u64,
    /// Multiplier applied to `ttl_seconds` for directly keyed objects.
    pub direct_ttl_factor: u64,
    /// Suffix appended to an entity type to form its namespace version key.
    pub namespace_suffix: String,
}

impl CacheConfig {
    /// Default direct-object TTL multiplier.
    pub const DEFAULT_DIRECT_TTL_FACTOR: u64 = 120;
    /// Default namespace version key suffix.
    pub const DEFAULT_NAMESPACE_SUFFIX: &'static str = ".N_S";
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 60,
            direct_ttl_factor: Self::DEFAULT_DIRECT_TTL_FACTOR,
            namespace_suffix: Self::DEFAULT_NAMESPACE_SUFFIX.to_string(),
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: usize,
    /// Enable Redis. When false the resolver falls back to a process-local backend.
    pub enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            enabled: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Builds the subscriber settings for [`l2cache_core::telemetry::init_tracing`].
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            filter: format!("{},l2cache=debug", self.log_level),
            json: self.log_format.eq_ignore_ascii_case("json"),
        }
    }
}
