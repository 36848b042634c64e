//! Expiry policy per cache category.

use l2cache_config::ConfigLoader;

/// Decides the TTL handed to the backend for each write.
///
/// Directly keyed objects live `direct_ttl_factor` times longer than query
/// results. The configuration is read on every call, so a reload reaches the
/// next write.
///
/// A TTL of `0` means "never expire" and is returned as `None`.
#[derive(Clone)]
pub struct TtlPolicy {
    config: ConfigLoader,
}

impl TtlPolicy {
    /// Create a policy reading from `config`.
    #[must_use]
    pub fn new(config: ConfigLoader) -> Self {
        Self { config }
    }

    /// TTL for objects and map lists stored under simple keys.
    pub async fn direct_object_ttl(&self) -> Option<u64> {
        let cache = self.config.cache().await;
        expiry(cache.ttl_seconds.saturating_mul(cache.direct_ttl_factor))
    }

    /// TTL for result key lists and paginated results.
    pub async fn query_result_ttl(&self, override_seconds: Option<u64>) -> Option<u64> {
        match override_seconds {
            Some(seconds) => expiry(seconds),
            None => expiry(self.config.cache().await.ttl_seconds),
        }
    }
}

fn expiry(seconds: u64) -> Option<u64> {
    (seconds > 0).then_some(seconds)
}
