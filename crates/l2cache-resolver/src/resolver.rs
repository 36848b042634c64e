//! The second-level cache resolver.

use crate::codec;
use crate::keys::{self, KeyCodec};
use crate::{CacheBackend, NamespaceVersioner, TtlPolicy};
use l2cache_config::ConfigLoader;
use l2cache_core::{EntityTypeId, L2Error, L2Result, Page};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One row of a map-list cache: column name to value.
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Translates entity-level cache requests into backend operations.
///
/// Objects are cached under simple keys (`{type}.key`) with the long
/// direct-object TTL. Query results are cached under condition-hashed keys
/// scoped by the type's namespace version with the short query TTL, and are
/// invalidated in bulk by [`mark_for_refresh`](Self::mark_for_refresh).
///
/// There is no cross-key atomicity: a hashed write racing a version bump may
/// land under the old version and is then never read.
#[derive(Clone)]
pub struct LevelTwoCacheResolver {
    backend: Arc<dyn CacheBackend>,
    keys: KeyCodec,
    ttl: TtlPolicy,
}

impl LevelTwoCacheResolver {
    /// Create a resolver over an injected backend.
    ///
    /// The namespace suffix is fixed here; TTLs keep following `config`.
    pub async fn new(backend: Arc<dyn CacheBackend>, config: ConfigLoader) -> Self {
        let suffix = config.cache().await.namespace_suffix;
        let versioner = NamespaceVersioner::new(backend.clone(), suffix);
        Self {
            backend,
            keys: KeyCodec::new(versioner),
            ttl: TtlPolicy::new(config),
        }
    }

    /// The namespace versioner used for hashed keys.
    #[must_use]
    pub fn versioner(&self) -> &NamespaceVersioner {
        self.keys.versioner()
    }

    // ============ Direct objects ============

    /// Cache an object under a literal key.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        key: &str,
        value: &T,
    ) -> L2Result<()> {
        let bytes = codec::encode(value).map_err(|e| {
            L2Error::persistence(format!("Failed to encode {} '{}': {}", type_id, key, e))
        })?;
        self.write_simple(type_id, key, &bytes).await
    }

    /// Read an object cached under a literal key.
    pub async fn get<T: DeserializeOwned>(
        &self,
        type_id: &EntityTypeId,
        key: &str,
    ) -> L2Result<Option<T>> {
        let Some(bytes) = self.read_simple(type_id, key).await? else {
            return Ok(None);
        };

        codec::decode(&bytes).map(Some).map_err(|e| {
            L2Error::cache_read(format!("Failed to decode {} '{}': {}", type_id, key, e))
        })
    }

    /// Cache a list of field maps under a literal key.
    pub async fn set_map_list(
        &self,
        type_id: &EntityTypeId,
        key: &str,
        map_list: &[FieldMap],
    ) -> L2Result<()> {
        self.set(type_id, key, map_list).await
    }

    /// Read a list of field maps cached under a literal key.
    pub async fn get_map_list(
        &self,
        type_id: &EntityTypeId,
        key: &str,
    ) -> L2Result<Option<Vec<FieldMap>>> {
        self.get(type_id, key).await
    }

    /// Fetch many objects in one round trip.
    ///
    /// Missing and undecodable entries are skipped; the rest keep input order.
    pub async fn list<T: DeserializeOwned>(
        &self,
        type_id: &EntityTypeId,
        key_list: &[String],
    ) -> L2Result<Vec<T>> {
        if key_list.is_empty() {
            return Ok(Vec::new());
        }

        let raw_keys: Vec<Vec<u8>> = key_list
            .iter()
            .map(|key| keys::simple_key(type_id, key).into_bytes())
            .collect();

        let values = self.backend.mget(&raw_keys).await?;

        let mut found = Vec::with_capacity(values.len());
        for (key, value) in key_list.iter().zip(values) {
            let Some(bytes) = value else {
                continue;
            };
            match codec::decode(&bytes) {
                Ok(item) => found.push(item),
                Err(e) => warn!(entity_type = %type_id, key = %key, error = %e, "Skipping malformed cache entry"),
            }
        }

        debug!(
            entity_type = %type_id,
            requested = key_list.len(),
            found = found.len(),
            "Batch cache fetch"
        );
        Ok(found)
    }

    // ============ Query results ============

    /// Cache the key list a query produced.
    pub async fn set_result_key_list<C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
        key_list: &[String],
    ) -> L2Result<()> {
        let bytes = codec::encode(key_list).map_err(|e| {
            L2Error::persistence(format!("Failed to encode result keys of {}: {}", type_id, e))
        })?;
        self.write_hashed(type_id, condition, &bytes, None).await
    }

    /// Read the cached key list of a query.
    ///
    /// A miss returns an empty list, unlike
    /// [`get_result_key_list_paginated`](Self::get_result_key_list_paginated).
    pub async fn get_result_key_list<C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
    ) -> L2Result<Vec<String>> {
        Ok(self.read_hashed(type_id, condition).await?.unwrap_or_default())
    }

    /// Cache one page of a query with the configured query TTL.
    pub async fn set_result_key_list_paginated<T: Serialize, C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
        page: &Page<T>,
    ) -> L2Result<()> {
        self.write_page(type_id, condition, page, None).await
    }

    /// Cache one page of a query with an explicit TTL in seconds.
    pub async fn set_result_key_list_paginated_with_ttl<T: Serialize, C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
        page: &Page<T>,
        ttl_seconds: u64,
    ) -> L2Result<()> {
        self.write_page(type_id, condition, page, Some(ttl_seconds)).await
    }

    /// Read a cached page of a query. A miss returns `None`.
    pub async fn get_result_key_list_paginated<T: DeserializeOwned, C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
    ) -> L2Result<Option<Page<T>>> {
        self.read_hashed(type_id, condition).await
    }

    // ============ Invalidation ============

    /// Delete the object cached under a literal key.
    pub async fn remove(&self, type_id: &EntityTypeId, key: &str) -> L2Result<()> {
        let key = keys::simple_key(type_id, key);
        if !self.backend.delete(key.as_bytes()).await? {
            return Err(L2Error::cache_write(format!("Failed to remove '{}'", key)));
        }
        debug!(key = %key, "Removed cache entry");
        Ok(())
    }

    /// Delete every simple key of a type, returning how many were deleted.
    ///
    /// Not atomic: the first refused delete aborts the sweep and leaves the
    /// remaining keys in place. The error reports how many went before it.
    /// Condition-hashed entries are untouched; use
    /// [`mark_for_refresh`](Self::mark_for_refresh) for those.
    pub async fn remove_all(&self, type_id: &EntityTypeId) -> L2Result<usize> {
        let pattern = keys::type_pattern(type_id)?;
        let matched = self.backend.keys(&pattern).await?;

        for (deleted, key) in matched.iter().enumerate() {
            if !self.backend.delete(key.as_bytes()).await? {
                return Err(L2Error::cache_write(format!(
                    "Failed to remove '{}' after deleting {} of {} keys matching '{}'",
                    key,
                    deleted,
                    matched.len(),
                    pattern
                )));
            }
        }

        info!(entity_type = %type_id, count = matched.len(), "Removed all cache entries of type");
        Ok(matched.len())
    }

    /// Invalidate every cached query result of a type by bumping its namespace version.
    pub async fn mark_for_refresh(&self, type_id: &EntityTypeId) -> L2Result<String> {
        self.keys.versioner().bump_version(type_id).await
    }

    // ============ Internals ============

    async fn write_simple(&self, type_id: &EntityTypeId, key: &str, bytes: &[u8]) -> L2Result<()> {
        let key = keys::simple_key(type_id, key);
        let ttl = self.ttl.direct_object_ttl().await;

        if !self.backend.set(key.as_bytes(), bytes, ttl).await? {
            return Err(L2Error::cache_write(format!("Failed to cache '{}'", key)));
        }
        debug!(key = %key, ttl = ?ttl, "Cached object");
        Ok(())
    }

    async fn read_simple(&self, type_id: &EntityTypeId, key: &str) -> L2Result<Option<Vec<u8>>> {
        let key = keys::simple_key(type_id, key);
        let value = self.backend.get(key.as_bytes()).await?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }
        Ok(value)
    }

    async fn write_page<T: Serialize, C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
        page: &Page<T>,
        ttl_override: Option<u64>,
    ) -> L2Result<()> {
        let bytes = codec::encode(page).map_err(|e| {
            L2Error::persistence(format!("Failed to encode result page of {}: {}", type_id, e))
        })?;
        self.write_hashed(type_id, condition, &bytes, ttl_override).await
    }

    async fn write_hashed<C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
        bytes: &[u8],
        ttl_override: Option<u64>,
    ) -> L2Result<()> {
        let key = self.keys.hashed_key(type_id, condition).await?;
        let ttl = self.ttl.query_result_ttl(ttl_override).await;

        if !self.backend.set(key.as_bytes(), bytes, ttl).await? {
            return Err(L2Error::cache_write(format!(
                "Failed to cache query result of {} under '{}'",
                type_id, key
            )));
        }
        debug!(entity_type = %type_id, key = %key, ttl = ?ttl, "Cached query result");
        Ok(())
    }

    /// Reads a query result; a malformed payload counts as a miss.
    async fn read_hashed<T: DeserializeOwned, C: Serialize + ?Sized>(
        &self,
        type_id: &EntityTypeId,
        condition: &C,
    ) -> L2Result<Option<T>> {
        let key = self.keys.hashed_key(type_id, condition).await?;
        let Some(bytes) = self.backend.get(key.as_bytes()).await? else {
            debug!(entity_type = %type_id, key = %key, "Query result cache miss");
            return Ok(None);
        };

        match codec::decode(&bytes) {
            Ok(value) => {
                debug!(entity_type = %type_id, key = %key, "Query result cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(entity_type = %type_id, key = %key, error = %e, "Discarding malformed query result");
                Ok(None)
            }
        }
    }
}
