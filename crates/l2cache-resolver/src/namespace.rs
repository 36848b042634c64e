//! Per-entity-type namespace versions.
//!
//! Every condition-hashed key of a type mixes in that type's current version
//! token. Bumping the token makes all previously computed hashed keys
//! unreachable at once; the orphaned entries stay in the backend until their
//! TTL runs out.
//!
//! Two callers that both find the version missing race to initialise it.
//! The atomic `set_if_absent` picks one winner and the loser re-reads the
//! stored token. With a backend that only has the default read-then-write
//! `set_if_absent`, both may write and the last write wins: whichever caller
//! was overwritten has computed keys that are simply never read again.

use crate::CacheBackend;
use chrono::Utc;
use l2cache_core::{EntityTypeId, L2Error, L2Result};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

static LAST_TOKEN: AtomicI64 = AtomicI64::new(0);

/// Next version token: wall-clock nanoseconds, strictly increasing within the process.
fn next_token() -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last.saturating_add(1));
        match LAST_TOKEN.compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Reads, initialises and bumps namespace versions.
#[derive(Clone)]
pub struct NamespaceVersioner {
    backend: Arc<dyn CacheBackend>,
    suffix: String,
}

impl NamespaceVersioner {
    /// Create a versioner storing tokens under `{type}{suffix}`.
    pub fn new(backend: Arc<dyn CacheBackend>, suffix: impl Into<String>) -> Self {
        Self {
            backend,
            suffix: suffix.into(),
        }
    }

    /// Backend key holding the version token of `type_id`.
    #[must_use]
    pub fn version_key(&self, type_id: &EntityTypeId) -> String {
        format!("{}{}", type_id, self.suffix)
    }

    /// Current version token, created on first use.
    pub async fn current_version(&self, type_id: &EntityTypeId) -> L2Result<String> {
        let key = self.version_key(type_id);

        if let Some(bytes) = self.backend.get(key.as_bytes()).await? {
            return token_from_bytes(&key, &bytes);
        }

        let token = next_token();
        if self.backend.set_if_absent(key.as_bytes(), token.as_bytes()).await? {
            debug!(entity_type = %type_id, version = %token, "Initialized namespace version");
            return Ok(token);
        }

        match self.backend.get(key.as_bytes()).await? {
            Some(bytes) => {
                let stored = token_from_bytes(&key, &bytes)?;
                warn!(
                    entity_type = %type_id,
                    ours = %token,
                    stored = %stored,
                    "Lost namespace initialization race, using stored version"
                );
                Ok(stored)
            }
            None => Err(L2Error::cache_write(format!(
                "Failed to initialize namespace version for '{}'",
                type_id
            ))),
        }
    }

    /// Replace the version token, orphaning every hashed key of the type.
    pub async fn bump_version(&self, type_id: &EntityTypeId) -> L2Result<String> {
        let key = self.version_key(type_id);
        let token = next_token();

        if !self.backend.set(key.as_bytes(), token.as_bytes(), None).await? {
            return Err(L2Error::cache_write(format!(
                "Failed to bump namespace version for '{}'",
                type_id
            )));
        }

        info!(entity_type = %type_id, version = %token, "Namespace version bumped");
        Ok(token)
    }
}

fn token_from_bytes(key: &str, bytes: &[u8]) -> L2Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| L2Error::cache_read(format!("Namespace version under '{}' is not UTF-8", key)))
}
