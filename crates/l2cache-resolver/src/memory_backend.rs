//! Process-local implementation of [`CacheBackend`].
//!
//! Useful for tests and for running the persistence layer without Redis.
//! Entries expire lazily: an expired entry is dropped the next time it is
//! read, listed or overwritten.

use crate::CacheBackend;
use async_trait::async_trait;
use glob::Pattern;
use l2cache_core::{L2Error, L2Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    ttl_seconds: Option<u64>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-memory cache backend.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: Mutex<HashMap<Vec<u8>, Entry>>,
    clock_offset: Mutex<Duration>,
    refuse_writes: AtomicBool,
    refuse_deletes: AtomicBool,
}

impl InMemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` report failure.
    pub fn refuse_writes(&self, refuse: bool) {
        self.refuse_writes.store(refuse, Ordering::SeqCst);
    }

    /// Make every subsequent `delete` report failure.
    pub fn refuse_deletes(&self, refuse: bool) {
        self.refuse_deletes.store(refuse, Ordering::SeqCst);
    }

    /// Move this backend's clock forward, expiring entries whose TTL elapses.
    pub fn advance(&self, by: Duration) {
        *self.clock_offset.lock() += by;
    }

    /// TTL the live entry under `key` was written with.
    ///
    /// `None` if the key is absent, `Some(None)` if it never expires.
    #[must_use]
    pub fn ttl_of(&self, key: &str) -> Option<Option<u64>> {
        let now = self.now();
        self.entries
            .lock()
            .get(key.as_bytes())
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.ttl_seconds)
    }

    /// Whether `key` holds a live entry.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.ttl_of(key).is_some()
    }

    /// Number of stored entries, expired ones included until they are touched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn now(&self) -> Instant {
        Instant::now() + *self.clock_offset.lock()
    }

    fn entry(&self, value: &[u8], ttl_seconds: Option<u64>) -> Entry {
        Entry {
            value: value.to_vec(),
            ttl_seconds,
            // A deadline past the clock's range never arrives.
            expires_at: ttl_seconds.and_then(|secs| self.now().checked_add(Duration::from_secs(secs))),
        }
    }
}

fn live_value(entries: &mut HashMap<Vec<u8>, Entry>, key: &[u8], now: Instant) -> Option<Vec<u8>> {
    match entries.get(key) {
        Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
        Some(_) => {
            entries.remove(key);
            None
        }
        None => None,
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &[u8]) -> L2Result<Option<Vec<u8>>> {
        let now = self.now();
        let mut entries = self.entries.lock();
        Ok(live_value(&mut entries, key, now))
    }

    async fn set(&self, key: &[u8], value: &[u8], ttl_seconds: Option<u64>) -> L2Result<bool> {
        if self.refuse_writes.load(Ordering::SeqCst) {
            debug!(key = %String::from_utf8_lossy(key), "Refusing write");
            return Ok(false);
        }

        let entry = self.entry(value, ttl_seconds);
        self.entries.lock().insert(key.to_vec(), entry);
        Ok(true)
    }

    async fn delete(&self, key: &[u8]) -> L2Result<bool> {
        if self.refuse_deletes.load(Ordering::SeqCst) {
            debug!(key = %String::from_utf8_lossy(key), "Refusing delete");
            return Ok(false);
        }

        self.entries.lock().remove(key);
        Ok(true)
    }

    async fn keys(&self, pattern: &str) -> L2Result<Vec<String>> {
        let matcher =
            Pattern::new(pattern).map_err(|e| L2Error::InvalidPattern(format!("{}: {}", pattern, e)))?;

        let now = self.now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.is_live(now));

        let mut matched: Vec<String> = entries
            .keys()
            .filter_map(|key| std::str::from_utf8(key).ok())
            .filter(|key| matcher.matches(key))
            .map(str::to_string)
            .collect();
        matched.sort();

        Ok(matched)
    }

    async fn mget(&self, keys: &[Vec<u8>]) -> L2Result<Vec<Option<Vec<u8>>>> {
        let now = self.now();
        let mut entries = self.entries.lock();
        Ok(keys
            .iter()
            .map(|key| live_value(&mut entries, key, now))
            .collect())
    }

    async fn set_if_absent(&self, key: &[u8], value: &[u8]) -> L2Result<bool> {
        if self.refuse_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let now = self.now();
        let entry = self.entry(value, None);
        let mut entries = self.entries.lock();
        if live_value(&mut entries, key, now).is_some() {
            return Ok(false);
        }
        entries.insert(key.to_vec(), entry);
        Ok(true)
    }
}
