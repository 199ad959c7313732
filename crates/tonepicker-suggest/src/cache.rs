//! Time-bounded cache of rewrite results.
//!
//! Expiry is lazy: a stale entry is reported absent by [`ResultCache::get`]
//! but stays in the map until the next [`ResultCache::sweep`], which runs
//! after every write. Memory growth is therefore bounded by traffic between
//! writes rather than by a background timer.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tonepicker_core::ToneCoordinate;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Number of leading characters of the input text that go into a key.
pub const KEY_PREFIX_CHARS: usize = 100;

/// Derive the cache key for a request.
///
/// Only the first [`KEY_PREFIX_CHARS`] characters of `text` participate, so
/// two long texts sharing that prefix and the same coordinate share a cached
/// result. This trades precision for bounded key size.
pub fn cache_key(text: &str, coordinate: ToneCoordinate) -> String {
    let prefix: String = text.chars().take(KEY_PREFIX_CHARS).collect();
    format!("{}_{}_{}", prefix, coordinate.x(), coordinate.y())
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub result_text: String,
    pub created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

#[derive(Debug)]
pub struct ResultCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let guard = self.entries.lock().await;
        guard
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .cloned()
    }

    /// Insert or overwrite, then drop everything past its TTL.
    pub async fn put(&self, key: String, result_text: String) {
        let mut guard = self.entries.lock().await;
        let entry = CacheEntry {
            key: key.clone(),
            result_text,
            created_at: Instant::now(),
        };
        guard.insert(key, entry);
        Self::sweep_locked(&mut guard, self.ttl);
    }

    pub async fn sweep(&self) {
        let mut guard = self.entries.lock().await;
        Self::sweep_locked(&mut guard, self.ttl);
    }

    fn sweep_locked(entries: &mut HashMap<String, CacheEntry>, ttl: Duration) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(ttl));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = entries.len(), "swept expired cache entries");
        }
    }

    /// Physical entry count, including entries that expired since the last sweep.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
