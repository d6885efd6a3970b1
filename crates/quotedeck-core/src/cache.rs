//! Kind-namespaced TTL cache for upstream payloads.
//!
//! One store fronts every data kind the dashboard reads; expiry policy lives
//! here and nowhere else. Entries expire lazily: an aged entry reads as a
//! miss and is overwritten on the next refresh, never proactively purged.
//! Backend failures are swallowed and reported as misses, since caching is
//! an optimization rather than a correctness requirement.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::domain::UtcDateTime;

/// Data kinds with distinct lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    Profile,
    Quote,
    Chart,
    News,
}

impl CacheKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Quote => "quote",
            Self::Chart => "chart",
            Self::News => "news",
        }
    }

    /// Fixed per-kind TTL. Profiles barely change; quotes go stale in
    /// minutes.
    pub const fn ttl(self) -> Duration {
        match self {
            Self::Profile => Duration::from_secs(48 * 60 * 60),
            Self::Quote => Duration::from_secs(5 * 60),
            Self::Chart => Duration::from_secs(60 * 60),
            Self::News => Duration::from_secs(30 * 60),
        }
    }
}

/// Stored value plus its write time (unix seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub stored_at: i64,
    pub payload: String,
}

/// Backend-level storage failure. Never escapes [`CacheStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache storage unavailable: {0}")]
    Unavailable(String),
    #[error("cache storage quota exceeded")]
    QuotaExceeded,
}

/// Raw key/value storage behind the cache.
///
/// The seam exists so a persistent browser-style store can replace the
/// in-memory default, and so tests can inject failing storage.
pub trait CacheBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError>;
    fn store(&self, key: &str, entry: StoredEntry) -> Result<(), CacheError>;
}

/// Default process-local backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: RwLock<HashMap<String, StoredEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<StoredEntry>, CacheError> {
        let map = self
            .map
            .read()
            .map_err(|_| CacheError::Unavailable(String::from("poisoned cache lock")))?;
        Ok(map.get(key).cloned())
    }

    fn store(&self, key: &str, entry: StoredEntry) -> Result<(), CacheError> {
        let mut map = self
            .map
            .write()
            .map_err(|_| CacheError::Unavailable(String::from("poisoned cache lock")))?;
        map.insert(key.to_owned(), entry);
        Ok(())
    }
}

/// Kind-aware TTL cache. `Clone` handles share one backend.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new()))
    }

    pub fn with_backend(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Returns the payload if a fresh entry exists. Expired or unreadable
    /// entries read as misses.
    pub fn get(&self, kind: CacheKind, key: &str) -> Option<String> {
        let cache_key = cache_key(kind, key);
        let entry = match self.backend.load(&cache_key) {
            Ok(found) => found?,
            Err(err) => {
                tracing::debug!(key = %cache_key, %err, "cache read failed, treating as miss");
                return None;
            }
        };

        let age = UtcDateTime::now().unix_timestamp() - entry.stored_at;
        if age < 0 || age as u64 > kind.ttl().as_secs() {
            return None;
        }

        Some(entry.payload)
    }

    /// Stores a payload, stamping it with the current time. Failures are
    /// no-ops.
    pub fn put(&self, kind: CacheKind, key: &str, payload: String) {
        let cache_key = cache_key(kind, key);
        let entry = StoredEntry {
            stored_at: UtcDateTime::now().unix_timestamp(),
            payload,
        };
        if let Err(err) = self.backend.store(&cache_key, entry) {
            tracing::debug!(key = %cache_key, %err, "cache write failed, skipping");
        }
    }
}

fn cache_key(kind: CacheKind, key: &str) -> String {
    format!("{}_{}", kind.as_str(), key)
}
