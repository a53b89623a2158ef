//! Key/value caches shared between pipeline stages
//!
//! [`CacheStore`] holds the upload currently being onboarded and the downstream
//! read caches (row previews). Entries live until they are overwritten or the
//! whole store is cleared; there is no eviction policy.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

/// Errors that can occur when reading a cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// No entry for the requested key
    #[error("No cache entry for key: {0}")]
    NotFound(String),
}

/// A cache that can be emptied without knowing its key or value types
///
/// The import executor holds a list of these and clears them whenever an import
/// changes what they were read from.
pub trait CacheInvalidation: Send + Sync {
    /// Remove every entry
    fn clear_all(&self);

    /// Name used in log output
    fn name(&self) -> &str;
}

/// Thread-safe key/value store with explicit clearing
#[derive(Debug)]
pub struct CacheStore<K, V> {
    name: String,
    entries: RwLock<HashMap<K, V>>,
    /// Bumped by every `clear_all`, under the write lock
    generation: AtomicU64,
}

impl<K, V> CacheStore<K, V>
where
    K: Eq + Hash + std::fmt::Display,
    V: Clone,
{
    /// Create an empty cache
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Insert or overwrite the entry for `key`
    pub fn put(&self, key: K, value: V) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Get a copy of the entry for `key`
    pub fn get(&self, key: &K) -> Result<V, CacheError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }

    /// Number of times the store has been cleared
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Insert `value` unless the store was cleared after `generation` was read
    ///
    /// Lets a reader cache a value it loaded elsewhere without resurrecting data a
    /// concurrent clear was meant to drop. Returns whether the value was stored.
    pub fn put_if_generation(&self, key: K, value: V, generation: u64) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        entries.insert(key, value);
        true
    }

    /// Remove the entry for `key`, returning it if present
    pub fn remove(&self, key: &K) -> Option<V> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Clear the store and insert a single entry under one write lock
    pub fn replace_all(&self, key: K, value: V) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        entries.insert(key, value);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> CacheInvalidation for CacheStore<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Send + Sync,
{
    fn clear_all(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.len();
        entries.clear();
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(cache = %self.name, removed, "Cleared cache");
    }

    fn name(&self) -> &str {
        &self.name
    }
}
