//! # Embedding Cache — Content-Addressed Vector Memoization
//!
//! Maps a [`TextDigest`] to the vector its text produced. Keys include the
//! model id, so the cache can be shared by every session in a process
//! without one session ever reading a vector computed for different input.
//!
//! ## Invariants
//!
//! - Entries are immutable once inserted. A second insert for the same key
//!   keeps the first vector.
//! - There is no eviction and no invalidation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ctrlmap_core::TextDigest;
use parking_lot::RwLock;

/// Thread-safe digest → vector map with hit/miss counters.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    entries: RwLock<HashMap<TextDigest, Arc<Vec<f32>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a vector, counting the hit or miss.
    pub fn get(&self, key: &TextDigest) -> Option<Arc<Vec<f32>>> {
        let found = self.entries.read().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Insert a batch of vectors under one write lock.
    pub fn insert_many(&self, entries: impl IntoIterator<Item = (TextDigest, Arc<Vec<f32>>)>) {
        let mut map = self.entries.write();
        for (key, vector) in entries {
            map.entry(key).or_insert(vector);
        }
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that had to go to a backend.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
