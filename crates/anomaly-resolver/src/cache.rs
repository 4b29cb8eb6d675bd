//! In-memory LRU cache for resolved anomaly fields.
//!
//! Keyed by the (rounded) target time and the quantized bounding box. Each
//! entry remembers the window of targets that resolve to its time step, and a
//! lookup only hits when the exact target falls inside that window. A hit
//! therefore returns what resolving would have returned. The cache is owned
//! by the caller; the resolver never consults it.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lru::LruCache;
use sst_common::{BboxKey, BoundingBox, GriddedAnomalyField, StepWindow};
use tokio::sync::RwLock;

/// Cache key: target time plus optional quantized bbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub time: DateTime<Utc>,
    pub bbox: Option<BboxKey>,
}

impl CacheKey {
    pub fn new(time: DateTime<Utc>, bbox: Option<&BoundingBox>) -> Self {
        Self {
            time,
            bbox: bbox.map(BoundingBox::cache_key),
        }
    }
}

/// Statistics for the field cache
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FieldCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl FieldCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

#[derive(Debug)]
struct CachedField {
    field: Arc<GriddedAnomalyField>,
    window: StepWindow,
}

/// Bounded LRU cache of resolved fields.
///
/// Entries are immutable `Arc`s, so a hit hands out a shared reference
/// without copying the grid.
pub struct FieldCache {
    cache: RwLock<LruCache<CacheKey, CachedField>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FieldCache {
    /// Create a cache holding at most `capacity` fields (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: RwLock::new(LruCache::new(size)),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up the field for `target` under `key`, promoting it on a hit.
    ///
    /// An entry whose time step `target` would not resolve to is a miss.
    pub async fn get(
        &self,
        key: &CacheKey,
        target: DateTime<Utc>,
    ) -> Option<Arc<GriddedAnomalyField>> {
        let mut cache = self.cache.write().await;
        match cache.get(key) {
            Some(entry) if entry.window.contains(target) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.field))
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert a field, evicting the least recently used entry when full.
    ///
    /// An existing entry under the same key is replaced.
    pub async fn insert(&self, key: CacheKey, field: Arc<GriddedAnomalyField>, window: StepWindow) {
        let mut cache = self.cache.write().await;
        if let Some((evicted, _)) = cache.push(key, CachedField { field, window }) {
            // push also returns the old value when the key was already present
            if evicted != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Check for a key without touching LRU order or stats.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.cache.read().await.contains(key)
    }

    pub async fn stats(&self) -> FieldCacheStats {
        FieldCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.cache.read().await.len(),
        }
    }

    /// Drop all entries and reset statistics.
    pub async fn clear(&self) {
        self.cache.write().await.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}
