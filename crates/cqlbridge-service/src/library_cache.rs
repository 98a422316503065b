//! In-memory cache of loaded CQL library sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::error::CqlResult;
use crate::library_source::{LibrarySource, LibrarySourceLoader};

/// Library source cache keyed by library identifier
pub struct LibraryCache {
    /// DashMap for concurrent access from request handlers
    sources: DashMap<String, Arc<LibrarySource>>,

    /// Maximum number of libraries kept in memory
    capacity: usize,

    hits: AtomicU64,
    misses: AtomicU64,
}

impl LibraryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            sources: DashMap::new(),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a library from cache
    pub fn get(&self, id: &str) -> Option<Arc<LibrarySource>> {
        self.sources.get(id).map(|entry| entry.clone())
    }

    /// Store a library in cache
    pub fn put(&self, library: Arc<LibrarySource>) {
        if self.capacity == 0 {
            return;
        }

        // Evict one entry when full (arbitrary victim)
        if self.sources.len() >= self.capacity && !self.sources.contains_key(&library.id) {
            // Collect the key first so the iterator's shard guard is released
            let victim = self.sources.iter().next().map(|e| e.key().clone());
            if let Some(victim) = victim {
                self.sources.remove(&victim);
                tracing::debug!(library = %victim, "Evicted library from cache");
            }
        }

        self.sources.insert(library.id.clone(), library);
    }

    /// Get a library from cache or load it through `loader`
    pub async fn get_or_load(
        &self,
        id: &str,
        loader: &LibrarySourceLoader,
    ) -> CqlResult<Arc<LibrarySource>> {
        if let Some(lib) = self.get(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(library = id, "Library found in cache");
            return Ok(lib);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let library = Arc::new(loader.load(id).await?);
        self.put(library.clone());
        Ok(library)
    }

    /// Clear all cached libraries
    pub fn clear(&self) {
        self.sources.clear();
        tracing::info!("Cleared library cache");
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.sources.len(),
            capacity: self.capacity,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}
