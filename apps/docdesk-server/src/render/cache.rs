//! Rendered page cache with LRU eviction
//!
//! Keys are content digests, not document ids, so a page is only ever
//! reused for byte-identical content.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use super::RenderedPage;

/// Cache key for a rendered page
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct PageCacheKey {
    /// Hex SHA-256 of the decoded document bytes
    pub digest: String,
    /// 1-indexed page number
    pub page: usize,
}

impl PageCacheKey {
    pub fn new(digest: &str, page: usize) -> Self {
        Self {
            digest: digest.to_string(),
            page,
        }
    }
}

/// Shared LRU cache of rendered pages
#[derive(Clone)]
pub struct PageCache {
    entries: Arc<Mutex<LruCache<PageCacheKey, Arc<RenderedPage>>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
}

impl PageCache {
    /// Create a cache; a zero capacity falls back to 256 entries
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(256).unwrap());
        Self {
            entries: Arc::new(Mutex::new(LruCache::new(capacity))),
            hits: Arc::new(AtomicUsize::new(0)),
            misses: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn get(&self, key: &PageCacheKey) -> Option<Arc<RenderedPage>> {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn put(&self, key: PageCacheKey, page: Arc<RenderedPage>) {
        self.entries.lock().put(key, page);
    }

    /// Drop every page rendered from `digest`
    pub fn remove_document(&self, digest: &str) -> usize {
        let mut entries = self.entries.lock();
        let keys: Vec<PageCacheKey> = entries
            .iter()
            .filter(|(k, _)| k.digest == digest)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            entries.pop(key);
        }
        keys.len()
    }

    pub fn stats(&self) -> PageCacheStats {
        let entries = self.entries.lock();
        PageCacheStats {
            used: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCacheStats {
    pub used: usize,
    pub capacity: usize,
    pub hits: usize,
    pub misses: usize,
}
