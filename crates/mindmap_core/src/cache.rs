//! Bounded cache of normalized documents keyed by file fingerprint.
//!
//! # Responsibility
//! - Skip archive I/O for files that have not changed since their last load.
//! - Bound memory by evicting the oldest insertion at capacity.
//!
//! # Invariants
//! - Eviction order is insertion age only; hits never refresh an entry.
//! - Capacity check, eviction and insertion run under one lock acquisition.
//! - A changed file produces a new fingerprint; stale entries are left to
//!   age out.

use crate::model::document::Document;
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Default number of cached documents.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Identity of one file version: path, modification time and size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    path: PathBuf,
    modified: Option<SystemTime>,
    size: u64,
}

impl Fingerprint {
    pub fn new(path: impl Into<PathBuf>, modified: Option<SystemTime>, size: u64) -> Self {
        Self {
            path: path.into(),
            modified,
            size,
        }
    }

    /// Reads the fingerprint of `path` from filesystem metadata.
    ///
    /// Platforms without modification times fall back to path and size.
    pub fn of(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(path, metadata.modified().ok(), metadata.len()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// One cached document.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub document: Arc<Document>,
    pub inserted_at: SystemTime,
    /// Monotonic insertion order; the smallest value is evicted first.
    sequence: u64,
}

/// Counters describing cache behavior since construction or `clear`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Fingerprint, CacheEntry>,
    next_sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// Thread-safe fingerprint-to-document cache.
///
/// Share one instance (`Arc<DocumentCache>`) between loaders to get
/// process-wide caching; construct a fresh one for isolation.
#[derive(Debug)]
pub struct DocumentCache {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Default for DocumentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl DocumentCache {
    /// Creates an empty cache. Capacity `0` disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the cached document for an exact fingerprint match.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Document>> {
        let mut state = self.state.lock();
        let document = state
            .entries
            .get(fingerprint)
            .map(|entry| Arc::clone(&entry.document));
        if document.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        document
    }

    /// Inserts or replaces the document for `fingerprint`.
    ///
    /// A new fingerprint inserted into a full cache evicts exactly one entry,
    /// the oldest insertion. Replacing an existing fingerprint evicts nothing.
    pub fn insert(&self, fingerprint: Fingerprint, document: Arc<Document>) {
        if self.capacity == 0 {
            return;
        }

        let mut state = self.state.lock();
        if !state.entries.contains_key(&fingerprint) && state.entries.len() >= self.capacity {
            let oldest = state
                .entries
                .values()
                .min_by_key(|entry| entry.sequence)
                .map(|entry| entry.fingerprint.clone());
            if let Some(oldest) = oldest {
                state.entries.remove(&oldest);
                state.evictions += 1;
                debug!(
                    "event=cache_evict module=cache status=ok path={} size={}",
                    oldest.path().display(),
                    oldest.size()
                );
            }
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.insert(
            fingerprint.clone(),
            CacheEntry {
                fingerprint,
                document,
                inserted_at: SystemTime::now(),
                sequence,
            },
        );
    }

    /// Checks presence without touching hit/miss counters.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.state.lock().entries.contains_key(fingerprint)
    }

    /// Returns a copy of the entry for `fingerprint`, if cached.
    pub fn entry(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        self.state.lock().entries.get(fingerprint).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
        }
    }

    /// Drops every entry and resets counters.
    pub fn clear(&self) {
        *self.state.lock() = CacheState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentCache, Fingerprint};
    use crate::model::document::Document;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, SystemTime};

    fn fingerprint(index: u64) -> Fingerprint {
        Fingerprint::new(
            format!("/docs/{index}.xmind"),
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(index)),
            index,
        )
    }

    fn document() -> Arc<Document> {
        Arc::new(Document::default())
    }

    #[test]
    fn hit_requires_exact_fingerprint() {
        let cache = DocumentCache::new(4);
        let original = fingerprint(1);
        cache.insert(original.clone(), document());

        let touched = Fingerprint::new(
            original.path(),
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(99)),
            original.size(),
        );
        let resized = Fingerprint::new(original.path(), original.modified(), 1234);

        assert!(cache.get(&original).is_some());
        assert!(cache.get(&touched).is_none());
        assert!(cache.get(&resized).is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn evicts_oldest_insertion_even_after_access() {
        let cache = DocumentCache::new(3);
        for index in 0..3 {
            cache.insert(fingerprint(index), document());
        }
        assert!(cache.get(&fingerprint(0)).is_some());

        cache.insert(fingerprint(3), document());

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&fingerprint(0)));
        for index in 1..4 {
            assert!(cache.contains(&fingerprint(index)));
        }
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn replacing_existing_fingerprint_does_not_evict() {
        let cache = DocumentCache::new(2);
        cache.insert(fingerprint(0), document());
        cache.insert(fingerprint(1), document());

        let replacement = document();
        cache.insert(fingerprint(1), Arc::clone(&replacement));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&fingerprint(0)));
        assert!(Arc::ptr_eq(&cache.get(&fingerprint(1)).unwrap(), &replacement));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn entry_records_insertion_time_and_order() {
        let cache = DocumentCache::new(4);
        let before = SystemTime::now();
        cache.insert(fingerprint(0), document());
        cache.insert(fingerprint(1), document());
        let after = SystemTime::now();

        let first = cache.entry(&fingerprint(0)).unwrap();
        let second = cache.entry(&fingerprint(1)).unwrap();

        assert_eq!(first.fingerprint, fingerprint(0));
        assert!(first.inserted_at >= before && second.inserted_at <= after);
        assert!(first.inserted_at <= second.inserted_at);
        assert!(first.sequence < second.sequence);
        assert!(cache.entry(&fingerprint(2)).is_none());
        assert_eq!(cache.stats().hits + cache.stats().misses, 0);
    }

    #[test]
    fn zero_capacity_disables_caching() {
        let cache = DocumentCache::new(0);
        cache.insert(fingerprint(0), document());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_resets_entries_and_counters() {
        let cache = DocumentCache::new(2);
        cache.insert(fingerprint(0), document());
        let _ = cache.get(&fingerprint(0));

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn concurrent_inserts_respect_capacity() {
        let cache = Arc::new(DocumentCache::new(8));
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for index in 0..50 {
                        cache.insert(fingerprint(worker * 1000 + index), document());
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.entries, 8);
        assert_eq!(stats.evictions, 200 - 8);
    }
}
