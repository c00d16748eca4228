//! In-process cache backed by hash maps.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::{Cache, CacheBucket};

type Entries = Arc<RwLock<HashMap<String, (String, Vec<u8>)>>>;

/// [`Cache`] that keeps every bucket in memory.
///
/// Handles returned for the same bucket name share storage, so a value set
/// through one handle is visible through every other. Nothing survives the
/// process; useful as the persistent tier in tests and for one-shot runs.
#[derive(Default)]
pub struct MemoryCache {
    buckets: Mutex<HashMap<String, Entries>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        let mut buckets = self.buckets.lock().unwrap();
        let entries = buckets.entry(name.to_owned()).or_default();
        Box::new(MemoryCacheBucket {
            entries: Arc::clone(entries),
        })
    }
}

struct MemoryCacheBucket {
    entries: Entries,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().unwrap();
        let (stored_etag, data) = entries.get(key)?;
        (etag.is_empty() || stored_etag == etag).then(|| data.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_owned(), (etag.to_owned(), value.to_vec()));
    }

    fn remove(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    fn clear(&self) {
        self.entries.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_share_storage() {
        let cache = MemoryCache::new();
        let first = cache.bucket("pages");
        let second = cache.bucket("pages");

        first.set("key", "", b"shared");
        assert_eq!(second.get("key", ""), Some(b"shared".to_vec()));
    }

    #[test]
    fn test_buckets_are_isolated() {
        let cache = MemoryCache::new();
        let pages = cache.bucket("pages");
        let diagrams = cache.bucket("diagrams");

        pages.set("key", "", b"page");
        assert_eq!(diagrams.get("key", ""), None);

        diagrams.set("key", "", b"diagram");
        pages.clear();
        assert_eq!(pages.get("key", ""), None);
        assert_eq!(diagrams.get("key", ""), Some(b"diagram".to_vec()));
    }

    #[test]
    fn test_etag_validation() {
        let bucket = MemoryCache::new().bucket("diagrams");
        bucket.set("hash", "svg", b"<svg/>");

        assert_eq!(bucket.get("hash", "svg"), Some(b"<svg/>".to_vec()));
        assert_eq!(bucket.get("hash", "png"), None);

        bucket.remove("hash");
        assert_eq!(bucket.get("hash", ""), None);
    }
}
