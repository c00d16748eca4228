//! Cache layer for folio.
//!
//! Storage is split in two levels:
//!
//! - [`Cache`] / [`CacheBucket`]: named key-value partitions with etag checks,
//!   implemented by [`NullCache`], [`MemoryCache`] and [`FileCache`]
//! - [`RenderCache`]: the two-tier cache for rendered HTML, keyed by content
//!   identity and active language
//!
//! # Example
//!
//! ```
//! use folio_cache::{MemoryCache, RenderCache};
//!
//! let cache = RenderCache::new(&MemoryCache::new());
//! cache.set("Portfolio", "pt", "<p>olá</p>");
//! assert_eq!(cache.get("portfolio", "pt").as_deref(), Some("<p>olá</p>"));
//! assert_eq!(cache.get("portfolio", "en"), None);
//! ```

mod ext;
mod file;
mod memory;
mod render;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;
pub use render::{RenderCache, cache_key};

/// A named partition within a [`Cache`].
///
/// Each bucket stores key-value pairs where values are invalidated by an etag.
/// A cache hit occurs only when both the key and etag match.
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// Returns `None` on cache miss or etag mismatch. An empty `etag` skips
    /// validation and returns whatever is stored under `key`.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, overwriting any existing entry for the same key.
    fn set(&self, key: &str, etag: &str, value: &[u8]);

    /// Remove a single entry. Missing keys are ignored.
    fn remove(&self, key: &str);

    /// Remove every entry in the bucket.
    fn clear(&self);
}

/// Factory for named cache [`CacheBucket`]s.
///
/// Buckets produced by one `Cache` are isolated from each other.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket (e.g. "pages", "diagrams").
    ///
    /// Calling `bucket` twice with the same name returns handles that share
    /// the same underlying storage.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// No-op [`CacheBucket`] that never stores or retrieves data.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}

    fn remove(&self, _key: &str) {}

    fn clear(&self) {}
}

/// No-op [`Cache`] that always returns [`NullCacheBucket`]s.
///
/// Used when the persistent tier is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let cache = NullCache;
        let bucket = cache.bucket("pages");

        assert_eq!(bucket.get("key", "etag1"), None);

        bucket.set("key", "etag1", b"hello");
        assert_eq!(bucket.get("key", "etag1"), None);
    }

    #[test]
    fn test_null_cache_remove_and_clear_are_noops() {
        let bucket = NullCache.bucket("diagrams");
        bucket.remove("missing");
        bucket.clear();
        assert_eq!(bucket.get("missing", ""), None);
    }
}
