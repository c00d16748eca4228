//! Two-tier cache for rendered HTML.
//!
//! Lookups go to the in-memory tier first and fall back to a persistent
//! [`CacheBucket`]. A persistent hit is copied into memory so the next lookup
//! for the same key stays in process. Entries never expire; they disappear only
//! through [`RenderCache::remove`], [`RenderCache::clear_memory`] or
//! [`RenderCache::clear`].

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{Cache, CacheBucket, CacheBucketExt};

/// Bucket name used for rendered pages in the persistent tier.
const PAGES_BUCKET: &str = "pages";

/// Build the cache key for a piece of content in a given language.
///
/// Content ids are compared case-insensitively: `"Portfolio"` and
/// `"portfolio"` share an entry, while each language gets its own.
#[must_use]
pub fn cache_key(content_id: &str, lang: &str) -> String {
    format!("{}__{lang}", content_id.to_lowercase())
}

/// Memory + persistent cache of rendered HTML.
pub struct RenderCache {
    memory: RwLock<HashMap<String, String>>,
    persistent: Box<dyn CacheBucket>,
}

impl RenderCache {
    /// Create a cache whose persistent tier is the `pages` bucket of `cache`.
    #[must_use]
    pub fn new(cache: &dyn Cache) -> Self {
        Self {
            memory: RwLock::new(HashMap::new()),
            persistent: cache.bucket(PAGES_BUCKET),
        }
    }

    /// Look up rendered HTML for `content_id` in `lang`.
    pub fn get(&self, content_id: &str, lang: &str) -> Option<String> {
        let key = cache_key(content_id, lang);

        if let Some(html) = self.memory.read().unwrap().get(&key) {
            tracing::debug!(key = %key, "Memory cache hit");
            return Some(html.clone());
        }

        let html = self.persistent.get_string(&key, "")?;
        tracing::debug!(key = %key, "Persistent cache hit, promoting to memory");
        self.memory.write().unwrap().insert(key, html.clone());
        Some(html)
    }

    /// Store rendered HTML in both tiers.
    pub fn set(&self, content_id: &str, lang: &str, html: &str) {
        let key = cache_key(content_id, lang);
        self.persistent.set_string(&key, "", html);
        self.memory.write().unwrap().insert(key, html.to_owned());
    }

    #[cfg(test)]
    fn contains_in_memory(&self, content_id: &str, lang: &str) -> bool {
        self.memory
            .read()
            .unwrap()
            .contains_key(&cache_key(content_id, lang))
    }

    /// Drop one entry from both tiers.
    pub fn remove(&self, content_id: &str, lang: &str) {
        let key = cache_key(content_id, lang);
        self.memory.write().unwrap().remove(&key);
        self.persistent.remove(&key);
    }

    /// Drop every in-memory entry; the persistent tier is kept.
    pub fn clear_memory(&self) {
        let mut memory = self.memory.write().unwrap();
        tracing::debug!(entries = memory.len(), "Clearing memory cache");
        memory.clear();
    }

    /// Drop every entry from both tiers.
    pub fn clear(&self) {
        self.clear_memory();
        self.persistent.clear();
        tracing::info!("Render cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{FileCache, MemoryCache, NullCache};

    #[test]
    fn test_cache_key_lowercases_content_id() {
        assert_eq!(cache_key("Portfolio-App", "pt"), "portfolio-app__pt");
        assert_eq!(cache_key("a", "EN"), "a__EN");
    }

    #[test]
    fn test_set_then_get() {
        let cache = RenderCache::new(&NullCache);
        cache.set("alpha", "pt", "<p>a</p>");
        assert_eq!(cache.get("alpha", "pt").as_deref(), Some("<p>a</p>"));
    }

    #[test]
    fn test_language_isolation() {
        let cache = RenderCache::new(&NullCache);
        cache.set("alpha", "en", "<p>hello</p>");
        assert_eq!(cache.get("alpha", "pt"), None);
        assert_eq!(cache.get("ALPHA", "en").as_deref(), Some("<p>hello</p>"));
    }

    #[test]
    fn test_persistent_hit_is_promoted_to_memory() {
        let store = MemoryCache::new();
        store.bucket("pages").set_string("alpha__pt", "", "<p>stored</p>");

        let cache = RenderCache::new(&store);
        assert!(!cache.contains_in_memory("alpha", "pt"));

        assert_eq!(cache.get("alpha", "pt").as_deref(), Some("<p>stored</p>"));
        assert!(cache.contains_in_memory("alpha", "pt"));
    }

    #[test]
    fn test_clear_memory_keeps_persistent_tier() {
        let store = MemoryCache::new();
        let cache = RenderCache::new(&store);
        cache.set("alpha", "pt", "<p>a</p>");

        cache.clear_memory();

        assert!(!cache.contains_in_memory("alpha", "pt"));
        assert_eq!(cache.get("alpha", "pt").as_deref(), Some("<p>a</p>"));
    }

    #[test]
    fn test_clear_drops_both_tiers() {
        let store = MemoryCache::new();
        let cache = RenderCache::new(&store);
        cache.set("alpha", "pt", "<p>a</p>");

        cache.clear();

        assert_eq!(cache.get("alpha", "pt"), None);
        assert_eq!(store.bucket("pages").get("alpha__pt", ""), None);
    }

    #[test]
    fn test_remove_single_entry() {
        let cache = RenderCache::new(&MemoryCache::new());
        cache.set("alpha", "pt", "a");
        cache.set("beta", "pt", "b");

        cache.remove("Alpha", "pt");

        assert_eq!(cache.get("alpha", "pt"), None);
        assert_eq!(cache.get("beta", "pt").as_deref(), Some("b"));
    }

    #[test]
    fn test_survives_restart_with_file_tier() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("cache");

        RenderCache::new(&FileCache::new(root.clone(), "1")).set("alpha", "pt", "<h1>A</h1>");

        let reopened = RenderCache::new(&FileCache::new(root, "1"));
        assert_eq!(reopened.get("alpha", "pt").as_deref(), Some("<h1>A</h1>"));
    }
}
