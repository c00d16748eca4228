//! String helpers on top of [`CacheBucket`].

use crate::CacheBucket;

/// UTF-8 convenience methods for [`CacheBucket`].
///
/// Every bucket gets these through the blanket impl.
pub trait CacheBucketExt: CacheBucket {
    /// Retrieve a cached UTF-8 string. Invalid UTF-8 counts as a miss.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        let bytes = self.get(key, etag)?;
        String::from_utf8(bytes).ok()
    }

    /// Store a string value.
    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cache, MemoryCache};

    #[test]
    fn test_string_roundtrip_checks_etag() {
        let bucket = MemoryCache::new().bucket("pages");
        bucket.set_string("alpha__pt", "v1", "<p>olá</p>");

        assert_eq!(bucket.get_string("alpha__pt", "v1").as_deref(), Some("<p>olá</p>"));
        assert_eq!(bucket.get_string("alpha__pt", "v2"), None);
    }

    #[test]
    fn test_get_string_rejects_invalid_utf8() {
        let bucket = MemoryCache::new().bucket("pages");
        bucket.set("bad", "", &[0xFF, 0xFE]);
        assert_eq!(bucket.get_string("bad", ""), None);
    }
}
