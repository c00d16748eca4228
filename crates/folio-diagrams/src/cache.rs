//! Diagram cache key computation.

use sha2::{Digest, Sha256};

/// Parameters that affect compiled output, hashed into a cache key.
///
/// The diagram id is deliberately absent: it is bound into the SVG after the
/// lookup, so one cached entry serves every id with the same source.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    pub source: &'a str,
    /// Kroki endpoint (e.g. "mermaid").
    pub endpoint: &'a str,
    /// Output format ("svg").
    pub format: &'a str,
}

impl DiagramKey<'_> {
    /// Hex SHA-256 of `"{endpoint}:{format}:{source}"`.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}:{}", self.endpoint, self.format, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(source: &str) -> DiagramKey<'_> {
        DiagramKey {
            source,
            endpoint: "mermaid",
            format: "svg",
        }
    }

    #[test]
    fn test_same_source_same_hash() {
        assert_eq!(
            key("graph TD; A-->B;").compute_hash(),
            key("graph TD; A-->B;").compute_hash()
        );
        assert_ne!(
            key("graph TD; A-->B;").compute_hash(),
            key("graph TD; B-->A;").compute_hash()
        );
    }

    #[test]
    fn test_format_matters() {
        let svg = key("graph");
        let png = DiagramKey {
            format: "png",
            ..svg
        };
        assert_ne!(svg.compute_hash(), png.compute_hash());
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let hash = key("x").compute_hash();
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
