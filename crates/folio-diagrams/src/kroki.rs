//! Mermaid compilation through a Kroki server.
//!
//! Each diagram is sent as a plain-text `POST {server}/mermaid/svg`. Kroki
//! answers 4xx for sources it cannot parse, which surface as syntax errors;
//! everything else that goes wrong is an HTTP error.

use std::time::Duration;

use folio_cache::{Cache, CacheBucket, CacheBucketExt, NullCacheBucket};
use ureq::Agent;

use crate::cache::DiagramKey;
use crate::consts::DEFAULT_TIMEOUT;
use crate::engine::{DiagramEngine, DiagramError, DiagramErrorKind};
use crate::svg::{bind_svg_id, strip_google_fonts_import};

const ENDPOINT: &str = "mermaid";
const FORMAT: &str = "svg";

/// Create an HTTP agent with the given global timeout.
///
/// Non-2xx statuses are returned as responses rather than errors so their
/// bodies can be reported.
fn create_agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

/// [`DiagramEngine`] backed by Kroki.
///
/// Compiled SVG is cached by content hash. The cache holds engine output
/// before id binding, so renaming a diagram never invalidates it.
pub struct KrokiEngine {
    agent: Agent,
    server_url: String,
    cache: Box<dyn CacheBucket>,
}

impl KrokiEngine {
    /// Engine for the Kroki server at `server_url` (e.g. `https://kroki.io`).
    pub fn new(server_url: &str) -> Self {
        Self {
            agent: create_agent(DEFAULT_TIMEOUT),
            server_url: server_url.trim_end_matches('/').to_owned(),
            cache: Box::new(NullCacheBucket),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = create_agent(timeout);
        self
    }

    /// Cache compiled diagrams in the `diagrams` bucket of `cache`.
    #[must_use]
    pub fn with_cache(mut self, cache: &dyn Cache) -> Self {
        self.cache = cache.bucket("diagrams");
        self
    }

    fn send(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        let url = format!("{}/{ENDPOINT}/{FORMAT}", self.server_url);

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "text/plain")
            .send(source.as_bytes())
            .map_err(|e| DiagramError::new(id, DiagramErrorKind::Http(e.to_string())))?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| String::from("(unable to read error body)"));
            let message = format!("HTTP {status}: {}", error_body.trim());
            let kind = if status < 500 {
                DiagramErrorKind::Syntax(message)
            } else {
                DiagramErrorKind::Http(message)
            };
            return Err(DiagramError::new(id, kind));
        }

        let svg = body
            .read_to_string()
            .map_err(|e| DiagramError::new(id, DiagramErrorKind::InvalidOutput(e.to_string())))?;
        if !svg.contains("<svg") {
            return Err(DiagramError::new(
                id,
                DiagramErrorKind::InvalidOutput("response contains no <svg> element".to_owned()),
            ));
        }
        Ok(strip_google_fonts_import(svg.trim()))
    }
}

impl DiagramEngine for KrokiEngine {
    fn compile(&self, id: &str, source: &str) -> Result<String, DiagramError> {
        let hash = DiagramKey {
            source,
            endpoint: ENDPOINT,
            format: FORMAT,
        }
        .compute_hash();

        let svg = if let Some(svg) = self.cache.get_string(&hash, FORMAT) {
            tracing::debug!(id, "Diagram cache hit");
            svg
        } else {
            let svg = self.send(id, source)?;
            self.cache.set_string(&hash, FORMAT, &svg);
            svg
        };

        Ok(bind_svg_id(&svg, id))
    }
}

#[cfg(test)]
mod tests {
    use folio_cache::MemoryCache;

    use super::*;

    /// Nothing listens on the discard port, so requests fail fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    #[test]
    fn test_cached_diagram_skips_network() {
        let cache = MemoryCache::new();
        let source = "graph TD; A-->B;";
        let hash = DiagramKey {
            source,
            endpoint: ENDPOINT,
            format: FORMAT,
        }
        .compute_hash();
        cache
            .bucket("diagrams")
            .set_string(&hash, FORMAT, r#"<svg id="my-svg"><g/></svg>"#);

        let engine = KrokiEngine::new(UNREACHABLE).with_cache(&cache);
        let svg = engine.compile("demo-flow", source).unwrap();

        assert_eq!(svg, r#"<svg id="m_demo-flow"><g/></svg>"#);
    }

    #[test]
    fn test_unreachable_server_is_http_error() {
        let engine = KrokiEngine::new(UNREACHABLE).with_timeout(Duration::from_secs(2));
        let err = engine.compile("demo-flow", "graph TD").unwrap_err();

        assert_eq!(err.id, "demo-flow");
        assert!(matches!(err.kind, DiagramErrorKind::Http(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let engine = KrokiEngine::new("https://kroki.io/");
        assert_eq!(engine.server_url, "https://kroki.io");
    }
}
