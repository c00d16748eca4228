//! Where raw markdown comes from.
//!
//! [`HttpSource`] asks the content API, [`DirSource`] reads bundled files and
//! [`FallbackSource`] chains them: the first non-empty body wins, and when
//! every source fails the result is an empty string rather than an error.

use std::path::PathBuf;
use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ureq::Agent;

/// Characters left as-is in a path segment (RFC 3986 unreserved).
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Error fetching raw markdown.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Network failure, timeout or unreadable body.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] ureq::Error),
    /// Server answered with an error status.
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },
    /// Local file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Source of raw markdown, addressed by content id.
pub trait ContentSource: Send + Sync {
    /// Fetch the markdown for `id`. An empty string means "no content".
    fn fetch(&self, id: &str) -> Result<String, FetchError>;
}

/// Markdown served by `GET {endpoint}/{id}`.
pub struct HttpSource {
    agent: Agent,
    endpoint: String,
}

impl HttpSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, id: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint,
            utf8_percent_encode(id, SEGMENT_ENCODE_SET)
        )
    }
}

impl ContentSource for HttpSource {
    fn fetch(&self, id: &str) -> Result<String, FetchError> {
        let url = self.url(id);
        tracing::debug!(%url, "Fetching markdown");

        let response = self.agent.get(&url).header("Accept", "text/plain").call()?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let error_body = body
                .read_to_string()
                .unwrap_or_else(|_| "(unable to read error body)".to_owned());
            return Err(FetchError::HttpResponse {
                status,
                body: error_body,
            });
        }

        Ok(body.read_to_string()?)
    }
}

/// Markdown files stored as `{dir}/{id}.md`.
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ContentSource for DirSource {
    fn fetch(&self, id: &str) -> Result<String, FetchError> {
        let path = self.dir.join(format!("{id}.md"));
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

/// Tries each source in order.
///
/// Failures are logged and skipped. The first non-empty body is returned;
/// if none is found the result is `Ok("")`.
pub struct FallbackSource {
    sources: Vec<Box<dyn ContentSource>>,
}

impl FallbackSource {
    pub fn new(sources: Vec<Box<dyn ContentSource>>) -> Self {
        Self { sources }
    }
}

impl ContentSource for FallbackSource {
    fn fetch(&self, id: &str) -> Result<String, FetchError> {
        for (index, source) in self.sources.iter().enumerate() {
            match source.fetch(id) {
                Ok(markdown) if !markdown.is_empty() => return Ok(markdown),
                Ok(_) => tracing::debug!(id, source = index, "Source returned no content"),
                Err(e) => tracing::warn!(id, source = index, error = %e, "Source failed"),
            }
        }
        Ok(String::new())
    }
}
