//! Diagram compilation interface.

/// A diagram that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("diagram {id}: {kind}")]
pub struct DiagramError {
    /// Id of the diagram being compiled.
    pub id: String,
    pub kind: DiagramErrorKind,
}

impl DiagramError {
    pub fn new(id: impl Into<String>, kind: DiagramErrorKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// Kind of diagram compilation error.
#[derive(Debug, thiserror::Error)]
pub enum DiagramErrorKind {
    /// The engine rejected the source (syntax error, unknown diagram type).
    #[error("syntax error: {0}")]
    Syntax(String),
    /// The engine could not be reached or failed on its side.
    #[error("HTTP error: {0}")]
    Http(String),
    /// The engine answered with something that is not usable SVG.
    #[error("invalid output: {0}")]
    InvalidOutput(String),
}

/// Compiles diagram source into SVG markup.
///
/// Output must be deterministic for a given `(id, source)` and its root
/// element bound to `id`, so several diagrams can share a page without
/// clashing element ids.
pub trait DiagramEngine: Send + Sync {
    fn compile(&self, id: &str, source: &str) -> Result<String, DiagramError>;
}
