//! Mermaid diagrams for folio.
//!
//! Diagrams go through three steps around markdown conversion:
//!
//! 1. [`tokenize`] lifts titled mermaid fences out of the markdown, leaving
//!    `<!--MERMAID:{id}-->` placeholders ([`extract_title`] finds the title,
//!    [`diagram_id`] derives the id)
//! 2. the markdown is converted to HTML; placeholders pass through verbatim
//! 3. [`DiagramInjector`] compiles each block with a [`DiagramEngine`] and
//!    replaces its placeholder with an interactive container
//!
//! [`KrokiEngine`] is the production engine: it posts sources to a Kroki
//! server and caches the SVG by content hash.

mod cache;
mod consts;
mod engine;
mod fence;
mod inject;
mod kroki;
mod slug;
mod svg;
mod title;

pub use cache::DiagramKey;
pub use consts::{DEFAULT_TIMEOUT, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
pub use engine::{DiagramEngine, DiagramError, DiagramErrorKind};
pub use fence::{DiagramBlock, TokenizedMarkdown, placeholder, tokenize};
pub use inject::{DiagramFailurePolicy, DiagramInjector, InjectedHtml};
pub use kroki::KrokiEngine;
pub use slug::{diagram_id, slug};
pub use svg::{bind_svg_id, strip_google_fonts_import, svg_element_id};
pub use title::extract_title;
