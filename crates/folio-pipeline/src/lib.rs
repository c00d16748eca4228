//! Markdown to interactive HTML for folio.
//!
//! [`Pipeline`] ties the other crates together:
//!
//! - [`Pipeline::render`] extracts mermaid diagrams, converts markdown,
//!   annotates and enhances the HTML, and injects compiled diagrams
//! - [`Pipeline::render_chat`] adds contact links and chat styling
//! - [`Pipeline::preload_project`] and [`Pipeline::preload_projects`] fetch
//!   content through a [`ContentSource`] and cache the rendered pages per
//!   content id and language
//!
//! # Example
//!
//! ```
//! use folio_cache::NullCache;
//! use folio_pipeline::{DirSource, Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(Box::new(DirSource::new("docs")), &NullCache, PipelineConfig::default());
//! let rendered = pipeline.render("Hello *world*", "demo").unwrap();
//! assert_eq!(
//!     rendered.html,
//!     r#"<p class="markdown-text">Hello <em class="markdown-text">world</em></p>"#
//! );
//! ```

mod chat;
mod links;
mod pipeline;
mod source;

pub use chat::apply_chat_styles;
pub use links::{CHAT_LINK_CLASS, link_contacts, link_contacts_markdown};
pub use pipeline::{
    DEFAULT_CONTEXT, Pipeline, PipelineConfig, PreloadSummary, RenderError, RenderedHtml,
};
pub use source::{ContentSource, DirSource, FallbackSource, FetchError, HttpSource};
