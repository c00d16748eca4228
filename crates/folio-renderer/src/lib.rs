//! Markdown to HTML conversion for folio.
//!
//! The crate has two halves:
//!
//! - [`MarkdownRenderer`]: an event-driven converter over `pulldown-cmark`,
//!   generic over a [`RenderBackend`] ([`HtmlBackend`] produces HTML5)
//! - string-level passes run on the converter's output: [`add_class`] and
//!   [`annotate_markdown_text`] for class annotation, [`enhance_code_blocks`]
//!   for the copy-button wrapper around code blocks
//!
//! Passes that emit interactive controls report them as
//! [`InteractiveElement`]s so the host can attach behaviour by id instead of
//! through inline handlers.
//!
//! # Example
//!
//! ```
//! use folio_renderer::{HtmlBackend, MarkdownRenderer, annotate_markdown_text};
//!
//! let html = MarkdownRenderer::<HtmlBackend>::new().render_markdown("**Bold**\nnext line");
//! assert_eq!(html, "<p><strong>Bold</strong><br>\nnext line</p>");
//!
//! let html = annotate_markdown_text(&html);
//! assert!(html.starts_with(r#"<p class="markdown-text">"#));
//! ```

mod annotate;
mod backend;
mod enhance;
mod html;
mod manifest;
mod renderer;
mod state;

pub use annotate::{MARKDOWN_TEXT_CLASS, add_attribute, add_class, annotate_markdown_text};
pub use backend::{AlertKind, RenderBackend};
pub use enhance::enhance_code_blocks;
pub use html::HtmlBackend;
pub use manifest::{InteractiveElement, InteractiveKind};
pub use renderer::MarkdownRenderer;
pub use state::{escape_html, slugify};
