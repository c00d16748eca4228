//! The render pipeline and its page cache.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use folio_cache::{Cache, RenderCache};
use folio_diagrams::{
    DiagramEngine, DiagramError, DiagramFailurePolicy, DiagramInjector, TokenizedMarkdown, slug,
    tokenize,
};
use folio_renderer::{
    HtmlBackend, InteractiveElement, MarkdownRenderer, annotate_markdown_text, enhance_code_blocks,
    escape_html,
};
use serde::Serialize;

use crate::chat::apply_chat_styles;
use crate::links::{link_contacts, link_contacts_markdown};
use crate::source::{ContentSource, FetchError};

/// Context used when the caller has none.
pub const DEFAULT_CONTEXT: &str = "default";

/// Rendered HTML and the interactive controls it contains.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RenderedHtml {
    pub html: String,
    pub interactive: Vec<InteractiveElement>,
}

/// Outcome of a batch preload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
    /// Fetched and rendered during this batch.
    pub loaded: usize,
    /// Already preloaded this session or present in the cache.
    pub cached: usize,
    /// Fetch or render failed.
    pub failed: usize,
}

/// Error returned when rendering fails.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A diagram could not be compiled.
    #[error("Diagram error: {0}")]
    Diagram(#[from] DiagramError),
    /// Raw markdown could not be fetched.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Configuration for [`Pipeline`].
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Initial language; part of every cache key.
    pub language: String,
    /// Pause before each fetch of a batch preload.
    pub preload_delay: Duration,
    /// What a render does when a diagram fails to compile.
    pub diagram_policy: DiagramFailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "pt".to_owned(),
            preload_delay: Duration::from_millis(100),
            diagram_policy: DiagramFailurePolicy::default(),
        }
    }
}

/// Markdown to interactive HTML, with caching and background preloading.
///
/// Without a diagram engine, mermaid fences render as ordinary code blocks.
///
/// # Thread Safety
///
/// `Pipeline` is `Send + Sync`. Renders run on the calling thread; the cache
/// memory tier is behind an `RwLock` and the last write per key wins. Only
/// one batch preload runs at a time.
pub struct Pipeline {
    source: Box<dyn ContentSource>,
    engine: Option<Box<dyn DiagramEngine>>,
    cache: RenderCache,
    language: RwLock<String>,
    preload_delay: Duration,
    diagram_policy: DiagramFailurePolicy,
    preloaded: Mutex<HashSet<String>>,
    preloading: AtomicBool,
    chat_renders: AtomicUsize,
}

impl Pipeline {
    /// Create a pipeline fetching from `source` and caching in the `pages`
    /// bucket of `cache`.
    pub fn new(source: Box<dyn ContentSource>, cache: &dyn Cache, config: PipelineConfig) -> Self {
        Self {
            source,
            engine: None,
            cache: RenderCache::new(cache),
            language: RwLock::new(config.language),
            preload_delay: config.preload_delay,
            diagram_policy: config.diagram_policy,
            preloaded: Mutex::new(HashSet::new()),
            preloading: AtomicBool::new(false),
            chat_renders: AtomicUsize::new(0),
        }
    }

    /// Compile titled mermaid fences with `engine`.
    #[must_use]
    pub fn with_engine(mut self, engine: Box<dyn DiagramEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Render markdown to HTML.
    ///
    /// Stages run in order: diagram extraction, markdown conversion,
    /// `markdown-text` annotation, code block enhancement, diagram injection.
    /// `context_id` namespaces diagram and code block ids.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Diagram`] when a diagram fails to compile and
    /// the failure policy is [`DiagramFailurePolicy::Abort`].
    pub fn render(&self, markdown: &str, context_id: &str) -> Result<RenderedHtml, RenderError> {
        let tokenized = match self.engine {
            Some(_) => tokenize(markdown, context_id),
            None => TokenizedMarkdown {
                markdown: markdown.to_owned(),
                blocks: Vec::new(),
            },
        };

        let html = MarkdownRenderer::<HtmlBackend>::new().render_markdown(&tokenized.markdown);
        let html = annotate_markdown_text(&html);
        let (html, mut interactive) = enhance_code_blocks(&html, &slug(context_id));

        let Some(engine) = &self.engine else {
            return Ok(RenderedHtml { html, interactive });
        };

        let injected = DiagramInjector::new(engine.as_ref())
            .with_policy(self.diagram_policy)
            .inject(&html, context_id, &tokenized.blocks)?;
        interactive.extend(injected.interactive);

        Ok(RenderedHtml {
            html: injected.html,
            interactive,
        })
    }

    /// Render a chat answer.
    ///
    /// Contact mentions become links and chat classes are added. A failed
    /// render falls back to the escaped text with line breaks, so the answer
    /// is never blank.
    ///
    /// Every call renders in its own namespace `{context_id}-{n}`, so code
    /// block and diagram ids stay unique across answers shown on one page.
    pub fn render_chat(&self, markdown: &str, context_id: &str) -> RenderedHtml {
        let n = self.chat_renders.fetch_add(1, Ordering::Relaxed) + 1;
        let context = format!("{context_id}-{n}");
        match self.render(&link_contacts_markdown(markdown), &context) {
            Ok(rendered) => RenderedHtml {
                html: apply_chat_styles(&link_contacts(&rendered.html)),
                interactive: rendered.interactive,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Chat render failed, using plain text");
                let escaped = escape_html(markdown).replace('\n', "<br>");
                RenderedHtml {
                    html: apply_chat_styles(&link_contacts(&escaped)),
                    interactive: Vec::new(),
                }
            }
        }
    }

    /// Rendered HTML for content `id`, fetching and rendering on a miss.
    ///
    /// Ids are case-insensitive. Content that comes back empty yields `""`
    /// and is not cached.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] if fetching or rendering fails.
    pub fn preload_project(&self, id: &str) -> Result<String, RenderError> {
        let normalized = id.to_lowercase();
        let lang = self.language();

        if let Some(html) = self.cache.get(&normalized, &lang) {
            return Ok(html);
        }

        let markdown = self.source.fetch(&normalized)?;
        if markdown.is_empty() {
            tracing::warn!(id = %normalized, "No content found");
            return Ok(String::new());
        }

        let rendered = self.render(&markdown, &normalized)?;
        self.cache.set(&normalized, &lang, &rendered.html);
        Ok(rendered.html)
    }

    /// Preload `ids` one after another.
    ///
    /// Ids already preloaded this session or already cached are skipped.
    /// Failures are counted and logged, never returned. If another batch is
    /// running, returns an empty summary at once.
    pub fn preload_projects<S: AsRef<str>>(&self, ids: &[S]) -> PreloadSummary {
        if self.preloading.swap(true, Ordering::AcqRel) {
            tracing::info!("Preload already in progress");
            return PreloadSummary::default();
        }
        let _guard = PreloadGuard(&self.preloading);

        tracing::info!(count = ids.len(), "Starting preload");
        let start = Instant::now();
        let mut summary = PreloadSummary::default();

        for id in ids {
            let normalized = id.as_ref().to_lowercase();

            if self.preloaded.lock().unwrap().contains(&normalized) {
                summary.cached += 1;
                continue;
            }

            if !self.get_cached_sync(&normalized).is_empty() {
                self.preloaded.lock().unwrap().insert(normalized);
                summary.cached += 1;
                continue;
            }

            thread::sleep(self.preload_delay);
            match self.preload_project(&normalized) {
                Ok(_) => {
                    tracing::info!(id = %normalized, "Preloaded");
                    self.preloaded.lock().unwrap().insert(normalized);
                    summary.loaded += 1;
                }
                Err(e) => {
                    tracing::warn!(id = %normalized, error = %e, "Preload failed");
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            loaded = summary.loaded,
            cached = summary.cached,
            failed = summary.failed,
            elapsed_ms = start.elapsed().as_millis(),
            "Preload finished"
        );
        summary
    }

    /// Run [`Pipeline::preload_projects`] on a background thread.
    pub fn preload_projects_in_background(
        self: &Arc<Self>,
        ids: Vec<String>,
    ) -> JoinHandle<PreloadSummary> {
        let pipeline = Arc::clone(self);
        thread::spawn(move || pipeline.preload_projects(&ids))
    }

    /// Cached HTML for `id` in the active language, or `""`.
    ///
    /// Never fetches or renders.
    pub fn get_cached_sync(&self, id: &str) -> String {
        self.cache.get(id, &self.language()).unwrap_or_default()
    }

    /// Active language.
    pub fn language(&self) -> String {
        self.language.read().unwrap().clone()
    }

    /// Switch language.
    ///
    /// Clears the memory tier and the preloaded set; persisted pages of other
    /// languages stay on disk under their own keys.
    pub fn set_language(&self, lang: &str) {
        *self.language.write().unwrap() = lang.to_owned();
        self.cache.clear_memory();
        self.preloaded.lock().unwrap().clear();
        tracing::info!(lang, "Language changed");
    }

    /// Drop the cached page of `id` in the active language.
    pub fn invalidate(&self, id: &str) {
        let normalized = id.to_lowercase();
        self.cache.remove(&normalized, &self.language());
        self.preloaded.lock().unwrap().remove(&normalized);
    }

    /// Drop every cached page in every language.
    pub fn clear_cache(&self) {
        self.cache.clear();
        self.preloaded.lock().unwrap().clear();
    }
}

/// Clears the batch flag when a batch ends, including by panic.
struct PreloadGuard<'a>(&'a AtomicBool);

impl Drop for PreloadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use folio_cache::NullCache;
    use folio_diagrams::DiagramErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    struct NoSource;

    impl ContentSource for NoSource {
        fn fetch(&self, _id: &str) -> Result<String, FetchError> {
            Ok(String::new())
        }
    }

    struct FailingEngine;

    impl DiagramEngine for FailingEngine {
        fn compile(&self, id: &str, _source: &str) -> Result<String, DiagramError> {
            Err(DiagramError::new(id, DiagramErrorKind::Syntax("bad arrow".to_owned())))
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Box::new(NoSource), &NullCache, PipelineConfig::default())
    }

    const DIAGRAM: &str = "```mermaid\ntitle \"Flow\"\ngraph TD; A-->B;\n```";

    #[test]
    fn test_render_without_engine_keeps_fence_as_code() {
        let rendered = pipeline().render(DIAGRAM, "demo").unwrap();

        assert!(rendered.html.contains(r#"<code class="language-mermaid">"#));
        assert!(!rendered.html.contains("<!--MERMAID:"));
    }

    #[test]
    fn test_render_annotates_and_enhances() {
        let rendered = pipeline()
            .render("Hello\n\n```rust\nfn main() {}\n```", "My Project")
            .unwrap();

        assert!(rendered.html.starts_with(r#"<p class="markdown-text">Hello</p>"#));
        assert!(rendered.html.contains(r#"id="my-project-code-1""#));
        assert_eq!(rendered.interactive.len(), 1);
        assert_eq!(rendered.interactive[0].id, "my-project-code-1");
    }

    #[test]
    fn test_render_abort_policy_propagates() {
        let pipeline = pipeline().with_engine(Box::new(FailingEngine));
        let err = pipeline.render(DIAGRAM, "demo").unwrap_err();

        assert!(matches!(err, RenderError::Diagram(ref e) if e.id == "demo-flow"));
    }

    #[test]
    fn test_render_placeholder_policy_continues() {
        let config = PipelineConfig {
            diagram_policy: DiagramFailurePolicy::Placeholder,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(Box::new(NoSource), &NullCache, config)
            .with_engine(Box::new(FailingEngine));

        let rendered = pipeline.render(DIAGRAM, "demo").unwrap();

        assert!(rendered.html.contains("mermaid-error"));
        assert!(rendered.html.contains("bad arrow"));
        assert!(rendered.interactive.is_empty());
    }

    #[test]
    fn test_render_chat_falls_back_to_text() {
        let pipeline = pipeline().with_engine(Box::new(FailingEngine));
        let md = format!("a < b\n{DIAGRAM}");

        let rendered = pipeline.render_chat(&md, "chat");

        assert!(rendered.html.starts_with("a &lt; b<br>```mermaid"));
        assert!(rendered.interactive.is_empty());
    }

    #[test]
    fn test_empty_content_not_cached() {
        let pipeline = pipeline();

        assert_eq!(pipeline.preload_project("Missing").unwrap(), "");
        assert_eq!(pipeline.get_cached_sync("missing"), "");
    }

    struct PanickingSource;

    impl ContentSource for PanickingSource {
        fn fetch(&self, id: &str) -> Result<String, FetchError> {
            panic!("source crashed on {id}");
        }
    }

    #[test]
    fn test_panicking_batch_releases_preload_flag() {
        let config = PipelineConfig {
            preload_delay: Duration::ZERO,
            ..PipelineConfig::default()
        };
        let pipeline = Pipeline::new(Box::new(PanickingSource), &NullCache, config);

        let result = panic::catch_unwind(AssertUnwindSafe(|| pipeline.preload_projects(&["a"])));

        assert!(result.is_err());
        assert!(!pipeline.preloading.load(Ordering::Acquire));
    }

    #[test]
    fn test_chat_renders_get_distinct_ids() {
        let pipeline = pipeline();
        let md = "```sh\nls\n```";

        let first = pipeline.render_chat(md, "chat");
        let second = pipeline.render_chat(md, "chat");

        assert_eq!(first.interactive[0].id, "chat-1-code-1");
        assert_eq!(second.interactive[0].id, "chat-2-code-1");
        assert!(second.html.contains(r#"id="chat-2-code-1""#));
    }

    #[test]
    fn test_second_batch_while_running_is_empty() {
        let pipeline = pipeline();
        pipeline.preloading.store(true, Ordering::Release);

        assert_eq!(pipeline.preload_projects(&["a"]), PreloadSummary::default());
    }
}
