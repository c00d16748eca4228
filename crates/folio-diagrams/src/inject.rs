//! Replacement of diagram placeholders with interactive containers.

use std::fmt::Write;
use std::str::FromStr;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use folio_renderer::{InteractiveElement, InteractiveKind, escape_html};

use crate::consts::{ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
use crate::engine::{DiagramEngine, DiagramError};
use crate::fence::{DiagramBlock, placeholder};

const DOWNLOAD_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="currentColor" aria-hidden="true"><path d="M19 9h-4V3H9v6H5l7 7 7-7zM5 18v2h14v-2H5z"/></svg>"#;
const FULLSCREEN_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="currentColor" aria-hidden="true"><path d="M7 14H5v5h5v-2H7v-3zm-2-4h2V7h3V5H5v5zm12 7h-3v2h5v-5h-2v3zM14 5v2h3v3h2V5h-5z"/></svg>"#;

/// What to do when a diagram fails to compile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagramFailurePolicy {
    /// Stop and return the error; nothing is rendered.
    #[default]
    Abort,
    /// Render an error box in place of the diagram and keep going.
    Placeholder,
}

impl FromStr for DiagramFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(format!(
                "unknown diagram failure policy '{other}' (expected 'abort' or 'placeholder')"
            )),
        }
    }
}

/// HTML with diagrams injected, plus the controls they added.
#[derive(Clone, Debug, Default)]
pub struct InjectedHtml {
    pub html: String,
    pub interactive: Vec<InteractiveElement>,
}

/// Compiles extracted diagrams and swaps their placeholders for containers.
pub struct DiagramInjector<'a> {
    engine: &'a dyn DiagramEngine,
    policy: DiagramFailurePolicy,
}

impl<'a> DiagramInjector<'a> {
    pub fn new(engine: &'a dyn DiagramEngine) -> Self {
        Self {
            engine,
            policy: DiagramFailurePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: DiagramFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Inject every block of `blocks` into `html`.
    ///
    /// Blocks are compiled in order. Placeholders are located by id, so the
    /// order in which the converter emitted them does not matter. A block whose
    /// placeholder is missing from `html` is skipped with a warning and
    /// contributes no controls.
    pub fn inject(
        &self,
        html: &str,
        context_id: &str,
        blocks: &[DiagramBlock],
    ) -> Result<InjectedHtml, DiagramError> {
        let mut out = InjectedHtml {
            html: html.to_owned(),
            interactive: Vec::new(),
        };

        for block in blocks {
            let token = placeholder(&block.id);
            if !out.html.contains(&token) {
                tracing::warn!(id = %block.id, "Diagram placeholder missing from HTML, skipping");
                continue;
            }

            let container = match self.engine.compile(&block.id, &block.code) {
                Ok(svg) => {
                    out.interactive.extend([
                        InteractiveElement::new(&block.id, InteractiveKind::DiagramDownload),
                        InteractiveElement::new(&block.id, InteractiveKind::DiagramFullscreen),
                    ]);
                    diagram_container(block, context_id, &svg)
                }
                Err(e) if self.policy == DiagramFailurePolicy::Placeholder => {
                    tracing::warn!(id = %block.id, error = %e, "Diagram failed to compile");
                    error_container(block, context_id, &e)
                }
                Err(e) => return Err(e),
            };

            out.html = out.html.replacen(&token, &container, 1);
        }

        Ok(out)
    }
}

fn open_container(out: &mut String, block: &DiagramBlock, context_id: &str, extra_class: &str) {
    write!(
        out,
        r#"<div class="mermaid-diagram{extra_class}" id="{id}-container" data-context="{ctx}" data-diagram-id="{id}">"#,
        id = block.id,
        ctx = escape_html(context_id),
    )
    .unwrap();
}

/// Full diagram container with title bar, download and fullscreen controls.
fn diagram_container(block: &DiagramBlock, context_id: &str, svg: &str) -> String {
    let id = &block.id;
    let download_href = format!(
        "data:image/svg+xml;base64,{}",
        BASE64_STANDARD.encode(svg.as_bytes())
    );

    let mut out = String::with_capacity(svg.len() + download_href.len() + 1024);
    open_container(&mut out, block, context_id, "");
    write!(
        out,
        r#"<div class="mermaid-header"><div class="mermaid-title">{}</div><div class="mermaid-controls">"#,
        escape_html(&block.title)
    )
    .unwrap();
    write!(
        out,
        r#"<a class="mermaid-download-btn" href="{download_href}" download="{id}.svg" data-action="{}" data-target="{id}" title="Baixar diagrama">{DOWNLOAD_ICON}</a>"#,
        InteractiveKind::DiagramDownload.action()
    )
    .unwrap();
    write!(
        out,
        r#"<button class="mermaid-fullscreen-btn" type="button" data-action="{}" data-target="{id}" data-zoom-min="{ZOOM_MIN}" data-zoom-max="{ZOOM_MAX}" data-zoom-step="{ZOOM_STEP}" title="Ver em tela cheia">{FULLSCREEN_ICON}</button>"#,
        InteractiveKind::DiagramFullscreen.action()
    )
    .unwrap();
    write!(
        out,
        r#"</div></div><div class="mermaid-content">{svg}</div></div>"#
    )
    .unwrap();
    out
}

/// Inline error box used by [`DiagramFailurePolicy::Placeholder`].
fn error_container(block: &DiagramBlock, context_id: &str, error: &DiagramError) -> String {
    let mut out = String::new();
    open_container(&mut out, block, context_id, " mermaid-error");
    write!(
        out,
        r#"<div class="mermaid-header"><div class="mermaid-title">{}</div></div><div class="mermaid-content"><pre class="mermaid-error-message">{}</pre></div></div>"#,
        escape_html(&block.title),
        escape_html(&error.kind.to_string())
    )
    .unwrap();
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::engine::DiagramErrorKind;
    use crate::fence::tokenize;

    /// Engine echoing the source inside a minimal SVG, failing on "fail".
    #[derive(Default)]
    struct EchoEngine {
        compiled: Mutex<Vec<String>>,
    }

    impl DiagramEngine for EchoEngine {
        fn compile(&self, id: &str, source: &str) -> Result<String, DiagramError> {
            self.compiled.lock().unwrap().push(id.to_owned());
            if source.contains("fail") {
                return Err(DiagramError::new(
                    id,
                    DiagramErrorKind::Syntax("Parse error on line 2".to_owned()),
                ));
            }
            Ok(format!(r#"<svg id="m_{id}"><text>{}</text></svg>"#, source.len()))
        }
    }

    fn block(id: &str, title: &str, code: &str) -> DiagramBlock {
        DiagramBlock {
            code: code.to_owned(),
            title: title.to_owned(),
            id: id.to_owned(),
        }
    }

    #[test]
    fn test_container_structure() {
        let engine = EchoEngine::default();
        let blocks = [block("demo-flow", "Flow", "graph")];
        let out = DiagramInjector::new(&engine)
            .inject("<p>a</p><!--MERMAID:demo-flow--><p>b</p>", "demo", &blocks)
            .unwrap();

        assert!(out.html.starts_with(concat!(
            "<p>a</p>",
            r#"<div class="mermaid-diagram" id="demo-flow-container" data-context="demo" data-diagram-id="demo-flow">"#,
            r#"<div class="mermaid-header"><div class="mermaid-title">Flow</div>"#
        )));
        assert!(out.html.contains(r#"download="demo-flow.svg""#));
        assert!(out.html.contains(r#"data-action="diagram-fullscreen" data-target="demo-flow""#));
        assert!(out.html.contains(r#"data-zoom-min="0.1" data-zoom-max="5" data-zoom-step="0.1""#));
        assert!(out.html.ends_with(concat!(
            r#"<div class="mermaid-content"><svg id="m_demo-flow"><text>5</text></svg></div></div>"#,
            "<p>b</p>"
        )));
        assert!(!out.html.contains("<!--MERMAID:"));
        assert!(!out.html.contains("onclick"));
        assert_eq!(
            out.interactive,
            vec![
                InteractiveElement::new("demo-flow", InteractiveKind::DiagramDownload),
                InteractiveElement::new("demo-flow", InteractiveKind::DiagramFullscreen),
            ]
        );
    }

    #[test]
    fn test_download_href_is_base64_svg() {
        let engine = EchoEngine::default();
        let out = DiagramInjector::new(&engine)
            .inject("<!--MERMAID:c-x-->", "c", &[block("c-x", "X", "g")])
            .unwrap();

        let svg = r#"<svg id="m_c-x"><text>1</text></svg>"#;
        let expected = format!(
            r#"href="data:image/svg+xml;base64,{}""#,
            BASE64_STANDARD.encode(svg)
        );
        assert!(out.html.contains(&expected));
    }

    #[test]
    fn test_title_is_escaped() {
        let engine = EchoEngine::default();
        let out = DiagramInjector::new(&engine)
            .inject("<!--MERMAID:c-a-b-->", "c", &[block("c-a-b", "A <b>", "g")])
            .unwrap();
        assert!(out.html.contains(r#"<div class="mermaid-title">A &lt;b&gt;</div>"#));
    }

    #[test]
    fn test_round_trip_every_placeholder_replaced() {
        let md = concat!(
            "```mermaid\ntitle \"One\"\ngraph\n```\n\n",
            "text\n\n",
            "```mermaid\ntitle \"Two\"\ngraph\n```\n\n",
            "```mermaid\ntitle \"Three\"\ngraph\n```\n",
        );
        let tokenized = tokenize(md, "ctx");
        let engine = EchoEngine::default();
        let out = DiagramInjector::new(&engine)
            .inject(&tokenized.markdown, "ctx", &tokenized.blocks)
            .unwrap();

        assert_eq!(out.html.matches(r#"class="mermaid-diagram""#).count(), 3);
        assert!(!out.html.contains("<!--MERMAID:"));
        assert_eq!(out.interactive.len(), 6);
        assert_eq!(
            *engine.compiled.lock().unwrap(),
            ["ctx-one", "ctx-two", "ctx-three"]
        );
    }

    #[test]
    fn test_abort_policy_propagates_error() {
        let engine = EchoEngine::default();
        let blocks = [block("c-bad", "Bad", "fail"), block("c-ok", "Ok", "g")];
        let err = DiagramInjector::new(&engine)
            .inject("<!--MERMAID:c-bad--><!--MERMAID:c-ok-->", "c", &blocks)
            .unwrap_err();

        assert_eq!(err.id, "c-bad");
        assert_eq!(*engine.compiled.lock().unwrap(), ["c-bad"]);
    }

    #[test]
    fn test_placeholder_policy_renders_error_box() {
        let engine = EchoEngine::default();
        let blocks = [block("c-bad", "Bad", "fail"), block("c-ok", "Ok", "g")];
        let out = DiagramInjector::new(&engine)
            .with_policy(DiagramFailurePolicy::Placeholder)
            .inject("<!--MERMAID:c-bad--><!--MERMAID:c-ok-->", "c", &blocks)
            .unwrap();

        assert!(out.html.starts_with(
            r#"<div class="mermaid-diagram mermaid-error" id="c-bad-container""#
        ));
        assert!(out.html.contains("syntax error: Parse error on line 2"));
        assert!(out.html.contains(r#"id="c-ok-container""#));
        assert!(!out.html.contains("<!--MERMAID:"));
        // Only the diagram that compiled gets controls
        assert_eq!(out.interactive.len(), 2);
        assert!(out.interactive.iter().all(|e| e.id == "c-ok"));
    }

    #[test]
    fn test_missing_placeholder_is_skipped() {
        let engine = EchoEngine::default();
        let out = DiagramInjector::new(&engine)
            .inject("<p>no placeholders</p>", "c", &[block("c-x", "X", "g")])
            .unwrap();

        assert_eq!(out.html, "<p>no placeholders</p>");
        assert!(out.interactive.is_empty());
        assert!(engine.compiled.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!("abort".parse::<DiagramFailurePolicy>(), Ok(DiagramFailurePolicy::Abort));
        assert_eq!("Placeholder".parse::<DiagramFailurePolicy>(), Ok(DiagramFailurePolicy::Placeholder));
        assert!("ignore".parse::<DiagramFailurePolicy>().is_err());
    }
}
