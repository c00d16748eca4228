//! Generic markdown renderer with pluggable backend.

use std::fmt::Write;
use std::marker::PhantomData;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::backend::{AlertKind, RenderBackend};
use crate::state::{Capture, CodeBlockState, HeadingState, TableState, escape_html};

/// Tables, strikethrough, task lists and GFM alerts.
const PARSER_OPTIONS: Options = Options::ENABLE_TABLES
    .union(Options::ENABLE_STRIKETHROUGH)
    .union(Options::ENABLE_TASKLISTS)
    .union(Options::ENABLE_GFM);

/// Markdown to HTML converter.
///
/// Structure (lists, tables, inline formatting, headings) is handled here;
/// code blocks, blockquotes and images are delegated to the backend. Raw HTML
/// in the source, including comment placeholders, is copied to the output
/// untouched.
///
/// GitHub Flavored Markdown is always on. Line breaks are preserved by
/// default (a single newline inside a paragraph becomes `<br>`).
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: Capture,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    line_breaks: bool,
    /// Alert kind per open blockquote; `None` for a plain blockquote.
    alert_stack: Vec<Option<AlertKind>>,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: Capture::default(),
            heading: HeadingState::default(),
            pending_image: None,
            line_breaks: true,
            alert_stack: Vec::new(),
            _backend: PhantomData,
        }
    }

    /// Render soft line breaks as `<br>` (enabled by default).
    ///
    /// When disabled, a newline inside a paragraph is emitted as a plain
    /// newline and collapses in the browser, as in `CommonMark`.
    #[must_use]
    pub fn with_line_breaks(mut self, enabled: bool) -> Self {
        self.line_breaks = enabled;
        self
    }

    /// Parse and render markdown text.
    pub fn render_markdown(&mut self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, PARSER_OPTIONS);
        self.render(parser)
    }

    /// Render a stream of markdown events.
    pub fn render<'a, I>(&mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        std::mem::take(&mut self.output)
    }

    fn push_inline(&mut self, content: &str) {
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_inline(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => self.heading.start_heading(heading_level_to_num(level)),
            Tag::BlockQuote(kind) => {
                if let Some(kind) = kind {
                    let alert = AlertKind::from(kind);
                    self.alert_stack.push(Some(alert));
                    B::alert_start(alert, &mut self.output);
                } else {
                    self.alert_stack.push(None);
                    B::blockquote_start(&mut self.output);
                }
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.start_row();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let (tag, align) = (self.table.cell_tag(), self.table.alignment_style());
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<del>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = format!(r#"<a href="{}""#, escape_html(&dest_url));
                if !title.is_empty() {
                    write!(link, r#" title="{}""#, escape_html(&title)).unwrap();
                }
                link.push('>');
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image.begin();
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => match self.alert_stack.pop() {
                Some(Some(alert)) => B::alert_end(alert, &mut self.output),
                _ => B::blockquote_end(&mut self.output),
            },
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                B::code_block(lang.as_deref(), &content, &mut self.output);
            }
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                write!(self.output, "</{}>", self.table.cell_tag()).unwrap();
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</del>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                let alt = self.image.finish();
                if let Some((src, title)) = self.pending_image.take() {
                    let mut img = String::new();
                    B::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else if self.heading.is_active() {
            self.heading.push_text(text);
            self.heading.push_html(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_text(code);
        }
        self.push_inline(&format!("<code>{}</code>", escape_html(code)));
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_str("\n");
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.line_breaks {
            let mut br = String::new();
            B::hard_break(&mut br);
            br.push('\n');
            self.push_inline(&br);
        } else {
            self.push_inline("\n");
        }
    }

    fn hard_break(&mut self) {
        let mut br = String::new();
        B::hard_break(&mut br);
        br.push('\n');
        self.push_inline(&br);
    }
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::HtmlBackend;

    fn render(markdown: &str) -> String {
        MarkdownRenderer::<HtmlBackend>::new().render_markdown(markdown)
    }

    #[test]
    fn test_paragraph_and_emphasis() {
        assert_eq!(
            render("Some *em* and **strong** and ~~gone~~"),
            "<p>Some <em>em</em> and <strong>strong</strong> and <del>gone</del></p>"
        );
    }

    #[test]
    fn test_soft_break_becomes_br() {
        assert_eq!(render("line one\nline two"), "<p>line one<br>\nline two</p>");
    }

    #[test]
    fn test_soft_break_without_line_breaks() {
        let html = MarkdownRenderer::<HtmlBackend>::new()
            .with_line_breaks(false)
            .render_markdown("line one\nline two");
        assert_eq!(html, "<p>line one\nline two</p>");
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(render("a  \nb"), "<p>a<br>\nb</p>");
    }

    #[test]
    fn test_heading_ids() {
        assert_eq!(
            render("# Intro\n\n## Intro\n\n## `cargo` usage"),
            concat!(
                r#"<h1 id="intro">Intro</h1>"#,
                r#"<h2 id="intro-1">Intro</h2>"#,
                r#"<h2 id="cargo-usage"><code>cargo</code> usage</h2>"#
            )
        );
    }

    #[test]
    fn test_fenced_code_block() {
        assert_eq!(
            render("```rust title=x\nlet a = \"<b>\";\n```"),
            r#"<pre><code class="language-rust">let a = &quot;&lt;b&gt;&quot;;
</code></pre>"#
        );
    }

    #[test]
    fn test_untagged_code_block() {
        assert_eq!(
            render("```\nplain\n```"),
            "<pre><code>plain\n</code></pre>"
        );
    }

    #[test]
    fn test_placeholder_comment_passes_through() {
        let html = render("# Doc\n\n<!--MERMAID:demo-flow-->\n\nafter");
        assert!(html.contains("<!--MERMAID:demo-flow-->"));
        assert!(!html.contains("&lt;!--"));
        assert!(html.ends_with("<p>after</p>"));
    }

    #[test]
    fn test_placeholder_directly_after_paragraph() {
        let html = render("intro\n<!--MERMAID:ctx-a-->\n");
        assert!(html.contains("<!--MERMAID:ctx-a-->"));
    }

    #[test]
    fn test_table_with_alignment() {
        assert_eq!(
            render("| a | b |\n|:--|--:|\n| 1 | 2 |"),
            concat!(
                "<table><thead><tr>",
                r#"<th style="text-align:left">a</th><th style="text-align:right">b</th>"#,
                "</tr></thead><tbody><tr>",
                r#"<td style="text-align:left">1</td><td style="text-align:right">2</td>"#,
                "</tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            render("- [x] done\n- [ ] todo"),
            concat!(
                "<ul>",
                r#"<li><input type="checkbox" checked disabled> done</li>"#,
                r#"<li><input type="checkbox" disabled> todo</li>"#,
                "</ul>"
            )
        );
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(render("3. c\n4. d"), r#"<ol start="3"><li>c</li><li>d</li></ol>"#);
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            render(r#"[site](https://example.com "Home") ![logo `v1`](logo.png)"#),
            concat!(
                r#"<p><a href="https://example.com" title="Home">site</a> "#,
                r#"<img src="logo.png" alt="logo v1"></p>"#
            )
        );
    }

    #[test]
    fn test_alert_blockquote() {
        let html = render("> [!TIP]\n> Use the cache");
        assert!(html.starts_with(r#"<blockquote class="markdown-alert markdown-alert-tip">"#));
        assert!(html.contains("<p>Use the cache</p>"));
    }

    #[test]
    fn test_plain_blockquote() {
        assert_eq!(render("> quoted"), "<blockquote><p>quoted</p></blockquote>");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("1 < 2 & 3 > 2"), "<p>1 &lt; 2 &amp; 3 &gt; 2</p>");
    }
}
