//! State tracked while walking markdown events.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Text collected between a start and an end event.
///
/// Used for image alt text and as the body of [`CodeBlockState`].
#[derive(Default)]
pub(crate) struct Capture {
    /// Whether events are currently being captured.
    active: bool,
    /// Collected text.
    buffer: String,
}

impl Capture {
    /// Start capturing, dropping anything left from a previous capture.
    pub fn begin(&mut self) {
        self.active = true;
        self.buffer.clear();
    }

    /// Stop capturing and return the collected text.
    pub fn finish(&mut self) -> String {
        self.active = false;
        std::mem::take(&mut self.buffer)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// The code block being read: its fence language and raw body.
#[derive(Default)]
pub(crate) struct CodeBlockState {
    /// First word of the fence info string; `None` for untagged blocks.
    language: Option<String>,
    body: Capture,
}

impl CodeBlockState {
    pub fn start(&mut self, language: Option<String>) {
        self.language = language;
        self.body.begin();
    }

    /// End the block and return `(language, unescaped body)`.
    pub fn end(&mut self) -> (Option<String>, String) {
        (self.language.take(), self.body.finish())
    }

    pub fn is_active(&self) -> bool {
        self.body.is_active()
    }

    pub fn push_str(&mut self, text: &str) {
        self.body.push_str(text);
    }
}

/// Section of the table being rendered.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
enum TableSection {
    #[default]
    Head,
    Body,
}

/// Cell bookkeeping for the table being rendered.
#[derive(Default)]
pub(crate) struct TableState {
    alignments: Vec<Alignment>,
    section: TableSection,
    /// Zero-based column of the current cell.
    column: usize,
}

impl TableState {
    /// Start a table whose columns are aligned as `alignments`.
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.section = TableSection::Head;
        self.column = 0;
    }

    /// Leave the header; following rows are body rows.
    pub fn end_head(&mut self) {
        self.section = TableSection::Body;
    }

    /// Start a row (header or body) at the first column.
    pub fn start_row(&mut self) {
        self.column = 0;
    }

    pub fn next_cell(&mut self) {
        self.column += 1;
    }

    /// `th` in the header, `td` in the body.
    pub fn cell_tag(&self) -> &'static str {
        match self.section {
            TableSection::Head => "th",
            TableSection::Body => "td",
        }
    }

    /// Inline style attribute for the current column's alignment, or `""`.
    pub fn alignment_style(&self) -> &'static str {
        match self.alignments.get(self.column) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Heading capture and unique anchor ids.
///
/// The opening tag is written only when the heading ends, once its text (and
/// therefore its id) is known.
#[derive(Default)]
pub(crate) struct HeadingState {
    /// Level of the open heading, `None` outside headings.
    current_level: Option<u8>,
    /// Plain text, the source of the slug.
    text: String,
    /// Inner HTML with inline formatting.
    html: String,
    /// Times each slug has been handed out in this document.
    id_counts: HashMap<String, usize>,
}

impl HeadingState {
    pub fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Finish the heading, returning `(level, id, inner_html)`.
    pub fn complete_heading(&mut self) -> Option<(u8, String, String)> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.generate_id(&text);
        Some((level, id, html))
    }

    /// `slug`, then `slug-1`, `slug-2`... for repeats.
    fn generate_id(&mut self, text: &str) -> String {
        let base_id = slugify(text);
        let count = self.id_counts.entry(base_id.clone()).or_default();
        let id = match *count {
            0 => base_id,
            n => format!("{base_id}-{n}"),
        };
        *count += 1;
        id
    }

    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

/// Convert heading text to an anchor slug.
///
/// Lowercases ASCII letters, turns whitespace, `-` and `_` runs into a single
/// dash, and drops everything else.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// Escape HTML special characters, quotes included, so the result is safe in
/// both text and attribute values.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  snake_case  "), "snake-case");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""q""#), "&quot;q&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let mut state = HeadingState::default();

        for _ in 0..3 {
            state.start_heading(2);
            state.push_text("Setup");
            state.push_html("Setup");
            state.complete_heading();
        }
        state.start_heading(2);
        state.push_text("Setup");
        let (level, id, html) = state.complete_heading().unwrap();

        assert_eq!(level, 2);
        assert_eq!(id, "setup-3");
        assert_eq!(html, "");
    }

    #[test]
    fn test_complete_without_start_is_none() {
        let mut state = HeadingState::default();
        assert!(state.complete_heading().is_none());
    }

    #[test]
    fn test_table_cells_follow_section_and_column() {
        let mut state = TableState::default();
        state.start(vec![Alignment::None, Alignment::Right]);
        state.start_row();
        assert_eq!(state.cell_tag(), "th");

        state.end_head();
        state.start_row();
        assert_eq!(state.cell_tag(), "td");
        assert_eq!(state.alignment_style(), "");
        state.next_cell();
        assert_eq!(state.alignment_style(), r#" style="text-align:right""#);
        state.next_cell();
        assert_eq!(state.alignment_style(), "");
    }

    #[test]
    fn test_code_block_state() {
        let mut state = CodeBlockState::default();
        state.start(Some("rust".to_owned()));
        state.push_str("fn main() {}\n");
        assert!(state.is_active());

        let (lang, content) = state.end();
        assert_eq!(lang.as_deref(), Some("rust"));
        assert_eq!(content, "fn main() {}\n");
        assert!(!state.is_active());
    }

    #[test]
    fn test_capture_restarts_empty() {
        let mut capture = Capture::default();
        capture.begin();
        capture.push_str("left over");
        capture.begin();
        capture.push_str("alt");

        assert_eq!(capture.finish(), "alt");
        assert!(!capture.is_active());
    }
}
