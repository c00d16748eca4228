//! Mermaid fence extraction.
//!
//! Titled mermaid fences are lifted out of the markdown before conversion and
//! replaced by `<!--MERMAID:{id}-->` comments. The converter passes raw HTML
//! comments through untouched, so the placeholders survive into the HTML
//! where the injector swaps them for compiled diagrams.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::slug::diagram_id;
use crate::title::extract_title;

/// Fenced block whose info string starts with `mermaid`.
///
/// Tolerates spaces or tabs before the tag, trailing info text, any letter
/// case, and CRLF line endings. The body is matched lazily up to the first
/// closing fence.
static MERMAID_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)```[ \t]*mermaid[^\n]*\r?\n((?s:.*?))\r?\n```").unwrap()
});

/// A diagram lifted out of the markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Source with `\r` removed and surrounding whitespace trimmed.
    pub code: String,
    pub title: String,
    /// Unique within one tokenization pass.
    pub id: String,
}

/// Markdown with diagram fences replaced by placeholders.
#[derive(Clone, Debug, Default)]
pub struct TokenizedMarkdown {
    pub markdown: String,
    /// Extracted diagrams in first-occurrence order.
    pub blocks: Vec<DiagramBlock>,
}

/// Placeholder comment standing in for the diagram `id`.
#[must_use]
pub fn placeholder(id: &str) -> String {
    format!("<!--MERMAID:{id}-->")
}

/// Replace titled mermaid fences in `markdown` with placeholders.
///
/// Fences without a recognisable title stay in the text and later render as
/// ordinary code blocks. Ids come from [`diagram_id`]; if two diagrams in the
/// same document share a title, the later ones get `-2`, `-3`, ... appended.
#[must_use]
pub fn tokenize(markdown: &str, context_id: &str) -> TokenizedMarkdown {
    let mut blocks = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    let replaced = MERMAID_FENCE_RE.replace_all(markdown, |caps: &Captures| {
        let code = caps[1].replace('\r', "").trim().to_owned();
        let Some(title) = extract_title(&code) else {
            return caps[0].to_owned();
        };

        let base_id = diagram_id(context_id, &title);
        let count = seen.entry(base_id.clone()).or_default();
        *count += 1;
        let id = match *count {
            1 => base_id,
            n => format!("{base_id}-{n}"),
        };

        let token = placeholder(&id);
        blocks.push(DiagramBlock { code, title, id });
        token
    });

    TokenizedMarkdown {
        markdown: replaced.into_owned(),
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_titled_fence_becomes_placeholder() {
        let md = "# Title\n\n```mermaid\ntitle \"Flow\"\ngraph TD; A-->B;\n```\n\nafter";
        let out = tokenize(md, "demo");

        assert_eq!(out.markdown, "# Title\n\n<!--MERMAID:demo-flow-->\n\nafter");
        assert_eq!(
            out.blocks,
            vec![DiagramBlock {
                code: "title \"Flow\"\ngraph TD; A-->B;".to_owned(),
                title: "Flow".to_owned(),
                id: "demo-flow".to_owned(),
            }]
        );
    }

    #[test]
    fn test_untitled_fence_is_left_alone() {
        let md = "```mermaid\ngraph TD; A-->B;\n```";
        let out = tokenize(md, "demo");

        assert_eq!(out.markdown, md);
        assert!(out.blocks.is_empty());
    }

    #[test]
    fn test_crlf_and_loose_info_string() {
        let md = "```  Mermaid extra\r\n%%{ title: 'CRLF' }%%\r\ngraph LR\r\n  A-->B\r\n```\r\n";
        let out = tokenize(md, "ctx");

        assert_eq!(out.markdown, "<!--MERMAID:ctx-crlf-->\r\n");
        assert_eq!(out.blocks[0].code, "%%{ title: 'CRLF' }%%\ngraph LR\n  A-->B");
    }

    #[test]
    fn test_tab_before_language_tag() {
        let out = tokenize("```\tmermaid\ntitle \"Tab\"\nA\n```", "c");
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.blocks[0].id, "c-tab");
    }

    #[test]
    fn test_other_languages_untouched() {
        let md = "```rust\ntitle \"not a diagram\"\n```";
        assert_eq!(tokenize(md, "c").markdown, md);
    }

    #[test]
    fn test_blocks_in_order_and_unique() {
        let md = concat!(
            "```mermaid\ntitle \"B\"\ngraph\n```\n",
            "```mermaid\ntitle \"A\"\ngraph\n```\n",
            "```mermaid\ntitle \"B\"\ngraph\n```\n",
            "```mermaid\ngraph\n```\n",
        );
        let out = tokenize(md, "p");

        let ids: Vec<_> = out.blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["p-b", "p-a", "p-b-2"]);
        assert_eq!(out.markdown.matches("<!--MERMAID:").count(), 3);
        assert!(out.markdown.ends_with("```mermaid\ngraph\n```\n"));
    }

    #[test]
    fn test_no_fences() {
        let out = tokenize("plain *text*", "c");
        assert_eq!(out.markdown, "plain *text*");
        assert!(out.blocks.is_empty());
    }
}
