//! Class and attribute annotation of opening tags.
//!
//! These are string-level passes over rendered HTML. They only look at
//! opening tags, so escaped text inside `<code>` is never touched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Marker class added to every text-bearing element of rendered markdown.
pub const MARKDOWN_TEXT_CLASS: &str = "markdown-text";

/// Elements that receive [`MARKDOWN_TEXT_CLASS`].
const MARKDOWN_TEXT_TAGS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "ul",
    "ol",
    "li",
    "span",
    "strong",
    "em",
    "table",
    "tr",
    "th",
    "td",
    "a",
    "blockquote",
    "div",
];

/// Opening tag: name, attribute text, optional self-closing slash.
static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([a-zA-Z][a-zA-Z0-9]*)((?:\s[^>]*?)?)(/?)>").unwrap());

/// `class` attribute value, double- or single-quoted.
static CLASS_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static ATTR_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=").unwrap());

/// Add [`MARKDOWN_TEXT_CLASS`] to the text-bearing elements of `html`.
///
/// Idempotent: running it twice yields the same string as running it once.
#[must_use]
pub fn annotate_markdown_text(html: &str) -> String {
    add_class(html, MARKDOWN_TEXT_TAGS, MARKDOWN_TEXT_CLASS)
}

/// Add `class` to every opening tag whose name is in `tags`.
///
/// An existing `class` attribute is extended; a tag that already lists the
/// class is left as is. Tag names are matched case-insensitively.
#[must_use]
pub fn add_class(html: &str, tags: &[&str], class: &str) -> String {
    OPEN_TAG_RE
        .replace_all(html, |caps: &Captures| {
            let (name, attrs, slash) = (&caps[1], &caps[2], &caps[3]);
            if !is_target(name, tags) {
                return caps[0].to_owned();
            }

            let existing = CLASS_ATTR_RE
                .captures(attrs)
                .and_then(|c| c.get(1).or_else(|| c.get(2)));
            match existing {
                Some(existing) if existing.as_str().split_whitespace().any(|c| c == class) => {
                    caps[0].to_owned()
                }
                Some(existing) => {
                    let separator = if existing.as_str().trim().is_empty() {
                        ""
                    } else {
                        " "
                    };
                    let mut attrs = attrs.to_owned();
                    attrs.insert_str(existing.end(), &format!("{separator}{class}"));
                    format!("<{name}{attrs}{slash}>")
                }
                None => format!(r#"<{name}{attrs} class="{class}"{slash}>"#),
            }
        })
        .into_owned()
}

/// Set `attr="value"` on every opening tag named `tag` that lacks `attr`.
#[must_use]
pub fn add_attribute(html: &str, tag: &str, attr: &str, value: &str) -> String {
    OPEN_TAG_RE
        .replace_all(html, |caps: &Captures| {
            let (name, attrs, slash) = (&caps[1], &caps[2], &caps[3]);
            let present = ATTR_NAME_RE
                .captures_iter(attrs)
                .any(|c| c[1].eq_ignore_ascii_case(attr));
            if !name.eq_ignore_ascii_case(tag) || present {
                return caps[0].to_owned();
            }
            format!(r#"<{name}{attrs} {attr}="{value}"{slash}>"#)
        })
        .into_owned()
}

fn is_target(name: &str, tags: &[&str]) -> bool {
    tags.iter().any(|t| t.eq_ignore_ascii_case(name))
}
