//! Copy-button wrapper around rendered code blocks.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::manifest::{InteractiveElement, InteractiveKind};

/// `<pre><code>` pair with an optional `language-X` class.
static CODE_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<pre><code(?: class="language-([^"]*)")?>(.*?)</code></pre>"#).unwrap()
});

/// Language given to blocks without a tag.
const UNTAGGED_LANGUAGE: &str = "text";

const COPY_ICON: &str = r#"<svg width="14" height="14" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" aria-hidden="true"><rect x="9" y="9" width="13" height="13" rx="2" ry="2"></rect><path d="M5 15H4a2 2 0 0 1-2-2V4a2 2 0 0 1 2-2h9a2 2 0 0 1 2 2v1"></path></svg>"#;

/// Wrap every code block of `html` in a header with a language label and a
/// copy button.
///
/// ```text
/// div.code-block-enhanced#{id_prefix}-code-{n}
/// +-- div.code-block-header
/// |   +-- span.code-language
/// |   +-- button.copy-btn[data-action=copy-code][data-target=...]
/// +-- pre > code.language-X
/// ```
///
/// Tagged blocks keep their declared language. Untagged blocks are labelled
/// `TEXT` and gain `class="language-text"`. Wrapper ids count from 1 in
/// document order.
pub fn enhance_code_blocks(html: &str, id_prefix: &str) -> (String, Vec<InteractiveElement>) {
    let mut interactive = Vec::new();

    let enhanced = CODE_BLOCK_RE.replace_all(html, |caps: &Captures| {
        let code = &caps[2];
        let (language, label) = match caps.get(1) {
            Some(lang) if !lang.as_str().is_empty() => {
                (lang.as_str().to_owned(), lang.as_str().to_owned())
            }
            _ => (UNTAGGED_LANGUAGE.to_owned(), UNTAGGED_LANGUAGE.to_uppercase()),
        };

        let id = format!("{id_prefix}-code-{}", interactive.len() + 1);
        let kind = InteractiveKind::CopyCode;

        let mut out = String::with_capacity(code.len() + 640);
        write!(
            out,
            r#"<div class="code-block-enhanced" id="{id}"><div class="code-block-header"><span class="code-language">{label}</span>"#
        )
        .unwrap();
        write!(
            out,
            r#"<button class="copy-btn" type="button" data-action="{}" data-target="{id}" title="Copiar código">{COPY_ICON}<span>Copiar</span></button></div>"#,
            kind.action()
        )
        .unwrap();
        write!(
            out,
            r#"<pre><code class="language-{language}">{code}</code></pre></div>"#
        )
        .unwrap();

        interactive.push(InteractiveElement::new(id, kind));
        out
    });

    (enhanced.into_owned(), interactive)
}
