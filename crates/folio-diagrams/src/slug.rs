//! Deterministic diagram identifiers.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static DIACRITIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Diacritic}+").unwrap());

/// Normalize text into an identifier segment.
///
/// Lowercases, decomposes accented letters and drops every diacritic
/// (combining marks and spacing ones such as `^` or `´`), collapses every run of characters outside `[a-z0-9]` into one `-`, and
/// strips leading and trailing dashes.
///
/// ```
/// use folio_diagrams::slug;
///
/// assert_eq!(slug("Fluxo de Autenticação"), "fluxo-de-autenticacao");
/// assert_eq!(slug("  --Step 1!-- "), "step-1");
/// ```
#[must_use]
pub fn slug(text: &str) -> String {
    let decomposed: String = text.to_lowercase().nfd().collect();
    let stripped = DIACRITIC_RE.replace_all(&decomposed, "");

    let mut result = String::with_capacity(stripped.len());
    let mut pending_dash = false;

    for c in stripped.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !result.is_empty() {
                result.push('-');
            }
            pending_dash = false;
            result.push(c);
        } else {
            pending_dash = true;
        }
    }

    result
}

/// Identifier of a diagram: `slug(context_id) + "-" + slug(title)`.
///
/// Pure and deterministic, so the same document rendered twice in the same
/// context yields the same ids.
#[must_use]
pub fn diagram_id(context_id: &str, title: &str) -> String {
    format!("{}-{}", slug(context_id), slug(title))
}
