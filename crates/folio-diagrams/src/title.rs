//! Diagram title extraction.

use std::sync::LazyLock;

use regex::Regex;

/// Title forms in priority order: directive, property, statement.
static TITLE_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"(?i)%%\{\s*title\s*:\s*["']([^"']+)["']\s*\}%%"#).unwrap(),
        Regex::new(r#"(?i)title\s*:\s*["']([^"']+)["']"#).unwrap(),
        Regex::new(r#"(?i)title\s+["']([^"']+)["']"#).unwrap(),
    ]
});

/// Find the title declared in a diagram's source.
///
/// Each line is trimmed and tried against, in order:
///
/// - `%%{ title: "X" }%%`
/// - `title: "X"`
/// - `title "X"`
///
/// Quotes may be single or double and the keyword is case-insensitive. The
/// first line that matches any form wins.
#[must_use]
pub fn extract_title(code: &str) -> Option<String> {
    code.lines().map(str::trim).find_map(|line| {
        TITLE_RES
            .iter()
            .find_map(|re| re.captures(line))
            .map(|caps| caps[1].trim().to_owned())
    })
}
