//! Chat bubble styling.

use folio_renderer::{add_attribute, add_class};

use crate::links::CHAT_LINK_CLASS;

const CHAT_CLASSES: &[(&[&str], &str)] = &[
    (&["a"], CHAT_LINK_CLASS),
    (&["p"], "chat-paragraph"),
    (&["strong"], "chat-strong"),
    (&["em"], "chat-em"),
    (&["ul", "ol"], "chat-list"),
    (&["li"], "chat-list-item"),
];

/// Add chat classes next to existing ones and open links in a new tab.
///
/// Idempotent.
#[must_use]
pub fn apply_chat_styles(html: &str) -> String {
    let mut out = CHAT_CLASSES
        .iter()
        .fold(html.to_owned(), |acc, (tags, class)| add_class(&acc, tags, class));
    out = add_attribute(&out, "a", "target", "_blank");
    add_attribute(&out, "a", "rel", "noopener noreferrer")
}
