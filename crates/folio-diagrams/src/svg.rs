//! Post-processing of compiled SVG markup.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static GOOGLE_FONTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@import\s+url\([^)]*fonts\.googleapis\.com[^)]*\)\s*;?").unwrap()
});

static SVG_ROOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").unwrap());

static ID_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sid\s*=\s*"([^"]*)""#).unwrap());

/// Element id given to the root `<svg>` of diagram `id`.
#[must_use]
pub fn svg_element_id(id: &str) -> String {
    format!("m_{id}")
}

/// Strip Google Fonts `@import` rules so the page makes no font requests.
#[must_use]
pub fn strip_google_fonts_import(svg: &str) -> String {
    GOOGLE_FONTS_RE.replace_all(svg, "").into_owned()
}

/// Bind an SVG document to diagram `id`.
///
/// The root element's id becomes `m_{id}`. Engines prefix internal ids
/// (markers, gradients, scoped CSS) with the root id, so every `id="old…"`
/// attribute and `#old…` reference is renamed along with it. A root without
/// an id gets one.
#[must_use]
pub fn bind_svg_id(svg: &str, id: &str) -> String {
    let new_id = svg_element_id(id);
    let Some(root) = SVG_ROOT_RE.find(svg) else {
        return svg.to_owned();
    };

    let old_id = ID_ATTR_RE
        .captures(root.as_str())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|old| !old.is_empty());

    match old_id {
        Some(old) if old == new_id => svg.to_owned(),
        Some(old) => {
            // The old id must end at a non-alphanumeric character, so
            // `#abc` never rewrites a colour such as `#abcdef`.
            let refs = Regex::new(&format!(
                r#"(id="|#){}([^0-9A-Za-z]|$)"#,
                regex::escape(&old)
            ));
            match refs {
                Ok(re) => re
                    .replace_all(svg, |caps: &Captures| {
                        format!("{}{new_id}{}", &caps[1], &caps[2])
                    })
                    .into_owned(),
                Err(_) => svg.to_owned(),
            }
        }
        None => {
            let insert_at = root.start() + "<svg".len();
            let mut out = String::with_capacity(svg.len() + new_id.len() + 6);
            out.push_str(&svg[..insert_at]);
            out.push_str(&format!(r#" id="{new_id}""#));
            out.push_str(&svg[insert_at..]);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_strip_google_fonts_import() {
        let svg = "<svg><style>@import url('https://fonts.googleapis.com/css?family=Roboto');.a{}</style></svg>";
        assert_eq!(strip_google_fonts_import(svg), "<svg><style>.a{}</style></svg>");
    }

    #[test]
    fn test_bind_renames_root_and_references() {
        let svg = concat!(
            r#"<svg id="my-svg" width="10"><style>#my-svg .node{fill:red}</style>"#,
            r#"<marker id="my-svg_arrow"/><path marker-end="url(#my-svg_arrow)"/></svg>"#
        );
        assert_eq!(
            bind_svg_id(svg, "demo-flow"),
            concat!(
                r#"<svg id="m_demo-flow" width="10"><style>#m_demo-flow .node{fill:red}</style>"#,
                r#"<marker id="m_demo-flow_arrow"/><path marker-end="url(#m_demo-flow_arrow)"/></svg>"#
            )
        );
    }

    #[test]
    fn test_bind_leaves_colours_alone() {
        let svg = r#"<svg id="abc"><style>#abc .n{fill:#abcdef;stroke:#abc1}</style></svg>"#;
        assert_eq!(
            bind_svg_id(svg, "p-flow"),
            r#"<svg id="m_p-flow"><style>#m_p-flow .n{fill:#abcdef;stroke:#abc1}</style></svg>"#
        );
    }

    #[test]
    fn test_bind_adds_missing_id() {
        assert_eq!(
            bind_svg_id(r#"<?xml version="1.0"?><svg viewBox="0 0 1 1"></svg>"#, "x"),
            r#"<?xml version="1.0"?><svg id="m_x" viewBox="0 0 1 1"></svg>"#
        );
    }

    #[test]
    fn test_bind_is_stable() {
        let once = bind_svg_id(r#"<svg id="a"></svg>"#, "p-flow");
        assert_eq!(bind_svg_id(&once, "p-flow"), once);
    }

    #[test]
    fn test_bind_without_svg_root() {
        assert_eq!(bind_svg_id("not svg", "x"), "not svg");
    }
}
