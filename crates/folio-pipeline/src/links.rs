//! Contact links for chat answers.
//!
//! Assistant answers mention emails, LinkedIn and GitHub profiles, WhatsApp
//! links and Brazilian phone numbers as plain text. These passes turn them
//! into anchors. Labelled mentions (`Email: a@b.com`) are handled first and
//! keep their label; bare mentions follow and are skipped when the same
//! target is already linked or when they sit inside a tag or an anchor.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Class carried by every anchor these passes create.
pub const CHAT_LINK_CLASS: &str = "chat-link";

const EMAIL: &str = r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+";
const PHONE: &str = r"\+55\s?\d{2}\s?\d{4,5}-?\d{4}";
/// URL tail: stops at whitespace and markup, never ends on punctuation.
const URL_TAIL: &str = r#"[^\s<>"{}|\\^`\[\]]*[^\s<>"{}|\\^`\[\].,;:!?)]"#;

/// A labelled mention: the label, its URL pattern and how to link it.
struct Labelled {
    label: &'static str,
    target: String,
    link: fn(&str) -> (String, String),
}

static LABELLED: LazyLock<Vec<Labelled>> = LazyLock::new(|| {
    vec![
        Labelled {
            label: "Email",
            target: EMAIL.to_owned(),
            link: |email| (format!("mailto:{email}"), "Email".to_owned()),
        },
        Labelled {
            label: "LinkedIn",
            target: format!(r"(?:https?://)?(?:www\.)?linkedin\.com/{URL_TAIL}"),
            link: |url| (linkedin_url(url), "LinkedIn".to_owned()),
        },
        Labelled {
            label: "GitHub",
            target: format!(r"(?:https?://)?(?:www\.)?github\.com/{URL_TAIL}"),
            link: |url| (with_scheme(url), "GitHub".to_owned()),
        },
        Labelled {
            label: "WhatsApp",
            target: format!(r"(?:https?://)?(?:wa\.me|api\.whatsapp\.com)/{URL_TAIL}"),
            link: |url| (with_scheme(url), "WhatsApp".to_owned()),
        },
        Labelled {
            label: "Telefone|Celular",
            target: PHONE.to_owned(),
            link: |phone| (whatsapp_url(phone), phone.to_owned()),
        },
    ]
});

/// HTML form: `<strong>` or `**` around the label.
static LABELLED_HTML_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LABELLED
        .iter()
        .map(|l| {
            Regex::new(&format!(
                r"(?i)(<strong[^>]*>|\*\*)?({}):(</strong>|\*\*)?\s*({})",
                l.label, l.target
            ))
            .unwrap()
        })
        .collect()
});

/// Markdown form: optional `**` around the label.
static LABELLED_MD_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    LABELLED
        .iter()
        .map(|l| {
            Regex::new(&format!(
                r"(?i)(\*\*)?({}):(\*\*)?[ \t]*({})",
                l.label, l.target
            ))
            .unwrap()
        })
        .collect()
});

static BARE_EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(EMAIL).unwrap());

static BARE_LINKEDIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:https?://)?(?:www\.)?linkedin\.com/{URL_TAIL}")).unwrap()
});

static BARE_GITHUB_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:https?://)?(?:www\.)?github\.com/{URL_TAIL}")).unwrap()
});

static BARE_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(PHONE).unwrap());

/// Turn labelled contact mentions in markdown into markdown links.
///
/// `**Email:** a@b.com` becomes `**Email:** [Email](mailto:a@b.com)`.
#[must_use]
pub fn link_contacts_markdown(markdown: &str) -> String {
    let mut out = markdown.to_owned();
    for (re, labelled) in LABELLED_MD_RES.iter().zip(LABELLED.iter()) {
        out = re
            .replace_all(&out, |caps: &Captures| {
                let (href, text) = (labelled.link)(&caps[4]);
                format!(
                    "{}{}:{} [{text}]({href})",
                    opt(caps, 1),
                    &caps[2],
                    opt(caps, 3)
                )
            })
            .into_owned();
    }
    out
}

/// Turn contact mentions in rendered HTML into anchors.
#[must_use]
pub fn link_contacts(html: &str) -> String {
    let mut out = html.to_owned();

    for (re, labelled) in LABELLED_HTML_RES.iter().zip(LABELLED.iter()) {
        out = replace_outside_links(&out, re, |caps| {
            let (href, text) = (labelled.link)(&caps[4]);
            let (open, close) = match (opt(caps, 1), opt(caps, 3)) {
                ("**", _) => ("<strong>", "</strong>"),
                (open, close) => (open, close),
            };
            Some(format!("{open}{}:{close} {}", &caps[2], anchor(&href, &text)))
        });
    }

    let snapshot = out.clone();
    out = replace_outside_links(&out, &BARE_EMAIL_RE, |caps| {
        let href = format!("mailto:{}", &caps[0]);
        (!has_href(&snapshot, &href)).then(|| anchor(&href, "Email"))
    });

    let snapshot = out.clone();
    out = replace_outside_links(&out, &BARE_LINKEDIN_RE, |caps| {
        let href = linkedin_url(&caps[0]);
        (!has_href(&snapshot, &href) && !has_href(&snapshot, &caps[0]))
            .then(|| anchor(&href, "LinkedIn"))
    });

    let snapshot = out.clone();
    out = replace_outside_links(&out, &BARE_GITHUB_RE, |caps| {
        let href = with_scheme(&caps[0]);
        (!has_href(&snapshot, &href) && !has_href(&snapshot, &caps[0]))
            .then(|| anchor(&href, "GitHub"))
    });

    let snapshot = out.clone();
    replace_outside_links(&out, &BARE_PHONE_RE, |caps| {
        let href = whatsapp_url(&caps[0]);
        (!has_href(&snapshot, &href)).then(|| anchor(&href, &caps[0]))
    })
}

/// Replace matches of `re` that are not inside a tag or an anchor.
///
/// `link` returning `None` leaves the match as written.
fn replace_outside_links<F>(html: &str, re: &Regex, link: F) -> String
where
    F: Fn(&Captures) -> Option<String>,
{
    re.replace_all(html, |caps: &Captures| {
        let start = caps.get(0).map_or(0, |m| m.start());
        if inside_tag_or_anchor(html, start) {
            return caps[0].to_owned();
        }
        link(caps).unwrap_or_else(|| caps[0].to_owned())
    })
    .into_owned()
}

fn inside_tag_or_anchor(html: &str, pos: usize) -> bool {
    let before = &html[..pos];
    if before.rfind('<') > before.rfind('>') {
        return true;
    }
    let last_open = before.rfind("<a ").max(before.rfind("<a>"));
    last_open > before.rfind("</a>")
}

fn has_href(html: &str, href: &str) -> bool {
    html.contains(&format!(r#"href="{href}""#))
}

fn anchor(href: &str, text: &str) -> String {
    format!(r#"<a href="{href}" class="{CHAT_LINK_CLASS}">{text}</a>"#)
}

fn opt<'c>(caps: &'c Captures, group: usize) -> &'c str {
    caps.get(group).map_or("", |m| m.as_str())
}

fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_owned()
    } else {
        format!("https://{url}")
    }
}

fn linkedin_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") || url.starts_with("www.") {
        with_scheme(url)
    } else {
        format!("https://www.{url}")
    }
}

fn whatsapp_url(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("https://wa.me/{digits}")
}
