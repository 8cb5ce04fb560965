//! Excerpt parsing and CSS identifier escaping.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static START_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)(\s[^>]*)?/?>").expect("start tag pattern")
});
static ID_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).expect("id pattern")
});
static XPATH_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"data-xpath\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("xpath pattern")
});
static ELLIPSIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\.\.|…").expect("ellipsis pattern"));

/// Tag name and id of an excerpt's first start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag {
    pub tag_name: String,
    pub id: Option<String>,
}

/// The longest plain-text run of an HTML excerpt; ellipses split runs and never count.
pub fn excerpt_text(excerpt: &str) -> String {
    let mut best = String::new();
    for piece in TAG.split(excerpt) {
        for run in ELLIPSIS.split(piece) {
            let run = decode_entities(run)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if run.chars().count() > best.chars().count() {
                best = run;
            }
        }
    }
    best
}

pub fn excerpt_start_tag(excerpt: &str) -> Option<StartTag> {
    let caps = START_TAG.captures(excerpt)?;
    let tag_name = caps.get(1)?.as_str().to_ascii_lowercase();
    let id = caps.get(2).and_then(|attrs| {
        ID_ATTR.captures(attrs.as_str()).and_then(|id| {
            id.get(1)
                .or_else(|| id.get(2))
                .or_else(|| id.get(3))
                .map(|m| decode_entities(m.as_str()))
        })
    });
    Some(StartTag { tag_name, id })
}

/// The XPath a checker run injected into the page as a `data-xpath` attribute.
pub fn injected_xpath(excerpt: &str) -> Option<String> {
    let caps = XPATH_ATTR.captures(excerpt)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|path| !path.is_empty())
}

/// Escape an identifier for use in a CSS selector, as `CSS.escape` does.
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());
    for (i, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if c == '\0' {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && c.is_ascii_digit())
            || (i == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_longest_text_run() {
        assert_eq!(
            excerpt_text("<a href=\"/x\"><img alt=\"\">Read   more</a> about it"),
            "Read more"
        );
        assert_eq!(excerpt_text("<p>Short ... a much longer tail</p>"), "a much longer tail");
        assert_eq!(excerpt_text("<div>...</div>"), "");
        assert_eq!(excerpt_text("Fish &amp; chips"), "Fish & chips");
    }

    #[test]
    fn reads_start_tag() {
        let tag = excerpt_start_tag("<INPUT type=\"text\" id='name' data-id=\"x\">").unwrap();
        assert_eq!(tag.tag_name, "input");
        assert_eq!(tag.id.as_deref(), Some("name"));
        let tag = excerpt_start_tag("<p data-id=\"x\">hi</p>").unwrap();
        assert_eq!(tag.id, None);
        assert!(excerpt_start_tag("plain text").is_none());
    }

    #[test]
    fn reads_injected_xpath() {
        let excerpt = "<img src=\"a.png\" data-xpath=\"/html/body/img[2]\">";
        assert_eq!(injected_xpath(excerpt).as_deref(), Some("/html/body/img[2]"));
        assert_eq!(injected_xpath("<img>"), None);
    }

    #[test]
    fn escapes_like_cssom() {
        assert_eq!(css_escape("main"), "main");
        assert_eq!(css_escape("123"), "\\31 23");
        assert_eq!(css_escape("-1a"), "-\\31 a");
        assert_eq!(css_escape("-"), "\\-");
        assert_eq!(css_escape("a.b:c"), "a\\.b\\:c");
        assert_eq!(css_escape("ünï"), "ünï");
    }
}
