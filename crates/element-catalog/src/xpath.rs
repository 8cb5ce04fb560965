//! XPath canonicalization.
//!
//! Different extraction paths disagree on whether singleton steps carry a `[1]`
//! subscript. The canonical form subscripts every step except `html` and `body`.

/// Canonicalize an absolute XPath so that equivalent paths compare equal.
pub fn normalize(xpath: &str) -> String {
    let path = xpath.strip_prefix(".//").unwrap_or(xpath);
    if path.is_empty() {
        return String::new();
    }
    if path == "/" {
        return "/html".to_string();
    }
    path.split('/')
        .map(|segment| match segment {
            "html[1]" => "html".to_string(),
            "body[1]" => "body".to_string(),
            "" | "html" | "body" => segment.to_string(),
            _ if segment.ends_with(']') => segment.to_string(),
            _ => format!("{segment}[1]"),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// True when `path` lies inside the document `head`.
pub fn is_under_head(path: &str) -> bool {
    path == "/html/head" || path.starts_with("/html/head[") || path.starts_with("/html/head/")
}

/// True when `descendant` equals `ancestor` or lies below it.
pub fn is_descendant_or_self(ancestor: &str, descendant: &str) -> bool {
    descendant == ancestor
        || (descendant.len() > ancestor.len()
            && descendant.starts_with(ancestor)
            && descendant.as_bytes()[ancestor.len()] == b'/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_documented_cases() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("/"), "/html");
        assert_eq!(normalize("/html[1]/body[1]/div"), "/html/body/div[1]");
        assert_eq!(normalize(".//main/p[3]"), "main[1]/p[3]");
        assert_eq!(normalize("/html/body/ul[2]/li"), "/html/body/ul[2]/li[1]");
        assert_eq!(normalize("/html/head/title"), "/html/head[1]/title[1]");
    }

    #[test]
    fn head_and_containment_checks() {
        assert!(is_under_head("/html/head[1]/title[1]"));
        assert!(!is_under_head("/html/header[1]"));
        assert!(is_descendant_or_self("/html/body/div[1]", "/html/body/div[1]/span[1]"));
        assert!(is_descendant_or_self("/html/body", "/html/body"));
        assert!(!is_descendant_or_self("/html/body/div[1]", "/html/body/div[10]"));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(path in "(\\.//)?(/?[a-z]{1,4}(\\[[1-9]\\])?){0,6}/?") {
            let once = normalize(&path);
            prop_assert_eq!(normalize(&once), once);
        }
    }
}
