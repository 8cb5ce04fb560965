use super::Finding;
use crate::{errors::StandardizeError, severity};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct HtmlcsReport {
    messages: Vec<String>,
}

/// Messages are `Type|code|message|tag|id|html`; the excerpt may itself contain pipes.
/// A message with fewer fields is skipped, not allowed to sink the rest.
pub(super) fn convert(report: HtmlcsReport) -> Result<Vec<Finding>, StandardizeError> {
    let mut findings = Vec::new();
    for line in &report.messages {
        let parts: Vec<&str> = line.splitn(6, '|').collect();
        let [kind, code, message, tag, id, html] = parts[..] else {
            warn!(target: "standardize", line = %line, fields = parts.len(), "skipping htmlcs message without 6 fields");
            continue;
        };
        let Some(severity) = severity::htmlcs_type(kind) else {
            continue;
        };
        let mut finding = Finding::new(code, message, severity).excerpt(html);
        finding.tag_name = tag.to_ascii_lowercase();
        finding.id = id.to_string();
        findings.push(finding);
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(messages: &[&str]) -> HtmlcsReport {
        HtmlcsReport {
            messages: messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn splits_fields() {
        let findings = convert(report(&[
            "Error|WCAG2AA.H37|Img lacks alt|IMG|hero|<img id=\"hero\" title=\"a|b\">",
            "Notice|WCAG2AA.H25|Check title|TITLE||<title>x</title>",
            "Warning|WCAG2AA.G18|Contrast|P||<p>x</p>",
        ]))
        .unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, 2);
        assert_eq!(findings[0].tag_name, "img");
        assert_eq!(findings[0].id, "hero");
        assert_eq!(findings[0].excerpt, "<img id=\"hero\" title=\"a|b\">");
        assert_eq!(findings[1].severity, 0);
    }

    #[test]
    fn short_message_is_skipped() {
        let findings = convert(report(&[
            "Error|WCAG2AA.H37|Img missing alt|img|hero|<img id=\"hero\">",
            "Error|truncated line",
        ]))
        .unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "WCAG2AA.H37");
        assert_eq!(findings[0].id, "hero");
    }
}
