use super::Finding;
use crate::{errors::StandardizeError, severity};
use identity_resolver::LocationKind;
use page_port::BoundingBox;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct IbmReport {
    results: Vec<IbmResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IbmResult {
    rule_id: String,
    level: String,
    message: String,
    path: IbmPath,
    snippet: String,
    bounds: Option<IbmBounds>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IbmPath {
    dom: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IbmBounds {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

pub(super) fn convert(report: IbmReport) -> Result<Vec<Finding>, StandardizeError> {
    let findings = report
        .results
        .into_iter()
        .filter_map(|result| {
            let severity = severity::ibm_level(&result.level)?;
            let mut finding =
                Finding::new(&result.rule_id, &result.message, severity).excerpt(&result.snippet);
            if let Some(bounds) = result.bounds {
                let bounds = BoundingBox::new(bounds.left, bounds.top, bounds.width, bounds.height);
                if bounds.has_area() {
                    finding = finding.located(LocationKind::Box, bounds.box_id());
                }
            }
            if !result.path.dom.is_empty() {
                finding.xpath = Some(result.path.dom);
            }
            Some(finding)
        })
        .collect();
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn skips_passes_and_keeps_evidence() {
        let report: IbmReport = serde_json::from_value(json!({
            "results": [
                {"ruleId": "img_alt_valid", "level": "violation", "message": "Alt missing",
                 "path": {"dom": "/html[1]/body[1]/img[1]"}, "snippet": "<img>",
                 "bounds": {"left": 1.4, "top": 2.6, "width": 30, "height": 40}},
                {"ruleId": "html_lang", "level": "pass", "message": "ok", "path": {"dom": "/html[1]"}},
                {"ruleId": "odd", "level": "mystery", "message": "?"}
            ]
        }))
        .unwrap();
        let findings = convert(report).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].severity, 3);
        assert_eq!(findings[0].xpath.as_deref(), Some("/html[1]/body[1]/img[1]"));
        assert_eq!(findings[0].location.spec, "1:3:30:40");
        assert_eq!(findings[1].severity, -1);
    }
}
