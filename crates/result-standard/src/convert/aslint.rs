use super::Finding;
use crate::{errors::StandardizeError, severity};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AslintReport {
    rules: BTreeMap<String, AslintRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AslintRule {
    issue_type: String,
    description: String,
    results: Vec<AslintResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AslintResult {
    element: AslintElement,
    selector: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AslintElement {
    html: String,
}

pub(super) fn convert(report: AslintReport) -> Result<Vec<Finding>, StandardizeError> {
    let mut findings = Vec::new();
    for (rule_id, rule) in report.rules {
        let Some(severity) = severity::aslint_issue(&rule.issue_type) else {
            continue;
        };
        for result in &rule.results {
            findings.push(
                Finding::new(&rule_id, &rule.description, severity)
                    .selector(result.selector.as_deref().unwrap_or_default())
                    .excerpt(&result.element.html),
            );
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_each_result() {
        let report: AslintReport = serde_json::from_value(json!({
            "rules": {
                "missing-alt": {"issueType": "error", "description": "No alt", "results": [
                    {"element": {"html": "<img src=\"a\">"}, "selector": "img"},
                    {"element": {"html": "<img src=\"b\">"}}
                ]},
                "lang": {"issueType": "passed", "description": "ok", "results": [{"element": {"html": "<html>"}}]}
            }
        }))
        .unwrap();
        let findings = convert(report).unwrap();
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.severity == 3 && f.rule_id == "missing-alt"));
        assert_eq!(findings[0].location.spec, "img");
        assert!(findings[1].location.is_empty());
        assert_eq!(findings[1].excerpt, "<img src=\"b\">");
    }
}
