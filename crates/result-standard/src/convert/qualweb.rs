use super::Finding;
use crate::{errors::StandardizeError, severity};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct QualwebReport {
    modules: BTreeMap<String, QualwebModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QualwebModule {
    assertions: BTreeMap<String, QualwebAssertion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QualwebAssertion {
    name: String,
    description: String,
    results: Vec<QualwebResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QualwebResult {
    verdict: String,
    description: String,
    elements: Vec<QualwebElement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct QualwebElement {
    pointer: String,
    html_code: String,
}

pub(super) fn convert(report: QualwebReport) -> Result<Vec<Finding>, StandardizeError> {
    let mut findings = Vec::new();
    for module in report.modules.into_values() {
        for (code, assertion) in module.assertions {
            for result in &assertion.results {
                let Some(severity) = severity::qualweb_verdict(&result.verdict) else {
                    continue;
                };
                let what = [&result.description, &assertion.description, &assertion.name]
                    .into_iter()
                    .find(|text| !text.is_empty())
                    .cloned()
                    .unwrap_or_default();
                if result.elements.is_empty() {
                    findings.push(Finding::new(&code, &what, severity));
                }
                for element in &result.elements {
                    findings.push(
                        Finding::new(&code, &what, severity)
                            .selector(&element.pointer)
                            .excerpt(&element.html_code),
                    );
                }
            }
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_modules_assertions_and_elements() {
        let report: QualwebReport = serde_json::from_value(json!({
            "modules": {
                "act-rules": {"assertions": {
                    "QW-ACT-R1": {"name": "Title", "description": "Page has a title", "results": [
                        {"verdict": "failed", "description": "No title", "elements": []},
                        {"verdict": "passed", "description": "fine", "elements": [{"pointer": "title"}]}
                    ]}
                }},
                "wcag-techniques": {"assertions": {
                    "QW-WCAG-T1": {"name": "Captions", "description": "", "results": [
                        {"verdict": "warning", "description": "", "elements": [
                            {"pointer": "html > body > table", "htmlCode": "<table>"}
                        ]}
                    ]}
                }}
            }
        }))
        .unwrap();
        let findings = convert(report).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].rule_id, "QW-ACT-R1");
        assert_eq!(findings[0].what, "No title");
        assert_eq!(findings[0].severity, 3);
        assert_eq!(findings[1].what, "Captions");
        assert_eq!(findings[1].severity, 1);
        assert_eq!(findings[1].location.spec, "html > body > table");
    }
}
