use super::Finding;
use crate::{errors::StandardizeError, severity};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WaveReport {
    categories: BTreeMap<String, WaveCategory>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaveCategory {
    items: BTreeMap<String, WaveItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaveItem {
    id: String,
    description: String,
    count: f64,
    selectors: Vec<String>,
}

pub(super) fn convert(report: WaveReport) -> Result<Vec<Finding>, StandardizeError> {
    let mut findings = Vec::new();
    for (category, body) in report.categories {
        let Some(severity) = severity::wave_category(&category) else {
            continue;
        };
        for (key, item) in body.items {
            let rule_id = if item.id.is_empty() { key } else { item.id };
            if item.selectors.is_empty() {
                let mut summary = Finding::new(&rule_id, &item.description, severity);
                summary.count = if item.count.is_finite() && item.count > 0.0 {
                    item.count.round() as u32
                } else {
                    0
                };
                findings.push(summary);
            } else {
                for selector in &item.selectors {
                    findings.push(Finding::new(&rule_id, &item.description, severity).selector(selector));
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
    fn one_instance_per_selector_or_a_summary() {
        let report: WaveReport = serde_json::from_value(json!({
            "categories": {
                "error": {"items": {"alt_missing": {"id": "alt_missing", "description": "Missing alt", "count": 2,
                    "selectors": ["img:nth-child(1)", "img:nth-child(2)"]}}},
                "alert": {"items": {"redundant_link": {"id": "redundant_link", "description": "Redundant link", "count": 3}}},
                "feature": {"items": {"alt": {"id": "alt", "description": "Alt text", "count": 9}}}
            }
        }))
        .unwrap();
        let findings = convert(report).unwrap();
        assert_eq!(findings.len(), 3);
        let summary = findings.iter().find(|f| f.rule_id == "redundant_link").unwrap();
        assert_eq!((summary.severity, summary.count), (0, 3));
        assert!(summary.location.is_empty());
        assert!(findings.iter().filter(|f| f.rule_id == "alt_missing").all(|f| f.severity == 3));
    }
}
