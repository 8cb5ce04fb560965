use super::Finding;
use crate::{errors::StandardizeError, severity};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AxeReport {
    violations: Vec<AxeRule>,
    incomplete: Vec<AxeRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AxeRule {
    id: String,
    help: String,
    impact: Option<String>,
    nodes: Vec<AxeNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AxeNode {
    target: Vec<serde_json::Value>,
    html: String,
    impact: Option<String>,
}

impl AxeNode {
    /// The innermost selector; shadow-DOM targets nest selectors in arrays.
    fn selector(&self) -> String {
        match self.target.first() {
            Some(serde_json::Value::String(selector)) => selector.clone(),
            Some(serde_json::Value::Array(chain)) => chain
                .last()
                .and_then(|s| s.as_str())
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

pub(super) fn convert(report: AxeReport) -> Result<Vec<Finding>, StandardizeError> {
    let mut findings = Vec::new();
    let groups: [(Vec<AxeRule>, fn(&str) -> i8); 2] = [
        (report.violations, severity::axe_impact),
        (report.incomplete, severity::axe_incomplete_impact),
    ];
    for (rules, rate) in groups {
        for rule in rules {
            for node in &rule.nodes {
                let impact = node
                    .impact
                    .as_deref()
                    .or(rule.impact.as_deref())
                    .unwrap_or_default();
                findings.push(
                    Finding::new(&rule.id, &rule.help, rate(impact))
                        .selector(&node.selector())
                        .excerpt(&node.html),
                );
            }
        }
    }
    Ok(findings)
}
