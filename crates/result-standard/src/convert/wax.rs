use super::Finding;
use crate::{errors::StandardizeError, severity};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct WaxReport {
    violations: Vec<WaxViolation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WaxViolation {
    message: String,
    severity: String,
    element: Option<String>,
    description: Option<String>,
}

pub(super) fn convert(report: WaxReport) -> Result<Vec<Finding>, StandardizeError> {
    let findings = report
        .violations
        .into_iter()
        .map(|violation| {
            let what = violation
                .description
                .filter(|description| !description.is_empty())
                .unwrap_or_else(|| violation.message.clone());
            Finding::new(&violation.message, what, severity::wax_severity(&violation.severity))
                .excerpt(violation.element.unwrap_or_default())
        })
        .collect();
    Ok(findings)
}
