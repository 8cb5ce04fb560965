use super::Finding;
use crate::{errors::StandardizeError, severity};
use identity_resolver::{excerpt_start_tag, LocationKind};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct NuValReport {
    messages: Vec<NuValMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NuValMessage {
    #[serde(rename = "type")]
    kind: String,
    sub_type: Option<String>,
    message: String,
    extract: Option<String>,
    last_line: Option<u64>,
    first_column: Option<u64>,
}

pub(super) fn convert(report: NuValReport) -> Result<Vec<Finding>, StandardizeError> {
    let findings = report
        .messages
        .into_iter()
        .map(|message| {
            let severity = severity::nu_val(&message.kind, message.sub_type.as_deref());
            let excerpt = message.extract.unwrap_or_default();
            let mut finding = Finding::new(&message.message, &message.message, severity);
            if let Some(start) = excerpt_start_tag(&excerpt) {
                finding.tag_name = start.tag_name;
                finding.id = start.id.unwrap_or_default();
            }
            if let Some(line) = message.last_line {
                let spec = match message.first_column {
                    Some(column) => format!("{line}:{column}"),
                    None => line.to_string(),
                };
                finding = finding.located(LocationKind::Line, spec);
            }
            finding.excerpt(excerpt)
        })
        .collect();
    Ok(findings)
}
