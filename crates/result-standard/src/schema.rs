//! The shared result schema every checker is converted into.

use identity_resolver::Location;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Checkers whose native output needs conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckerKind {
    #[serde(rename = "axe")]
    Axe,
    #[serde(rename = "ibm")]
    Ibm,
    #[serde(rename = "wave")]
    Wave,
    #[serde(rename = "aslint")]
    Aslint,
    #[serde(rename = "qualweb")]
    Qualweb,
    #[serde(rename = "htmlcs")]
    Htmlcs,
    #[serde(rename = "nuVal")]
    NuVal,
    #[serde(rename = "wax")]
    Wax,
}

impl CheckerKind {
    pub const ALL: [CheckerKind; 8] = [
        CheckerKind::Axe,
        CheckerKind::Ibm,
        CheckerKind::Wave,
        CheckerKind::Aslint,
        CheckerKind::Qualweb,
        CheckerKind::Htmlcs,
        CheckerKind::NuVal,
        CheckerKind::Wax,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerKind::Axe => "axe",
            CheckerKind::Ibm => "ibm",
            CheckerKind::Wave => "wave",
            CheckerKind::Aslint => "aslint",
            CheckerKind::Qualweb => "qualweb",
            CheckerKind::Htmlcs => "htmlcs",
            CheckerKind::NuVal => "nuVal",
            CheckerKind::Wax => "wax",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a checker hands back: either already standard, or raw output to convert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum NativeOutcome {
    Standardized(StandardResult),
    Raw {
        kind: CheckerKind,
        payload: serde_json::Value,
    },
}

impl NativeOutcome {
    pub fn standardized(result: StandardResult) -> Self {
        NativeOutcome::Standardized(result)
    }

    pub fn raw(kind: CheckerKind, payload: serde_json::Value) -> Self {
        NativeOutcome::Raw { kind, payload }
    }

    /// The native result as it should appear in the report.
    pub fn native_value(&self) -> serde_json::Value {
        match self {
            NativeOutcome::Standardized(result) => {
                serde_json::to_value(result).unwrap_or(serde_json::Value::Null)
            }
            NativeOutcome::Raw { payload, .. } => payload.clone(),
        }
    }
}

/// One violation, or one summary count, in standard form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardInstance {
    #[serde(rename = "ruleID")]
    pub rule_id: String,
    pub what: String,
    /// 0 (least severe) to 3, or -1 when the checker's vocabulary is unrecognized
    pub ordinal_severity: i8,
    #[serde(deserialize_with = "rounded_count")]
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_index: Option<usize>,
    #[serde(rename = "pathID", default, skip_serializing_if = "Option::is_none")]
    pub path_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(rename = "boxID", default, skip_serializing_if = "Option::is_none")]
    pub box_id: Option<String>,
}

impl StandardInstance {
    pub fn new(rule_id: impl Into<String>, what: impl Into<String>, ordinal_severity: i8, count: u32) -> Self {
        Self {
            rule_id: rule_id.into(),
            what: what.into(),
            ordinal_severity,
            count,
            ..Default::default()
        }
    }

    /// Whether a specific element was identified.
    pub fn is_identified(&self) -> bool {
        self.catalog_index.is_some() || self.path_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardResult {
    #[serde(default)]
    pub prevented: bool,
    #[serde(default, deserialize_with = "rounded_totals")]
    pub totals: [u32; 4],
    #[serde(default)]
    pub instances: Vec<StandardInstance>,
}

impl StandardResult {
    pub fn prevented() -> Self {
        Self {
            prevented: true,
            ..Default::default()
        }
    }

    pub fn with_instances(instances: Vec<StandardInstance>) -> Self {
        let mut result = Self {
            instances,
            ..Default::default()
        };
        result.recompute_totals();
        result
    }

    /// Set each total to the summed count of instances at that severity.
    pub fn recompute_totals(&mut self) {
        let mut totals = [0u32; 4];
        for instance in &self.instances {
            if let Ok(severity) = usize::try_from(instance.ordinal_severity) {
                if let Some(slot) = totals.get_mut(severity) {
                    *slot = slot.saturating_add(instance.count);
                }
            }
        }
        self.totals = totals;
    }

    pub fn has_violations(&self) -> bool {
        self.totals.iter().any(|total| *total > 0)
    }
}

/// Round checker-estimated totals, which may be fractional or negative noise.
pub fn round_totals(raw: [f64; 4]) -> [u32; 4] {
    raw.map(round_count)
}

fn round_count(raw: f64) -> u32 {
    if raw.is_finite() && raw > 0.0 {
        raw.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

fn rounded_totals<'de, D>(deserializer: D) -> Result<[u32; 4], D::Error>
where
    D: Deserializer<'de>,
{
    let raw = <[f64; 4]>::deserialize(deserializer)?;
    Ok(round_totals(raw))
}

fn rounded_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(round_count(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn instance_uses_report_field_names() {
        let mut instance = StandardInstance::new("image-alt", "Images need alt text", 3, 1);
        instance.catalog_index = Some(4);
        let value = serde_json::to_value(&instance).unwrap();
        assert_eq!(
            value,
            json!({
                "ruleID": "image-alt",
                "what": "Images need alt text",
                "ordinalSeverity": 3,
                "count": 1,
                "catalogIndex": 4
            })
        );
    }

    #[test]
    fn fractional_totals_round_on_read() {
        let result: StandardResult = serde_json::from_value(json!({
            "prevented": false,
            "totals": [0.4, 1.6, 2.5, -3.0],
            "instances": [{"ruleID": "x", "what": "y", "ordinalSeverity": 1, "count": 2.2}]
        }))
        .unwrap();
        assert_eq!(result.totals, [0, 2, 3, 0]);
        assert_eq!(result.instances[0].count, 2);
    }

    #[test]
    fn unmapped_severity_stays_out_of_totals() {
        let result = StandardResult::with_instances(vec![
            StandardInstance::new("a", "A", 0, 2),
            StandardInstance::new("b", "B", 3, 1),
            StandardInstance::new("c", "C", -1, 5),
        ]);
        assert_eq!(result.totals, [2, 0, 0, 1]);
        assert!(result.has_violations());
    }

    #[test]
    fn checker_kind_names() {
        assert_eq!(CheckerKind::from_name("nuVal"), Some(CheckerKind::NuVal));
        assert_eq!(serde_json::to_value(CheckerKind::Htmlcs).unwrap(), json!("htmlcs"));
        assert_eq!(CheckerKind::from_name("alfa"), None);
    }
}
