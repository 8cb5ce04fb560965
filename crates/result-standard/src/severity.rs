//! Severity vocabularies.
//!
//! Each function maps a checker's own severity word to an ordinal. `None` means the
//! record is not a violation at all (a pass, a notice) and is dropped; `Some(-1)` means
//! the word is not recognized.

pub const UNMAPPED: i8 = -1;

pub fn axe_impact(impact: &str) -> i8 {
    match impact {
        "minor" => 0,
        "moderate" => 1,
        "serious" => 2,
        "critical" => 3,
        _ => UNMAPPED,
    }
}

/// Incomplete axe results are never rated above 1.
pub fn axe_incomplete_impact(impact: &str) -> i8 {
    match axe_impact(impact) {
        UNMAPPED => UNMAPPED,
        ordinal => ordinal.min(1),
    }
}

pub fn ibm_level(level: &str) -> Option<i8> {
    match level {
        "pass" => None,
        "violation" => Some(3),
        "potentialviolation" => Some(2),
        "recommendation" => Some(1),
        "potentialrecommendation" | "manual" => Some(0),
        _ => Some(UNMAPPED),
    }
}

pub fn wave_category(category: &str) -> Option<i8> {
    match category {
        "error" => Some(3),
        "contrast" => Some(2),
        "alert" => Some(0),
        _ => None,
    }
}

pub fn aslint_issue(issue_type: &str) -> Option<i8> {
    match issue_type {
        "passed" => None,
        "info" => Some(0),
        "warning" => Some(1),
        "error" => Some(3),
        _ => Some(UNMAPPED),
    }
}

pub fn qualweb_verdict(verdict: &str) -> Option<i8> {
    match verdict {
        "passed" | "inapplicable" => None,
        "warning" => Some(1),
        "failed" => Some(3),
        _ => Some(UNMAPPED),
    }
}

pub fn htmlcs_type(kind: &str) -> Option<i8> {
    match kind {
        "Notice" => None,
        "Warning" => Some(0),
        "Error" => Some(2),
        _ => Some(UNMAPPED),
    }
}

pub fn nu_val(kind: &str, sub_type: Option<&str>) -> i8 {
    match (kind, sub_type) {
        ("info", Some("warning")) => 1,
        ("info", _) => 0,
        ("error", _) => 2,
        ("non-document-error", _) => 3,
        _ => UNMAPPED,
    }
}

pub fn wax_severity(severity: &str) -> i8 {
    match severity {
        "Minor" => 0,
        "Moderate" => 1,
        "Severe" => 3,
        _ => UNMAPPED,
    }
}
