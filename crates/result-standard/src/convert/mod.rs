//! Per-checker converters from native payloads to findings.

mod aslint;
mod axe;
mod htmlcs;
mod ibm;
mod nuval;
mod qualweb;
mod wave;
mod wax;

use crate::{errors::StandardizeError, schema::CheckerKind};
use identity_resolver::{Location, LocationKind};
use serde::de::DeserializeOwned;

/// One converted violation before identity attachment.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Finding {
    pub rule_id: String,
    pub what: String,
    pub severity: i8,
    pub count: u32,
    pub excerpt: String,
    pub tag_name: String,
    pub id: String,
    pub location: Location,
    /// XPath reported by the checker itself.
    pub xpath: Option<String>,
}

impl Finding {
    pub fn new(rule_id: impl Into<String>, what: impl Into<String>, severity: i8) -> Self {
        Self {
            rule_id: rule_id.into(),
            what: what.into(),
            severity,
            count: 1,
            ..Default::default()
        }
    }

    pub fn excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    pub fn selector(mut self, selector: &str) -> Self {
        if !selector.trim().is_empty() {
            self.location = Location::selector(selector.trim());
        }
        self
    }

    pub fn located(mut self, kind: LocationKind, spec: impl Into<String>) -> Self {
        self.location = Location::new(kind, spec);
        self
    }
}

pub(crate) fn convert(
    kind: CheckerKind,
    payload: &serde_json::Value,
) -> Result<Vec<Finding>, StandardizeError> {
    match kind {
        CheckerKind::Axe => axe::convert(parse(kind, payload)?),
        CheckerKind::Ibm => ibm::convert(parse(kind, payload)?),
        CheckerKind::Wave => wave::convert(parse(kind, payload)?),
        CheckerKind::Aslint => aslint::convert(parse(kind, payload)?),
        CheckerKind::Qualweb => qualweb::convert(parse(kind, payload)?),
        CheckerKind::Htmlcs => htmlcs::convert(parse(kind, payload)?),
        CheckerKind::NuVal => nuval::convert(parse(kind, payload)?),
        CheckerKind::Wax => wax::convert(parse(kind, payload)?),
    }
}

fn parse<T: DeserializeOwned>(
    kind: CheckerKind,
    payload: &serde_json::Value,
) -> Result<T, StandardizeError> {
    T::deserialize(payload).map_err(|err| StandardizeError::malformed(kind, err))
}
