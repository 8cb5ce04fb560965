//! The standardizer entry point.

use crate::{
    convert,
    errors::StandardizeError,
    identity::{attach, IdentitySources},
    schema::{NativeOutcome, StandardResult},
};
use element_catalog::Catalog;
use identity_resolver::IdentityResolver;
use page_port::PagePort;
use tracing::{debug, info};

/// Messages known to be spurious and dropped before totals are computed.
pub const DEFAULT_DENY_LIST: [&str; 2] = ["Duplicate ID .", "The first occurrence of ID  was here."];

/// The parts of an act record standardization reads.
#[derive(Debug, Clone, Copy)]
pub struct StandardizeInput<'a> {
    pub which: &'a str,
    pub prevented: bool,
    pub outcome: Option<&'a NativeOutcome>,
}

pub struct Standardizer {
    resolver: IdentityResolver,
    deny_list: Vec<String>,
}

impl Default for Standardizer {
    fn default() -> Self {
        Self::new(IdentityResolver::default())
    }
}

impl Standardizer {
    pub fn new(resolver: IdentityResolver) -> Self {
        Self {
            resolver,
            deny_list: DEFAULT_DENY_LIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Convert one act's native output into a standard result.
    ///
    /// A prevented act yields a prevented result without looking at its output.
    /// Self-standardized outcomes are relocated as they are, with totals already rounded
    /// on read; raw outcomes are converted, filtered through the deny list, given element
    /// identities and have their totals recomputed from instance counts.
    pub async fn standardize(
        &self,
        input: StandardizeInput<'_>,
        catalog: Option<&Catalog>,
        page: Option<&dyn PagePort>,
    ) -> Result<StandardResult, StandardizeError> {
        if input.which.is_empty() {
            return Err(StandardizeError::MissingChecker);
        }
        if input.prevented {
            return Ok(StandardResult::prevented());
        }
        let outcome = input
            .outcome
            .ok_or_else(|| StandardizeError::MissingNativeResult(input.which.to_string()))?;

        match outcome {
            NativeOutcome::Standardized(result) => {
                debug!(target: "standardize", which = input.which, "relocating self-standardized result");
                Ok(result.clone())
            }
            NativeOutcome::Raw { kind, payload } => {
                let findings = convert::convert(*kind, payload)?;
                let found = findings.len();
                let sources = IdentitySources {
                    catalog,
                    page,
                    resolver: &self.resolver,
                };
                let mut instances = Vec::with_capacity(found);
                for finding in findings {
                    if self.deny_list.iter().any(|denied| *denied == finding.what) {
                        continue;
                    }
                    instances.push(attach(finding, sources).await);
                }
                let result = StandardResult::with_instances(instances);
                info!(
                    target: "standardize",
                    which = input.which,
                    kind = %kind,
                    instances = result.instances.len(),
                    denied = found - result.instances.len(),
                    totals = ?result.totals,
                    "native result standardized"
                );
                Ok(result)
            }
        }
    }
}
