use std::collections::BTreeMap;
use std::sync::Arc;

use accord_core_types::Target;
use async_trait::async_trait;
use page_port::PagePort;
use result_standard::NativeOutcome;
use serde_json::Value;

use crate::error::CheckError;
use crate::model::ActData;

/// What a checker sees during one attempt.
///
/// The page is only valid for the duration of the call; a relaunch between attempts
/// hands the next attempt a different page.
#[derive(Clone)]
pub struct CheckContext {
    pub which: String,
    pub page: Arc<dyn PagePort>,
    pub target: Target,
    pub options: Value,
    pub attempt: u32,
}

/// A finished checker run.
#[derive(Clone, Debug)]
pub struct CheckReport {
    pub data: ActData,
    pub outcome: NativeOutcome,
    /// Totals computed by the checker itself, possibly fractional.
    pub totals: Option<[f64; 4]>,
}

impl CheckReport {
    pub fn new(outcome: NativeOutcome) -> Self {
        Self {
            data: ActData::default(),
            outcome,
            totals: None,
        }
    }

    pub fn with_data(mut self, data: ActData) -> Self {
        self.data = data;
        self
    }

    pub fn with_totals(mut self, totals: [f64; 4]) -> Self {
        self.totals = Some(totals);
        self
    }
}

#[async_trait]
pub trait Checker: Send + Sync {
    async fn run(&self, ctx: CheckContext) -> Result<CheckReport, CheckError>;

    /// Whether the checker already emits standard results.
    fn self_standardizing(&self) -> bool {
        false
    }
}

/// Checkers by the name acts refer to them with.
#[derive(Clone, Default)]
pub struct CheckerRegistry {
    checkers: BTreeMap<String, Arc<dyn Checker>>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, which: impl Into<String>, checker: Arc<dyn Checker>) {
        self.checkers.insert(which.into(), checker);
    }

    pub fn with(mut self, which: impl Into<String>, checker: Arc<dyn Checker>) -> Self {
        self.register(which, checker);
        self
    }

    pub fn get(&self, which: &str) -> Option<Arc<dyn Checker>> {
        self.checkers.get(which).cloned()
    }

    pub fn contains(&self, which: &str) -> bool {
        self.checkers.contains_key(which)
    }
}
