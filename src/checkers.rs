//! Built-in checkers.

use std::sync::Arc;

use accord_scheduler::{ActData, CheckContext, CheckError, CheckReport, Checker, CheckerRegistry};
use async_trait::async_trait;
use page_port::PagePort;
use result_standard::{CheckerKind, NativeOutcome, StandardInstance, StandardResult};
use serde_json::{json, Value};
use tracing::debug;

pub const DOC_TYPE: &str = "docType";
pub const SHOOT: &str = "shoot0";

/// Flags documents without an HTML5 doctype.
pub struct DocTypeChecker;

#[async_trait]
impl Checker for DocTypeChecker {
    async fn run(&self, ctx: CheckContext) -> Result<CheckReport, CheckError> {
        let doctype = ctx.page.doctype().await?;
        let standard = doctype
            .as_deref()
            .is_some_and(|name| name.trim().eq_ignore_ascii_case("html"));
        let instances = if standard {
            Vec::new()
        } else {
            vec![StandardInstance::new(
                DOC_TYPE,
                "Document has no standard HTML doctype",
                3,
                1,
            )]
        };
        Ok(CheckReport::new(NativeOutcome::standardized(
            StandardResult::with_instances(instances),
        ))
        .with_data(ActData::default().with_extra("docType", json!(doctype))))
    }

    fn self_standardizing(&self) -> bool {
        true
    }
}

/// Captures a screenshot and records its size. Finds nothing.
pub struct ShootChecker;

#[async_trait]
impl Checker for ShootChecker {
    async fn run(&self, ctx: CheckContext) -> Result<CheckReport, CheckError> {
        let data = match ctx.page.screenshot().await {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "screenshot captured");
                ActData::default().with_extra("screenshotBytes", json!(bytes.len()))
            }
            Err(err) if err.is_closed_target() => return Err(err.into()),
            Err(err) => ActData::prevented(format!("screenshot failed: {err}")),
        };
        Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default())).with_data(data))
    }

    fn self_standardizing(&self) -> bool {
        true
    }
}

/// Replays a native result captured earlier from an external checker.
#[derive(Clone, Debug)]
pub struct NativeReplayChecker {
    kind: CheckerKind,
    payload: Value,
}

impl NativeReplayChecker {
    pub fn new(kind: CheckerKind, payload: Value) -> Self {
        Self { kind, payload }
    }
}

#[async_trait]
impl Checker for NativeReplayChecker {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        Ok(CheckReport::new(NativeOutcome::raw(
            self.kind,
            self.payload.clone(),
        )))
    }
}

pub fn builtin_registry() -> CheckerRegistry {
    CheckerRegistry::new()
        .with(DOC_TYPE, Arc::new(DocTypeChecker))
        .with(SHOOT, Arc::new(ShootChecker))
}
