use std::collections::BTreeMap;
use std::time::Duration;

use accord_core_types::{ActId, JobId, Target, Timestamp};
use element_catalog::Catalog;
use result_standard::StandardResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether acts get standardized output, and whether native output is kept beside it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardMode {
    #[default]
    Also,
    Only,
    No,
}

impl StandardMode {
    pub fn standardizes(self) -> bool {
        !matches!(self, StandardMode::No)
    }

    pub fn keeps_native(self) -> bool {
        !matches!(self, StandardMode::Only)
    }
}

impl std::str::FromStr for StandardMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "also" => Ok(StandardMode::Also),
            "only" => Ok(StandardMode::Only),
            "no" => Ok(StandardMode::No),
            other => Err(format!("unknown standard mode '{other}'")),
        }
    }
}

/// A job as written in a job file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub what: String,
    pub target: Target,
    #[serde(default)]
    pub acts: Vec<ActSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_on_fail: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<StandardMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u8>,
}

impl JobSpec {
    pub fn new(target: Target, acts: Vec<ActSpec>) -> Self {
        Self {
            id: None,
            what: String::new(),
            target,
            acts,
            stop_on_fail: None,
            standard: None,
            timeout_multiplier: None,
            retries: None,
        }
    }
}

fn default_timeout_secs() -> f64 {
    60.0
}

fn default_true() -> bool {
    true
}

/// One configured checker invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActSpec {
    pub which: String,
    #[serde(default)]
    pub what: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
    /// Whether the next act may reuse this act's browser launch.
    #[serde(default = "default_true")]
    pub launch_shared: bool,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl ActSpec {
    pub fn new(which: impl Into<String>) -> Self {
        Self {
            which: which.into(),
            what: String::new(),
            timeout_secs: default_timeout_secs(),
            launch_shared: true,
            options: Value::Null,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn unshared(mut self) -> Self {
        self.launch_shared = false;
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

/// Effective job settings: configuration defaults with per-job overrides applied.
#[derive(Clone, Debug, PartialEq)]
pub struct JobSettings {
    pub timeout_multiplier: f64,
    pub retries: u32,
    pub retry_backoff: Duration,
    pub launch_attempts: u32,
    pub stop_on_fail: bool,
    pub standard: StandardMode,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            timeout_multiplier: 1.0,
            retries: 2,
            retry_backoff: Duration::from_millis(1000),
            launch_attempts: 3,
            stop_on_fail: false,
            standard: StandardMode::Also,
        }
    }
}

impl JobSettings {
    pub fn for_job(&self, job: &JobSpec) -> JobSettings {
        let mut settings = self.clone();
        if let Some(multiplier) = job.timeout_multiplier.filter(|m| m.is_finite() && *m > 0.0) {
            settings.timeout_multiplier = multiplier;
        }
        if let Some(retries) = job.retries {
            settings.retries = u32::from(retries);
        }
        if let Some(stop_on_fail) = job.stop_on_fail {
            settings.stop_on_fail = stop_on_fail;
        }
        if let Some(standard) = job.standard {
            settings.standard = standard;
        }
        settings
    }

    /// Configured timeout scaled by the global multiplier.
    pub fn act_timeout(&self, act: &ActSpec) -> Duration {
        let secs = act.timeout_secs * self.timeout_multiplier;
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActState {
    #[default]
    Pending,
    Running,
    Succeeded,
    Prevented,
    TimedOut,
}

impl ActState {
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            ActState::Succeeded | ActState::Prevented | ActState::TimedOut
        )
    }
}

/// Checker-reported facts about the act itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActData {
    #[serde(default)]
    pub prevented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ActData {
    pub fn prevented(error: impl Into<String>) -> Self {
        Self {
            prevented: true,
            error: Some(error.into()),
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// One act as reported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Act {
    pub id: ActId,
    pub which: String,
    #[serde(default)]
    pub what: String,
    pub state: ActState,
    pub data: ActData,
    pub totals: [u32; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_result: Option<StandardResult>,
    pub attempts: u32,
    pub elapsed_ms: u64,
}

impl Act {
    pub fn pending(spec: &ActSpec) -> Self {
        Self {
            id: ActId::new(),
            which: spec.which.clone(),
            what: spec.what.clone(),
            state: ActState::Pending,
            data: ActData::default(),
            totals: [0; 4],
            result: None,
            standard_result: None,
            attempts: 0,
            elapsed_ms: 0,
        }
    }

    /// Settle as prevented with empty totals and instances.
    pub(crate) fn prevent(&mut self, state: ActState, reason: impl Into<String>) {
        let reason = reason.into();
        self.state = state;
        self.data.prevented = true;
        self.data.error = Some(reason);
        self.totals = [0; 4];
        self.standard_result = Some(StandardResult::prevented());
    }

    pub fn has_violations(&self) -> bool {
        self.totals.iter().any(|total| *total > 0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolTime {
    pub which: String,
    pub elapsed_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub elapsed_seconds: f64,
    /// Per-act wall time, slowest first.
    pub tool_times: Vec<ToolTime>,
    /// Prevention reasons keyed by checker.
    pub preventions: BTreeMap<String, String>,
    pub relaunches: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: JobId,
    pub job: JobSpec,
    pub job_data: JobData,
    pub acts: Vec<Act>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,
}

impl Report {
    pub fn act(&self, which: &str) -> Option<&Act> {
        self.acts.iter().find(|act| act.which == which)
    }
}
