//! Accord job orchestration.
//!
//! A job is an ordered list of acts, one checker invocation each, run strictly one at a
//! time against a shared page. The [`Orchestrator`] races each act against its timeout,
//! relaunches the browser when the page dies, retries closed-page failures with backoff
//! and standardizes every act's output into the job [`Report`].

pub mod checker;
pub mod error;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod retry;

pub use checker::{CheckContext, CheckReport, Checker, CheckerRegistry};
pub use error::{CheckError, SchedulerError};
pub use model::{
    Act, ActData, ActSpec, ActState, JobData, JobSettings, JobSpec, Report, StandardMode,
    ToolTime,
};
pub use orchestrator::Orchestrator;
pub use retry::{retry_with, RetryOutcome, RetryPolicy};
