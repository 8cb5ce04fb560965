use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use accord_core_types::{now, JobId, Target};
use element_catalog::Catalog;
use futures::FutureExt;
use identity_resolver::IdentityResolver;
use page_port::{BrowserLauncher, PageError, PageEvent, PagePort};
use result_standard::{round_totals, NativeOutcome, StandardResult, StandardizeInput, Standardizer};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::checker::{CheckContext, CheckReport, Checker, CheckerRegistry};
use crate::error::{CheckError, SchedulerError};
use crate::metrics;
use crate::model::{Act, ActSpec, ActState, JobData, JobSettings, JobSpec, Report, ToolTime};
use crate::retry::{retry_with, RetryPolicy};

/// Prevention reason recorded for acts that outlive their timeout.
pub const TIMEOUT_REASON: &str = "Timeout";

/// Drives one job's acts, in order, against a shared page.
pub struct Orchestrator {
    launcher: Arc<dyn BrowserLauncher>,
    registry: CheckerRegistry,
    standardizer: Standardizer,
    settings: JobSettings,
}

/// The browser state crossing act boundaries. Only the orchestrator replaces the page.
#[derive(Default)]
struct Session {
    page: Option<Arc<dyn PagePort>>,
    events: Option<broadcast::Receiver<PageEvent>>,
    stale: bool,
    launches: u32,
    relaunches: u32,
}

impl Session {
    fn needs_launch(&self) -> bool {
        match &self.page {
            Some(page) => self.stale || page.is_closed(),
            None => true,
        }
    }

    /// Open this act's event receiver.
    fn listen(&mut self) {
        self.events = self.page.as_ref().map(|page| page.subscribe());
    }

    /// Deregister the act's receiver, noting whether the page died or wandered off.
    fn drain_events(&mut self, target: &Target) {
        let Some(mut events) = self.events.take() else {
            return;
        };
        loop {
            match events.try_recv() {
                Ok(PageEvent::Closed) => self.stale = true,
                Ok(PageEvent::NavigationCommitted { url }) => {
                    if url != target.url {
                        debug!(target: "scheduler", url = %url, "page navigated away from target");
                        self.stale = true;
                    }
                }
                Err(TryRecvError::Lagged(_)) => self.stale = true,
                Err(_) => break,
            }
        }
    }
}

enum ActFailure {
    TimedOut,
    Check(CheckError),
    Launch(SchedulerError),
}

impl ActFailure {
    fn is_retryable(&self) -> bool {
        matches!(self, ActFailure::Check(err) if err.is_retryable())
    }
}

impl fmt::Display for ActFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActFailure::TimedOut => f.write_str(TIMEOUT_REASON),
            ActFailure::Check(err) => write!(f, "{err}"),
            ActFailure::Launch(err) => write!(f, "{err}"),
        }
    }
}

/// State handed to each attempt of one act.
struct Attempt<'o> {
    orchestrator: &'o Orchestrator,
    session: &'o mut Session,
    settings: &'o JobSettings,
    target: &'o Target,
    spec: &'o ActSpec,
    checker: Arc<dyn Checker>,
    timeout: Duration,
}

impl Attempt<'_> {
    async fn run(&mut self, attempt: u32) -> Result<CheckReport, ActFailure> {
        if attempt > 1 || self.session.needs_launch() {
            self.orchestrator
                .launch(self.session, self.target, self.settings)
                .await
                .map_err(ActFailure::Launch)?;
            self.session.listen();
        }
        let page = self.session.page.clone().ok_or_else(|| {
            ActFailure::Check(CheckError::Page(PageError::closed()))
        })?;
        let ctx = CheckContext {
            which: self.spec.which.clone(),
            page,
            target: self.target.clone(),
            options: self.spec.options.clone(),
            attempt,
        };
        debug!(target: "scheduler", which = %self.spec.which, attempt, "running act");
        match tokio::time::timeout(self.timeout, self.checker.run(ctx)).await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(err)) => {
                if err.is_closed_target() {
                    self.session.stale = true;
                }
                Err(ActFailure::Check(err))
            }
            Err(_) => Err(ActFailure::TimedOut),
        }
    }
}

struct LaunchState<'o> {
    launcher: &'o dyn BrowserLauncher,
    target: &'o Target,
}

impl Orchestrator {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, registry: CheckerRegistry) -> Self {
        Self {
            launcher,
            registry,
            standardizer: Standardizer::new(IdentityResolver::default()),
            settings: JobSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: JobSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_standardizer(mut self, standardizer: Standardizer) -> Self {
        self.standardizer = standardizer;
        self
    }

    /// Run every act of `job` and report. The report is returned even when acts are
    /// prevented, time out, or the browser cannot be launched at all.
    pub async fn run_job(&self, job: JobSpec) -> Report {
        let settings = self.settings.for_job(&job);
        let id = job.id.clone().map(JobId).unwrap_or_default();
        let start_time = now();
        let clock = Instant::now();
        info!(
            target: "scheduler",
            job = %id,
            url = %job.target.url,
            acts = job.acts.len(),
            "job started"
        );

        let mut acts: Vec<Act> = job.acts.iter().map(Act::pending).collect();
        let mut session = Session::default();
        let mut catalog: Option<Catalog> = None;
        let mut catalog_attempted = false;
        let wants_catalog = settings.standard.standardizes()
            && job.acts.iter().any(|spec| {
                self.registry
                    .get(&spec.which)
                    .is_some_and(|checker| !checker.self_standardizing())
            });
        let mut halted_by = None;
        let mut aborted = None;

        for (index, spec) in job.acts.iter().enumerate() {
            let act = &mut acts[index];
            let Some(checker) = self.registry.get(&spec.which) else {
                warn!(target: "scheduler", which = %spec.which, "no such checker");
                act.prevent(ActState::Prevented, format!("unknown checker '{}'", spec.which));
                metrics::record_prevented();
                continue;
            };

            if session.needs_launch() {
                if let Err(err) = self.launch(&mut session, &job.target, &settings).await {
                    error!(target: "scheduler", job = %id, error = %err, "job aborted");
                    aborted = Some(err.to_string());
                    break;
                }
            }
            if wants_catalog && !catalog_attempted {
                catalog_attempted = true;
                catalog = self.build_catalog(&session).await;
            }

            let outcome = self
                .run_act(act, spec, checker, &mut session, &job.target, &settings, catalog.as_ref())
                .await;
            session.drain_events(&job.target);
            if !spec.launch_shared {
                session.stale = true;
            }
            if let Err(err) = outcome {
                error!(target: "scheduler", job = %id, error = %err, "job aborted");
                aborted = Some(err.to_string());
                break;
            }
            if settings.stop_on_fail && act.has_violations() {
                info!(target: "scheduler", which = %spec.which, totals = ?act.totals, "stopping on failure");
                halted_by = Some(spec.which.clone());
                break;
            }
        }

        if let Some(page) = session.page.take() {
            page.close().await;
        }

        let mut tool_times: Vec<ToolTime> = acts
            .iter()
            .filter(|act| act.state.is_settled())
            .map(|act| ToolTime {
                which: act.which.clone(),
                elapsed_ms: act.elapsed_ms,
            })
            .collect();
        tool_times.sort_by(|a, b| b.elapsed_ms.cmp(&a.elapsed_ms));
        let preventions: BTreeMap<String, String> = acts
            .iter()
            .filter(|act| act.data.prevented)
            .map(|act| {
                let reason = act.data.error.clone().unwrap_or_else(|| "prevented".to_string());
                (act.which.clone(), reason)
            })
            .collect();

        let end_time = now().max(start_time);
        let job_data = JobData {
            start_time,
            end_time,
            elapsed_seconds: clock.elapsed().as_secs_f64(),
            tool_times,
            preventions,
            relaunches: session.relaunches,
            halted_by,
            aborted,
        };
        info!(
            target: "scheduler",
            job = %id,
            elapsed_seconds = job_data.elapsed_seconds,
            prevented = job_data.preventions.len(),
            relaunches = job_data.relaunches,
            "job finished"
        );
        Report {
            id,
            job,
            job_data,
            acts,
            catalog,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_act(
        &self,
        act: &mut Act,
        spec: &ActSpec,
        checker: Arc<dyn Checker>,
        session: &mut Session,
        target: &Target,
        settings: &JobSettings,
        catalog: Option<&Catalog>,
    ) -> Result<(), SchedulerError> {
        act.state = ActState::Running;
        metrics::record_started();
        let started = Instant::now();
        session.listen();

        let policy = RetryPolicy::new(settings.retries, settings.retry_backoff);
        let mut attempt = Attempt {
            orchestrator: self,
            session,
            settings,
            target,
            spec,
            checker,
            timeout: settings.act_timeout(spec),
        };
        let outcome = retry_with(&mut attempt, &policy, ActFailure::is_retryable, |state, n| {
            state.run(n).boxed()
        })
        .await;
        let session = attempt.session;
        act.attempts = outcome.attempts;

        let mut fatal = None;
        match outcome.result {
            Ok(report) => {
                act.state = ActState::Succeeded;
                self.settle(act, report, settings, catalog, session.page.as_deref())
                    .await;
                metrics::record_succeeded();
                if act.data.prevented {
                    warn!(
                        target: "scheduler",
                        which = %spec.which,
                        reason = act.data.error.as_deref().unwrap_or_default(),
                        "act completed but reported prevention"
                    );
                }
            }
            Err(ActFailure::TimedOut) => {
                warn!(target: "scheduler", which = %spec.which, timeout_ms = settings.act_timeout(spec).as_millis() as u64, "act timed out");
                act.prevent(ActState::TimedOut, TIMEOUT_REASON);
                metrics::record_timed_out();
            }
            Err(ActFailure::Check(err)) => {
                warn!(target: "scheduler", which = %spec.which, attempts = act.attempts, error = %err, "act prevented");
                act.prevent(ActState::Prevented, err.to_string());
                metrics::record_prevented();
            }
            Err(ActFailure::Launch(err)) => {
                act.prevent(ActState::Prevented, err.to_string());
                metrics::record_prevented();
                fatal = Some(err);
            }
        }
        act.elapsed_ms = started.elapsed().as_millis() as u64;
        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Merge a finished checker run into its act and standardize it.
    async fn settle(
        &self,
        act: &mut Act,
        report: CheckReport,
        settings: &JobSettings,
        catalog: Option<&Catalog>,
        page: Option<&dyn PagePort>,
    ) {
        act.data = report.data;
        let own_totals = report.totals.map(round_totals).or(match &report.outcome {
            NativeOutcome::Standardized(result) => Some(result.totals),
            NativeOutcome::Raw { .. } => None,
        });
        if let Some(totals) = own_totals {
            act.totals = totals;
        }

        if settings.standard.standardizes() {
            let input = StandardizeInput {
                which: &act.which,
                prevented: act.data.prevented,
                outcome: Some(&report.outcome),
            };
            let standard = match self.standardizer.standardize(input, catalog, page).await {
                Ok(standard) => standard,
                Err(err) => {
                    warn!(target: "standardize", which = %act.which, error = %err, "standardization failed");
                    StandardResult::default()
                }
            };
            if own_totals.is_none() {
                act.totals = standard.totals;
            }
            act.standard_result = Some(standard);
        }
        if settings.standard.keeps_native() {
            act.result = Some(report.outcome.native_value());
        }
    }

    async fn launch(
        &self,
        session: &mut Session,
        target: &Target,
        settings: &JobSettings,
    ) -> Result<(), SchedulerError> {
        if let Some(old) = session.page.take() {
            old.close().await;
        }
        session.events = None;
        let policy = RetryPolicy::new(
            settings.launch_attempts.saturating_sub(1),
            settings.retry_backoff,
        );
        let mut state = LaunchState {
            launcher: self.launcher.as_ref(),
            target,
        };
        let outcome = retry_with(&mut state, &policy, |_: &PageError| true, |state, _| {
            async move { state.launcher.launch(state.target).await }.boxed()
        })
        .await;
        let page = outcome.result.map_err(|source| SchedulerError::LaunchFailed {
            attempts: outcome.attempts,
            source,
        })?;

        if session.launches > 0 {
            session.relaunches += 1;
            metrics::record_relaunch();
            info!(target: "scheduler", relaunches = session.relaunches, "browser relaunched");
        } else {
            debug!(target: "scheduler", url = %target.url, attempts = outcome.attempts, "browser launched");
        }
        session.launches += 1;
        session.page = Some(page);
        session.stale = false;
        Ok(())
    }

    async fn build_catalog(&self, session: &Session) -> Option<Catalog> {
        let page = session.page.as_ref()?;
        match element_catalog::build(page.as_ref()).await {
            Ok(catalog) => Some(catalog),
            Err(err) => {
                warn!(target: "catalog", error = %err, "catalog build failed; instances fall back to paths");
                None
            }
        }
    }
}
