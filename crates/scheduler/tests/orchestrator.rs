use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use accord_core_types::Target;
use accord_scheduler::{
    ActData, ActSpec, ActState, CheckContext, CheckError, CheckReport, Checker, CheckerRegistry,
    JobSettings, JobSpec, Orchestrator, StandardMode,
};
use async_trait::async_trait;
use page_port::fixture::{DomNode, FixtureDocument, FixtureLauncher};
use page_port::{BrowserLauncher, PagePort};
use result_standard::{CheckerKind, NativeOutcome, StandardInstance, StandardResult};
use serde_json::json;

const URL: &str = "https://example.com/";

fn launcher() -> Arc<FixtureLauncher> {
    Arc::new(FixtureLauncher::new(FixtureDocument::from_body(
        URL,
        DomNode::element("body")
            .with_box(0.0, 0.0, 800.0, 600.0)
            .child(
                DomNode::element("img")
                    .attr("src", "a.png")
                    .with_box(0.0, 0.0, 100.0, 100.0),
            )
            .child(DomNode::element("p").with_box(0.0, 110.0, 800.0, 20.0).text("Hi")),
    )))
}

fn orchestrator(launcher: &Arc<FixtureLauncher>, registry: CheckerRegistry) -> Orchestrator {
    let launcher: Arc<dyn BrowserLauncher> = launcher.clone();
    Orchestrator::new(launcher, registry).with_settings(JobSettings {
        retry_backoff: Duration::from_millis(10),
        ..Default::default()
    })
}

fn job(acts: Vec<ActSpec>) -> JobSpec {
    JobSpec::new(Target::new(URL), acts)
}

struct Clean;

#[async_trait]
impl Checker for Clean {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default())))
    }

    fn self_standardizing(&self) -> bool {
        true
    }
}

struct Never;

#[async_trait]
impl Checker for Never {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        std::future::pending::<()>().await;
        Err(CheckError::failed("unreachable"))
    }
}

/// Fails with a closed-page error until its failures are used up.
struct Flaky {
    failures: AtomicU32,
    calls: AtomicU32,
}

impl Flaky {
    fn new(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl Checker for Flaky {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(CheckError::failed(
                "Target page, context or browser has been closed",
            ));
        }
        Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default())))
    }

    fn self_standardizing(&self) -> bool {
        true
    }
}

struct Broken;

#[async_trait]
impl Checker for Broken {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        Err(CheckError::failed("rule engine crashed"))
    }
}

struct Violating;

#[async_trait]
impl Checker for Violating {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        Ok(CheckReport::new(NativeOutcome::standardized(
            StandardResult::with_instances(vec![StandardInstance::new("r", "bad", 2, 1)]),
        )))
    }

    fn self_standardizing(&self) -> bool {
        true
    }
}

struct Closer;

#[async_trait]
impl Checker for Closer {
    async fn run(&self, ctx: CheckContext) -> Result<CheckReport, CheckError> {
        ctx.page.close().await;
        Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default())))
    }
}

struct Blocked;

#[async_trait]
impl Checker for Blocked {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default()))
            .with_data(ActData::prevented("page requires login")))
    }
}

struct WaxReplay;

#[async_trait]
impl Checker for WaxReplay {
    async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
        Ok(CheckReport::new(NativeOutcome::raw(
            CheckerKind::Wax,
            json!({"violations": [
                {"message": "image-alt", "severity": "Severe",
                 "element": "<img src=\"a.png\" data-xpath=\"/html/body/img\">"}
            ]}),
        )))
    }
}

#[tokio::test(start_paused = true)]
async fn hung_checker_times_out_and_job_moves_on() {
    let launcher = launcher();
    let registry = CheckerRegistry::new()
        .with("never", Arc::new(Never))
        .with("clean", Arc::new(Clean));
    let orchestrator = orchestrator(&launcher, registry);

    let started = tokio::time::Instant::now();
    let report = orchestrator
        .run_job(job(vec![
            ActSpec::new("never").with_timeout_secs(1.0),
            ActSpec::new("clean"),
        ]))
        .await;

    let hung = &report.acts[0];
    assert_eq!(hung.state, ActState::TimedOut);
    assert_eq!(hung.totals, [0, 0, 0, 0]);
    assert_eq!(hung.attempts, 1);
    assert!(hung.elapsed_ms >= 1000 && hung.elapsed_ms < 1100);
    assert_eq!(report.job_data.preventions.get("never").map(String::as_str), Some("Timeout"));
    assert_eq!(report.acts[1].state, ActState::Succeeded);
    assert!(started.elapsed() < Duration::from_millis(1100));
    assert_eq!(report.job_data.relaunches, 0);
}

#[tokio::test(start_paused = true)]
async fn timeout_scales_with_multiplier() {
    let launcher = launcher();
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("never", Arc::new(Never)));
    let mut spec = job(vec![ActSpec::new("never").with_timeout_secs(2.0)]);
    spec.timeout_multiplier = Some(0.5);
    let report = orchestrator.run_job(spec).await;
    assert_eq!(report.acts[0].state, ActState::TimedOut);
    assert!(report.acts[0].elapsed_ms < 1100);
}

#[tokio::test]
async fn closed_page_errors_relaunch_and_retry() {
    let launcher = launcher();
    let flaky = Flaky::new(2);
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("flaky", flaky.clone()));
    let report = orchestrator.run_job(job(vec![ActSpec::new("flaky")])).await;

    let act = &report.acts[0];
    assert_eq!(act.state, ActState::Succeeded);
    assert_eq!(act.attempts, 3);
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.job_data.relaunches, 2);
    assert_eq!(launcher.launches(), 3);
    assert!(report.job_data.preventions.is_empty());
}

#[tokio::test]
async fn exhausted_retries_prevent_the_act() {
    let launcher = launcher();
    let flaky = Flaky::new(10);
    let registry = CheckerRegistry::new()
        .with("flaky", flaky.clone())
        .with("clean", Arc::new(Clean));
    let orchestrator = orchestrator(&launcher, registry);
    let report = orchestrator
        .run_job(job(vec![ActSpec::new("flaky"), ActSpec::new("clean")]))
        .await;

    let act = &report.acts[0];
    assert_eq!(act.state, ActState::Prevented);
    assert_eq!(act.attempts, 3);
    assert!(act.data.error.as_deref().unwrap().contains("has been closed"));
    assert_eq!(report.acts[1].state, ActState::Succeeded);
}

#[tokio::test]
async fn other_errors_are_not_retried() {
    let launcher = launcher();
    let registry = CheckerRegistry::new()
        .with("broken", Arc::new(Broken))
        .with("clean", Arc::new(Clean));
    let orchestrator = orchestrator(&launcher, registry);
    let mut spec = job(vec![ActSpec::new("broken"), ActSpec::new("clean")]);
    spec.retries = Some(5);
    let report = orchestrator.run_job(spec).await;

    assert_eq!(report.acts[0].state, ActState::Prevented);
    assert_eq!(report.acts[0].attempts, 1);
    assert_eq!(
        report.job_data.preventions.get("broken").map(String::as_str),
        Some("rule engine crashed")
    );
    assert_eq!(report.acts[1].state, ActState::Succeeded);
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test]
async fn stop_on_fail_halts_remaining_acts() {
    let launcher = launcher();
    let registry = CheckerRegistry::new()
        .with("violating", Arc::new(Violating))
        .with("clean", Arc::new(Clean));
    let orchestrator = orchestrator(&launcher, registry);
    let mut spec = job(vec![ActSpec::new("violating"), ActSpec::new("clean")]);
    spec.stop_on_fail = Some(true);
    let report = orchestrator.run_job(spec).await;

    assert_eq!(report.acts[0].totals, [0, 0, 1, 0]);
    assert_eq!(report.acts[1].state, ActState::Pending);
    assert_eq!(report.job_data.halted_by.as_deref(), Some("violating"));
    assert!(report.job_data.aborted.is_none());
}

#[tokio::test]
async fn unknown_checker_is_prevented() {
    let launcher = launcher();
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("clean", Arc::new(Clean)));
    let report = orchestrator
        .run_job(job(vec![ActSpec::new("alfa"), ActSpec::new("clean")]))
        .await;
    assert_eq!(report.acts[0].state, ActState::Prevented);
    assert!(report.job_data.preventions["alfa"].contains("unknown checker"));
    assert_eq!(report.acts[1].state, ActState::Succeeded);
}

#[tokio::test]
async fn launch_failure_aborts_but_keeps_report() {
    let launcher = launcher();
    launcher.fail_next(3);
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("clean", Arc::new(Clean)));
    let report = orchestrator
        .run_job(job(vec![ActSpec::new("clean"), ActSpec::new("clean")]))
        .await;

    assert_eq!(launcher.launches(), 3);
    assert!(report.job_data.aborted.as_deref().unwrap().contains("3 attempts"));
    assert_eq!(report.acts.len(), 2);
    assert!(report.acts.iter().all(|act| act.state == ActState::Pending));
    assert!(report.job_data.end_time >= report.job_data.start_time);
}

#[tokio::test]
async fn launch_retries_recover() {
    let launcher = launcher();
    launcher.fail_next(2);
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("clean", Arc::new(Clean)));
    let report = orchestrator.run_job(job(vec![ActSpec::new("clean")])).await;
    assert_eq!(report.acts[0].state, ActState::Succeeded);
    assert_eq!(report.job_data.relaunches, 0);
}

#[tokio::test]
async fn unshared_launch_and_closed_page_force_relaunch() {
    let launcher = launcher();
    let registry = CheckerRegistry::new()
        .with("clean", Arc::new(Clean))
        .with("closer", Arc::new(Closer));
    let orchestrator = orchestrator(&launcher, registry);
    let report = orchestrator
        .run_job(job(vec![
            ActSpec::new("clean").unshared(),
            ActSpec::new("clean"),
            ActSpec::new("closer"),
            ActSpec::new("clean"),
        ]))
        .await;

    assert!(report.acts.iter().all(|act| act.state == ActState::Succeeded));
    assert_eq!(report.job_data.relaunches, 2);
    assert_eq!(launcher.launches(), 3);
}

#[tokio::test]
async fn navigation_away_forces_relaunch() {
    struct Wanderer(Arc<FixtureLauncher>);

    #[async_trait]
    impl Checker for Wanderer {
        async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
            if let Some(page) = self.0.last_page() {
                page.navigate("https://elsewhere.example/");
            }
            Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default())))
        }
    }

    let launcher = launcher();
    let registry = CheckerRegistry::new()
        .with("wander", Arc::new(Wanderer(launcher.clone())))
        .with("clean", Arc::new(Clean));
    let orchestrator = orchestrator(&launcher, registry);
    let report = orchestrator
        .run_job(job(vec![ActSpec::new("wander"), ActSpec::new("clean")]))
        .await;
    assert_eq!(report.job_data.relaunches, 1);
}

#[tokio::test]
async fn completed_act_can_report_prevention() {
    let launcher = launcher();
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("blocked", Arc::new(Blocked)));
    let report = orchestrator.run_job(job(vec![ActSpec::new("blocked")])).await;
    let act = &report.acts[0];
    assert_eq!(act.state, ActState::Succeeded);
    assert!(act.data.prevented);
    assert!(act.standard_result.as_ref().unwrap().prevented);
    assert_eq!(
        report.job_data.preventions.get("blocked").map(String::as_str),
        Some("page requires login")
    );
}

#[tokio::test]
async fn raw_outcomes_are_standardized_against_the_catalog() {
    let launcher = launcher();
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("wax", Arc::new(WaxReplay)));
    let report = orchestrator.run_job(job(vec![ActSpec::new("wax")])).await;

    let catalog = report.catalog.as_ref().expect("catalog built for raw checkers");
    let act = &report.acts[0];
    assert_eq!(act.totals, [0, 0, 0, 1]);
    let standard = act.standard_result.as_ref().unwrap();
    assert_eq!(standard.instances[0].catalog_index, catalog.first_by_path("/html/body/img[1]"));
    assert!(act.result.is_some());
}

#[tokio::test]
async fn standard_only_drops_native_and_no_skips_catalog() {
    let launcher = launcher();
    let orchestrator = orchestrator(&launcher, CheckerRegistry::new().with("wax", Arc::new(WaxReplay)));

    let mut only = job(vec![ActSpec::new("wax")]);
    only.standard = Some(StandardMode::Only);
    let report = orchestrator.run_job(only).await;
    assert!(report.acts[0].result.is_none());
    assert!(report.acts[0].standard_result.is_some());

    let mut none = job(vec![ActSpec::new("wax")]);
    none.standard = Some(StandardMode::No);
    let report = orchestrator.run_job(none).await;
    assert!(report.catalog.is_none());
    assert!(report.acts[0].standard_result.is_none());
    assert!(report.acts[0].result.is_some());
}

#[tokio::test]
async fn tool_times_are_sorted_slowest_first() {
    struct Sleeper(u64);

    #[async_trait]
    impl Checker for Sleeper {
        async fn run(&self, _ctx: CheckContext) -> Result<CheckReport, CheckError> {
            tokio::time::sleep(Duration::from_millis(self.0)).await;
            Ok(CheckReport::new(NativeOutcome::standardized(StandardResult::default())))
        }
    }

    let launcher = launcher();
    let registry = CheckerRegistry::new()
        .with("fast", Arc::new(Sleeper(1)))
        .with("slow", Arc::new(Sleeper(40)));
    let orchestrator = orchestrator(&launcher, registry);
    let report = orchestrator
        .run_job(job(vec![ActSpec::new("fast"), ActSpec::new("slow")]))
        .await;
    let order: Vec<&str> = report.job_data.tool_times.iter().map(|t| t.which.as_str()).collect();
    assert_eq!(order, vec!["slow", "fast"]);
}
