//! Process setup and job plumbing shared by the CLI commands.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use accord_scheduler::{CheckerRegistry, JobSpec, Orchestrator, Report};
use anyhow::{bail, Context, Result};
use identity_resolver::IdentityResolver;
use page_port::fixture::{FixtureDocument, FixtureLauncher};
use page_port::BrowserLauncher;
use result_standard::{CheckerKind, Standardizer};
use tokio::fs;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::checkers::{builtin_registry, NativeReplayChecker};
use crate::config::AccordConfig;

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

/// Read a job file; `.yaml`/`.yml` parse as YAML, anything else as JSON.
pub async fn load_job(path: &Path) -> Result<JobSpec> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading job {}", path.display()))?;
    let job: JobSpec = if is_yaml(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing job {}", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parsing job {}", path.display()))?
    };
    if job.target.url.trim().is_empty() {
        bail!("job {} has no target url", path.display());
    }
    Ok(job)
}

pub async fn load_page(path: &Path) -> Result<FixtureDocument> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading page {}", path.display()))?;
    let document = if is_yaml(path) {
        serde_yaml::from_str(&raw).with_context(|| format!("parsing page {}", path.display()))?
    } else {
        serde_json::from_str(&raw).with_context(|| format!("parsing page {}", path.display()))?
    };
    Ok(document)
}

/// Parse a `which=file.json` replay argument.
pub fn parse_native_arg(arg: &str) -> Result<(String, std::path::PathBuf)> {
    let Some((which, file)) = arg.split_once('=') else {
        bail!("expected which=file, got '{arg}'");
    };
    if which.trim().is_empty() || file.trim().is_empty() {
        bail!("expected which=file, got '{arg}'");
    }
    Ok((which.trim().to_string(), file.trim().into()))
}

/// Load replayed native payloads, keyed by the checker they stand in for.
pub async fn load_natives(args: &[String]) -> Result<BTreeMap<String, NativeReplayChecker>> {
    let mut natives = BTreeMap::new();
    for arg in args {
        let (which, file) = parse_native_arg(arg)?;
        let Some(kind) = CheckerKind::from_name(&which) else {
            bail!("no converter for checker '{which}'");
        };
        let raw = fs::read_to_string(&file)
            .await
            .with_context(|| format!("reading native result {}", file.display()))?;
        let payload: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing native result {}", file.display()))?;
        natives.insert(which, NativeReplayChecker::new(kind, payload));
    }
    Ok(natives)
}

/// Built-in checkers plus replayed ones.
pub fn registry_with(natives: BTreeMap<String, NativeReplayChecker>) -> CheckerRegistry {
    natives
        .into_iter()
        .fold(builtin_registry(), |registry, (which, checker)| {
            registry.with(which, Arc::new(checker))
        })
}

pub fn build_orchestrator(
    config: &AccordConfig,
    launcher: Arc<dyn BrowserLauncher>,
    registry: CheckerRegistry,
) -> Orchestrator {
    Orchestrator::new(launcher, registry)
        .with_settings(config.job_settings())
        .with_standardizer(Standardizer::new(IdentityResolver::new(config.path_timeout())))
}

/// Run `job` against an in-memory fixture page.
pub async fn run_fixture_job(
    config: &AccordConfig,
    job: JobSpec,
    document: FixtureDocument,
    registry: CheckerRegistry,
) -> Report {
    let launcher: Arc<dyn BrowserLauncher> = Arc::new(FixtureLauncher::new(document));
    let orchestrator = build_orchestrator(config, launcher, registry);
    let report = orchestrator.run_job(job).await;
    info!(
        job = %report.id,
        acts = report.acts.len(),
        elapsed = %humantime::format_duration(std::time::Duration::from_millis(
            (report.job_data.elapsed_seconds * 1000.0) as u64
        )),
        "report ready"
    );
    let counters = accord_scheduler::metrics::snapshot();
    debug!(
        started = counters.started,
        succeeded = counters.succeeded,
        prevented = counters.prevented,
        timed_out = counters.timed_out,
        relaunches = counters.relaunches,
        "scheduler counters"
    );
    report
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_args_split_on_equals() {
        let (which, file) = parse_native_arg("axe=out/axe.json").unwrap();
        assert_eq!(which, "axe");
        assert_eq!(file, std::path::PathBuf::from("out/axe.json"));
        assert!(parse_native_arg("axe").is_err());
        assert!(parse_native_arg("=x.json").is_err());
    }

    #[tokio::test]
    async fn job_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("job.yaml");
        std::fs::write(
            &yaml,
            "target:\n  url: https://example.com/\nacts:\n  - which: docType\n    timeoutSecs: 5\n",
        )
        .unwrap();
        let job = load_job(&yaml).await.unwrap();
        assert_eq!(job.acts[0].which, "docType");
        assert_eq!(job.acts[0].timeout_secs, 5.0);

        let json = dir.path().join("job.json");
        std::fs::write(&json, r#"{"target": {"url": ""}, "acts": []}"#).unwrap();
        assert!(load_job(&json).await.is_err());
    }
}
