//! Accord configuration: YAML file, then `ACCORD_*` environment overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use accord_scheduler::{JobSettings, StandardMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

pub const ENV_TIMEOUT_MULTIPLIER: &str = "ACCORD_TIMEOUT_MULTIPLIER";
pub const ENV_RETRIES: &str = "ACCORD_RETRIES";
pub const ENV_STOP_ON_FAIL: &str = "ACCORD_STOP_ON_FAIL";
pub const ENV_STANDARD: &str = "ACCORD_STANDARD";
pub const ENV_LOG_LEVEL: &str = "ACCORD_LOG_LEVEL";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccordConfig {
    pub timeout_multiplier: f64,
    pub retries: u8,
    pub retry_backoff_ms: u64,
    pub launch_attempts: u32,
    pub path_timeout_ms: u64,
    pub stop_on_fail: bool,
    pub standard: StandardMode,
    pub log_level: String,
}

impl Default for AccordConfig {
    fn default() -> Self {
        Self {
            timeout_multiplier: 1.0,
            retries: 2,
            retry_backoff_ms: 1000,
            launch_attempts: 3,
            path_timeout_ms: 500,
            stop_on_fail: false,
            standard: StandardMode::Also,
            log_level: "info".to_string(),
        }
    }
}

impl AccordConfig {
    pub fn job_settings(&self) -> JobSettings {
        JobSettings {
            timeout_multiplier: if self.timeout_multiplier.is_finite() && self.timeout_multiplier > 0.0 {
                self.timeout_multiplier
            } else {
                1.0
            },
            retries: u32::from(self.retries),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            launch_attempts: self.launch_attempts.max(1),
            stop_on_fail: self.stop_on_fail,
            standard: self.standard,
        }
    }

    pub fn path_timeout(&self) -> Duration {
        Duration::from_millis(self.path_timeout_ms)
    }

    /// Apply `ACCORD_*` variables. Values that do not parse are ignored and described in
    /// the returned list, since this runs before logging is up.
    pub fn apply_env_overrides(&mut self) -> Vec<String> {
        let mut ignored = Vec::new();
        if let Some(value) = env_parse::<f64>(ENV_TIMEOUT_MULTIPLIER, &mut ignored) {
            if value.is_finite() && value > 0.0 {
                self.timeout_multiplier = value;
            } else {
                ignored.push(format!("{ENV_TIMEOUT_MULTIPLIER}={value}: must be positive"));
            }
        }
        if let Some(value) = env_parse::<u8>(ENV_RETRIES, &mut ignored) {
            self.retries = value;
        }
        if let Some(value) = env_parse::<bool>(ENV_STOP_ON_FAIL, &mut ignored) {
            self.stop_on_fail = value;
        }
        if let Some(value) = env_parse::<StandardMode>(ENV_STANDARD, &mut ignored) {
            self.standard = value;
        }
        if let Ok(value) = env::var(ENV_LOG_LEVEL) {
            if !value.trim().is_empty() {
                self.log_level = value.trim().to_string();
            }
        }
        ignored
    }
}

fn env_parse<T>(var: &str, ignored: &mut Vec<String>) -> Option<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(err) => {
            ignored.push(format!("{var}={raw}: {err}"));
            None
        }
    }
}

pub struct LoadedConfig {
    pub config: AccordConfig,
    pub path: PathBuf,
    pub found: bool,
    /// Environment overrides that were present but unusable.
    pub ignored_overrides: Vec<String>,
}

/// Where the configuration is read from when no path is given.
pub fn default_config_path() -> PathBuf {
    // Priority: ./config/accord.yaml > <config dir>/accord/config.yaml
    let local = PathBuf::from("config/accord.yaml");
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("accord");
            path.push("config.yaml");
            path
        }
        None => local,
    }
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path);

    let (mut config, found) = if fs::try_exists(&path).await.unwrap_or(false) {
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let config: AccordConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        (config, true)
    } else {
        (AccordConfig::default(), false)
    };
    let ignored_overrides = config.apply_env_overrides();
    Ok(LoadedConfig {
        config,
        path,
        found,
        ignored_overrides,
    })
}

impl LoadedConfig {
    /// Report where the configuration came from, once logging is up.
    pub fn log_source(&self) {
        if self.found {
            info!("Loaded configuration from: {}", self.path.display());
        } else {
            warn!("Config file not found, using defaults: {}", self.path.display());
        }
        for ignored in &self.ignored_overrides {
            warn!(entry = %ignored, "ignoring unusable environment override");
        }
    }
}
