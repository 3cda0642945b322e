use crate::Result;
use camino::Utf8Path;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Owner of the observed repository
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Name of the observed repository
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Workflow file whose runs are exported
    #[serde(default = "default_workflow_file")]
    pub workflow_file: String,

    /// Event type runs are filtered by
    #[serde(default = "default_event")]
    pub event: String,

    /// Number of historical runs pushed by a backfill
    #[serde(default = "default_backfill_count")]
    pub backfill_count: usize,

    /// Time between poll iterations
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Number of most recent completed runs examined on each poll iteration
    #[serde(default = "default_duration_window")]
    pub duration_window: usize,

    /// Timeout of a single push to the ingestion endpoint
    #[serde(default = "default_push_timeout", with = "humantime_serde")]
    pub push_timeout: Duration,

    /// Timeout of a single GitHub API request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_owner() -> String {
    "AztecProtocol".to_string()
}

fn default_repo() -> String {
    "aztec-packages".to_string()
}

fn default_workflow_file() -> String {
    "ci3.yml".to_string()
}

fn default_event() -> String {
    "merge_group".to_string()
}

const fn default_backfill_count() -> usize {
    10_000
}

const fn default_poll_interval() -> Duration {
    Duration::from_secs(300)
}

const fn default_duration_window() -> usize {
    100
}

const fn default_push_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let Some(path) = config_path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{path}'"))?;
        config.validate()?;

        log::debug!(target: "    config", "Loaded configuration from '{path}'");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a timing value is zero
    fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(app_err!("poll_interval must be greater than zero"));
        }

        if self.push_timeout.is_zero() || self.request_timeout.is_zero() {
            return Err(app_err!(
                "push_timeout and request_timeout must be greater than zero, got {:?} and {:?}",
                self.push_timeout,
                self.request_timeout
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repo: default_repo(),
            workflow_file: default_workflow_file(),
            event: default_event(),
            backfill_count: default_backfill_count(),
            poll_interval: default_poll_interval(),
            duration_window: default_duration_window(),
            push_timeout: default_push_timeout(),
            request_timeout: default_request_timeout(),
        }
    }
}
