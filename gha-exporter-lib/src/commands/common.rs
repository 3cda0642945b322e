//! Arguments and setup shared by every command.

use super::config::Config;
use crate::Result;
use crate::settings::{Settings, WorkflowFile, WorkflowTarget};
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use core::time::Duration;
use ohno::IntoAppError;
use url::Url;

/// Default GitHub REST API base URL
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    #[default]
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by the exporter and the `stats` command
#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// Base URL of the VictoriaMetrics-compatible ingestion backend
    #[arg(long, value_name = "URL", env = "VM_URL", global = true)]
    pub vm_url: Option<String>,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL, global = true)]
    pub github_api_url: String,

    /// Path to a TOML configuration file
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Repository owner (overrides the configuration file)
    #[arg(long, value_name = "OWNER", global = true)]
    pub owner: Option<String>,

    /// Repository name (overrides the configuration file)
    #[arg(long, value_name = "REPO", global = true)]
    pub repo: Option<String>,

    /// Workflow file whose runs are exported (overrides the configuration file)
    #[arg(long, value_name = "FILE", global = true)]
    pub workflow_file: Option<String>,

    /// Number of historical runs pushed by --backfill (overrides the configuration file)
    #[arg(long, value_name = "COUNT", global = true)]
    pub backfill_count: Option<usize>,

    /// Time between poll iterations, e.g. `5m` or `90s` (overrides the configuration file)
    #[arg(long, value_name = "DURATION", value_parser = humantime_serde::re::humantime::parse_duration, global = true)]
    pub poll_interval: Option<Duration>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,
}

impl CommonArgs {
    /// Combine these arguments with the configuration file into the final settings.
    ///
    /// Command-line values win over the configuration file.
    pub fn resolve(&self, config: Config) -> Result<Settings> {
        let ingest_url = self
            .vm_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Url::parse(s).into_app_err_with(|| format!("parsing ingestion URL '{s}'")))
            .transpose()?;

        let settings = Settings {
            github_api_url: self.github_api_url.clone(),
            github_token: self.github_token.clone().filter(|t| !t.is_empty()),
            ingest_url,
            target: WorkflowTarget {
                owner: self.owner.clone().unwrap_or(config.owner),
                repo: self.repo.clone().unwrap_or(config.repo),
                workflow_file: WorkflowFile::new(self.workflow_file.clone().unwrap_or(config.workflow_file)),
                event: config.event,
            },
            backfill_count: self.backfill_count.unwrap_or(config.backfill_count),
            poll_interval: self.poll_interval.unwrap_or(config.poll_interval),
            duration_window: config.duration_window,
            push_timeout: config.push_timeout,
            request_timeout: config.request_timeout,
        };

        validate(&settings)?;
        Ok(settings)
    }
}

fn validate(settings: &Settings) -> Result<()> {
    let target = &settings.target;
    if target.owner.is_empty() || target.repo.is_empty() || target.workflow_file.as_str().is_empty() {
        return Err(ohno::app_err!(
            "owner, repo, and workflow file must not be empty (got '{}/{}', '{}')",
            target.owner,
            target.repo,
            target.workflow_file
        ));
    }

    if settings.poll_interval.is_zero() {
        return Err(ohno::app_err!("poll interval must be greater than zero"));
    }

    Ok(())
}

/// Install the global logger. `RUST_LOG` takes precedence over `log_level`.
pub fn init_logging(log_level: LogLevel) {
    let level = match log_level {
        LogLevel::None => return,
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };

    let env = env_logger::Env::default().filter_or("RUST_LOG", level);

    // A logger may already be installed when running under a test harness
    let _ = env_logger::Builder::from_env(env)
        .format_module_path(false)
        .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> CommonArgs {
        CommonArgs {
            vm_url: Some("http://localhost:8428".to_string()),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            ..CommonArgs::default()
        }
    }

    #[test]
    fn test_resolve_uses_config_defaults() {
        let settings = args().resolve(Config::default()).unwrap();

        assert_eq!(settings.target.owner, "AztecProtocol");
        assert_eq!(settings.target.repo, "aztec-packages");
        assert_eq!(settings.target.workflow_file.as_str(), "ci3.yml");
        assert_eq!(settings.target.event, "merge_group");
        assert_eq!(settings.backfill_count, 10_000);
        assert_eq!(settings.poll_interval, Duration::from_secs(300));
        assert_eq!(settings.duration_window, 100);
        assert_eq!(settings.push_timeout, Duration::from_secs(10));
        assert_eq!(settings.ingest_url.unwrap().as_str(), "http://localhost:8428/");
    }

    #[test]
    fn test_resolve_cli_overrides_config() {
        let args = CommonArgs {
            owner: Some("octo".to_string()),
            repo: Some("hello".to_string()),
            workflow_file: Some("ci.yml".to_string()),
            backfill_count: Some(5),
            poll_interval: Some(Duration::from_secs(30)),
            ..args()
        };

        let settings = args.resolve(Config::default()).unwrap();
        assert_eq!(settings.target.owner, "octo");
        assert_eq!(settings.target.repo, "hello");
        assert_eq!(settings.target.workflow_file.as_str(), "ci.yml");
        assert_eq!(settings.backfill_count, 5);
        assert_eq!(settings.poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_missing_vm_url_is_deferred() {
        let args = CommonArgs { vm_url: None, ..args() };
        let settings = args.resolve(Config::default()).unwrap();
        assert!(settings.ingest_url.is_none());
    }

    #[test]
    fn test_resolve_blank_vm_url_counts_as_missing() {
        let args = CommonArgs {
            vm_url: Some("  ".to_string()),
            ..args()
        };
        assert!(args.resolve(Config::default()).unwrap().ingest_url.is_none());
    }

    #[test]
    fn test_resolve_invalid_vm_url() {
        let args = CommonArgs {
            vm_url: Some("not a url".to_string()),
            ..args()
        };
        let err = args.resolve(Config::default()).unwrap_err();
        assert!(err.to_string().contains("ingestion URL"));
    }

    #[test]
    fn test_resolve_zero_poll_interval() {
        let args = CommonArgs {
            poll_interval: Some(Duration::ZERO),
            ..args()
        };
        assert!(args.resolve(Config::default()).is_err());
    }

    #[test]
    fn test_resolve_empty_token_is_ignored() {
        let args = CommonArgs {
            github_token: Some(String::new()),
            ..args()
        };
        assert!(args.resolve(Config::default()).unwrap().github_token.is_none());
    }
}
