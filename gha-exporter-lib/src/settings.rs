//! Resolved runtime settings shared by the run source, the metric sink, and the scheduler.

use core::fmt;
use core::time::Duration;
use url::Url;

/// Name of the workflow file whose runs are exported (e.g. `ci3.yml`).
///
/// This is one of the few values allowed as a metric label, so it gets its own type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkflowFile(String);

impl WorkflowFile {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The repository workflow being observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowTarget {
    pub owner: String,
    pub repo: String,
    pub workflow_file: WorkflowFile,

    /// Event type the runs are filtered by (`merge_group` for merge-queue runs)
    pub event: String,
}

/// Settings constructed once at startup and handed to every component.
#[derive(Clone)]
pub struct Settings {
    pub github_api_url: String,
    pub github_token: Option<String>,

    /// Base URL of the VictoriaMetrics-compatible ingestion backend
    pub ingest_url: Option<Url>,

    pub target: WorkflowTarget,

    /// Number of historical runs pushed by a backfill
    pub backfill_count: usize,

    pub poll_interval: Duration,

    /// Number of most-recent completed runs examined on every poll iteration
    pub duration_window: usize,

    pub push_timeout: Duration,
    pub request_timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("github_api_url", &self.github_api_url)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("ingest_url", &self.ingest_url.as_ref().map(Url::as_str))
            .field("target", &self.target)
            .field("backfill_count", &self.backfill_count)
            .field("poll_interval", &self.poll_interval)
            .field("duration_window", &self.duration_window)
            .field("push_timeout", &self.push_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_settings(github_api_url: &str, ingest_url: &str) -> Settings {
    Settings {
        github_api_url: github_api_url.to_string(),
        github_token: None,
        ingest_url: Some(Url::parse(ingest_url).expect("test URL is valid")),
        target: WorkflowTarget {
            owner: "AztecProtocol".to_string(),
            repo: "aztec-packages".to_string(),
            workflow_file: WorkflowFile::new("ci3.yml"),
            event: "merge_group".to_string(),
        },
        backfill_count: 10,
        poll_interval: Duration::from_secs(300),
        duration_window: 100,
        push_timeout: Duration::from_secs(10),
        request_timeout: Duration::from_secs(30),
    }
}
