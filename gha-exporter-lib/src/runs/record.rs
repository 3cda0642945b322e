//! Normalization of raw workflow run objects into [`RunRecord`]s.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Lifecycle status of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,

    /// Any status GitHub reports that we don't distinguish (`waiting`, `requested`, ...)
    #[serde(other)]
    Other,
}

/// Final outcome of a completed workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    TimedOut,

    #[serde(other)]
    Other,
}

/// A workflow run reduced to the fields the exporter cares about
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: u64,
    pub run_number: u64,
    pub status: RunStatus,
    pub conclusion: Option<Conclusion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// `updated_at - created_at`, only meaningful once the run has completed
    pub duration_seconds: f64,

    pub head_branch: String,

    /// First 8 hex characters of the head commit
    pub short_sha: String,

    pub html_url: String,
    pub event: String,
}

impl RunRecord {
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// A run object that could not be turned into a [`RunRecord`]
#[derive(Debug, thiserror::Error)]
pub enum MalformedRecordError {
    #[error("run record {} has an unexpected shape: {source}", display_id(.id.as_ref()))]
    Shape {
        id: Option<u64>,
        #[source]
        source: serde_json::Error,
    },

    #[error("run {id} is missing `{field}`")]
    MissingTimestamp { id: u64, field: &'static str },

    #[error("run {id} has an unparsable `{field}` value '{value}': {source}")]
    InvalidTimestamp {
        id: u64,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("run {id} was updated at {updated_at} before it was created at {created_at}")]
    UpdatedBeforeCreated {
        id: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    },
}

impl MalformedRecordError {
    /// Identifier of the offending run, if it could be determined
    #[must_use]
    pub const fn run_id(&self) -> Option<u64> {
        match self {
            Self::Shape { id, .. } => *id,
            Self::MissingTimestamp { id, .. } | Self::InvalidTimestamp { id, .. } | Self::UpdatedBeforeCreated { id, .. } => Some(*id),
        }
    }
}

fn display_id(id: Option<&u64>) -> String {
    id.map_or_else(|| "<unknown>".to_string(), |id| id.to_string())
}

/// Raw run object as returned by the GitHub API, with only the fields we read
#[derive(Debug, Deserialize)]
struct RawRun {
    id: u64,
    #[serde(default)]
    run_number: u64,
    status: RunStatus,
    conclusion: Option<Conclusion>,
    created_at: Option<String>,
    updated_at: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    head_branch: Option<String>,
    #[serde(default)]
    head_sha: Option<String>,
    #[serde(default)]
    event: Option<String>,
}

/// Convert a raw run object into a [`RunRecord`].
///
/// Timestamps are RFC 3339 (a trailing `Z` is accepted as UTC). Records with missing or
/// unparsable timestamps, or whose `updated_at` precedes `created_at`, are rejected.
pub fn normalize(raw: &Value) -> Result<RunRecord, MalformedRecordError> {
    let run = RawRun::deserialize(raw).map_err(|source| MalformedRecordError::Shape {
        id: raw.get("id").and_then(Value::as_u64),
        source,
    })?;

    let created_at = parse_timestamp(run.id, "created_at", run.created_at.as_deref())?;
    let updated_at = parse_timestamp(run.id, "updated_at", run.updated_at.as_deref())?;

    let duration_seconds = (updated_at - created_at)
        .to_std()
        .map_err(|_e| MalformedRecordError::UpdatedBeforeCreated {
            id: run.id,
            created_at,
            updated_at,
        })?
        .as_secs_f64();

    Ok(RunRecord {
        id: run.id,
        run_number: run.run_number,
        status: run.status,
        conclusion: run.conclusion,
        created_at,
        updated_at,
        duration_seconds,
        head_branch: run.head_branch.unwrap_or_default(),
        short_sha: run.head_sha.map(|sha| sha.chars().take(8).collect()).unwrap_or_default(),
        html_url: run.html_url.unwrap_or_default(),
        event: run.event.unwrap_or_default(),
    })
}

fn parse_timestamp(id: u64, field: &'static str, value: Option<&str>) -> Result<DateTime<Utc>, MalformedRecordError> {
    let value = value.ok_or(MalformedRecordError::MissingTimestamp { id, field })?;

    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| MalformedRecordError::InvalidTimestamp {
            id,
            field,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_run(created_at: &str, updated_at: &str) -> Value {
        json!({
            "id": 12_345_678_901_u64,
            "run_number": 4321,
            "status": "completed",
            "conclusion": "success",
            "created_at": created_at,
            "updated_at": updated_at,
            "html_url": "https://github.com/AztecProtocol/aztec-packages/actions/runs/12345678901",
            "head_branch": "gh-readonly-queue/next/pr-1234-abcdef",
            "head_sha": "0123456789abcdef0123456789abcdef01234567",
            "event": "merge_group"
        })
    }

    #[test]
    fn test_normalize_complete_record() {
        let record = normalize(&raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:02:00Z")).unwrap();

        assert_eq!(record.id, 12_345_678_901);
        assert_eq!(record.run_number, 4321);
        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.conclusion, Some(Conclusion::Success));
        assert_eq!(record.short_sha, "01234567");
        assert_eq!(record.head_branch, "gh-readonly-queue/next/pr-1234-abcdef");
        assert_eq!(record.event, "merge_group");
        assert!(record.is_completed());
    }

    #[test]
    fn test_normalize_duration_is_exact() {
        let record = normalize(&raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:05:40Z")).unwrap();
        assert_eq!(record.duration_seconds, 340.0);
        assert_eq!(record.duration_minutes(), 340.0 / 60.0);
    }

    #[test]
    fn test_normalize_fractional_duration() {
        let record = normalize(&raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:00:01.5Z")).unwrap();
        assert_eq!(record.duration_seconds, 1.5);
    }

    #[test]
    fn test_normalize_explicit_offset() {
        let record = normalize(&raw_run("2024-01-01T01:00:00+01:00", "2024-01-01T00:01:00Z")).unwrap();
        assert_eq!(record.duration_seconds, 60.0);
        assert_eq!(record.created_at.timestamp(), 1_704_067_200);
    }

    #[test]
    fn test_normalize_zero_duration() {
        let record = normalize(&raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:00:00Z")).unwrap();
        assert_eq!(record.duration_seconds, 0.0);
    }

    #[test]
    fn test_normalize_rejects_clock_skew() {
        let err = normalize(&raw_run("2024-01-01T00:02:00Z", "2024-01-01T00:00:00Z")).unwrap_err();
        assert!(matches!(err, MalformedRecordError::UpdatedBeforeCreated { .. }));
        assert_eq!(err.run_id(), Some(12_345_678_901));
    }

    #[test]
    fn test_normalize_rejects_missing_timestamp() {
        let mut raw = raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:02:00Z");
        let _ = raw.as_object_mut().unwrap().remove("updated_at");

        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, MalformedRecordError::MissingTimestamp { field: "updated_at", .. }));
    }

    #[test]
    fn test_normalize_rejects_null_timestamp() {
        let mut raw = raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:02:00Z");
        raw["created_at"] = Value::Null;

        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, MalformedRecordError::MissingTimestamp { field: "created_at", .. }));
    }

    #[test]
    fn test_normalize_rejects_unparsable_timestamp() {
        let err = normalize(&raw_run("yesterday", "2024-01-01T00:02:00Z")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("created_at"), "{msg}");
        assert!(msg.contains("yesterday"), "{msg}");
        assert!(msg.contains("12345678901"), "{msg}");
    }

    #[test]
    fn test_normalize_rejects_wrong_shape() {
        let err = normalize(&json!({ "id": 7, "status": 42 })).unwrap_err();
        assert!(matches!(err, MalformedRecordError::Shape { id: Some(7), .. }));

        let err = normalize(&json!("not an object")).unwrap_err();
        assert_eq!(err.run_id(), None);
        assert!(err.to_string().contains("<unknown>"));
    }

    #[test]
    fn test_normalize_in_progress_has_no_conclusion() {
        let mut raw = raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z");
        raw["status"] = json!("in_progress");
        raw["conclusion"] = Value::Null;

        let record = normalize(&raw).unwrap();
        assert_eq!(record.status, RunStatus::InProgress);
        assert_eq!(record.conclusion, None);
        assert!(!record.is_completed());
    }

    #[test]
    fn test_normalize_unknown_status_and_conclusion() {
        let mut raw = raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z");
        raw["status"] = json!("waiting");
        raw["conclusion"] = json!("action_required");

        let record = normalize(&raw).unwrap();
        assert_eq!(record.status, RunStatus::Other);
        assert_eq!(record.conclusion, Some(Conclusion::Other));
    }

    #[test]
    fn test_normalize_short_sha_shorter_than_eight() {
        let mut raw = raw_run("2024-01-01T00:00:00Z", "2024-01-01T00:01:00Z");
        raw["head_sha"] = json!("abc");

        let record = normalize(&raw).unwrap();
        assert_eq!(record.short_sha, "abc");
    }

    #[test]
    fn test_conclusion_display() {
        assert_eq!(Conclusion::TimedOut.to_string(), "timed_out");
        assert_eq!(RunStatus::InProgress.to_string(), "in_progress");
    }
}
