use crate::runs::StatusFilter;
use crate::settings::WorkflowFile;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// The metric families this exporter produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::IntoStaticStr)]
pub enum MetricFamily {
    /// Number of runs currently matching a status filter
    #[strum(serialize = "workflow_runs_count")]
    RunsCount,

    /// Wall-clock duration of a completed run
    #[strum(serialize = "workflow_runs_duration_seconds")]
    RunDurationSeconds,
}

impl MetricFamily {
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    #[must_use]
    pub const fn help(self) -> &'static str {
        match self {
            Self::RunsCount => "Number of workflow runs with a given status",
            Self::RunDurationSeconds => "Time from creation to last update of a completed workflow run",
        }
    }
}

/// Label names allowed on a sample.
///
/// The set is closed so high-cardinality values (run ids, shas, branches) have no way in;
/// those belong in an [`Exemplar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum LabelName {
    Status,
    WorkflowFile,
}

/// Low-cardinality label set of a sample
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelSet(BTreeMap<LabelName, String>);

impl LabelSet {
    /// Labels identifying the observed workflow
    #[must_use]
    pub fn for_workflow(workflow: &WorkflowFile) -> Self {
        let mut labels = BTreeMap::new();
        let _ = labels.insert(LabelName::WorkflowFile, workflow.as_str().to_string());
        Self(labels)
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        let _ = self.0.insert(LabelName::Status, status.as_str().to_string());
        self
    }

    #[must_use]
    pub fn get(&self, name: LabelName) -> Option<&str> {
        self.0.get(&name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(name, value)| (<&'static str>::from(*name), value.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// High-cardinality correlation data attached to a sample without creating a new series
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Exemplar(BTreeMap<&'static str, String>);

impl Exemplar {
    /// Exemplar pointing back at a workflow run
    #[must_use]
    pub fn for_run(run_id: u64) -> Self {
        let mut pairs = BTreeMap::new();
        let _ = pairs.insert("run_id", run_id.to_string());
        Self(pairs)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single timestamped, labeled metric value
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    family: MetricFamily,
    value: f64,
    timestamp_millis: i64,
    labels: LabelSet,
    exemplar: Option<Exemplar>,
}

impl MetricSample {
    #[must_use]
    pub const fn family(&self) -> MetricFamily {
        self.family
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.family.name()
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Sample time in milliseconds since the Unix epoch
    #[must_use]
    pub const fn timestamp_millis(&self) -> i64 {
        self.timestamp_millis
    }

    #[must_use]
    pub const fn labels(&self) -> &LabelSet {
        &self.labels
    }

    #[must_use]
    pub const fn exemplar(&self) -> Option<&Exemplar> {
        self.exemplar.as_ref()
    }
}

/// Build a count sample. The timestamp is whatever the caller observed, usually the poll time.
#[must_use]
pub fn build_count_sample(family: MetricFamily, value: f64, timestamp: DateTime<Utc>, labels: LabelSet) -> MetricSample {
    MetricSample {
        family,
        value,
        timestamp_millis: timestamp.timestamp_millis(),
        labels,
        exemplar: None,
    }
}

/// Build a duration sample annotated with an exemplar.
#[must_use]
pub fn build_duration_sample(family: MetricFamily, value: f64, timestamp: DateTime<Utc>, labels: LabelSet, exemplar: Exemplar) -> MetricSample {
    MetricSample {
        family,
        value,
        timestamp_millis: timestamp.timestamp_millis(),
        labels,
        exemplar: Some(exemplar),
    }
}
