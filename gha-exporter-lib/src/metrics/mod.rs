//! Metric samples and their delivery
//!
//! A [`MetricSample`] is a single timestamped value in one of the [`MetricFamily`] series. Labels
//! are restricted to a small closed set ([`LabelSet`]); per-run identifiers travel as an
//! [`Exemplar`] so they never create new series.
//!
//! Samples are rendered with [`encode`] into Prometheus text exposition, each line carrying an
//! explicit millisecond timestamp, and delivered through a [`MetricSink`].

mod exposition;
mod sample;
mod sink;

pub use exposition::{annotate, encode};
pub use sample::{Exemplar, LabelName, LabelSet, MetricFamily, MetricSample, build_count_sample, build_duration_sample};
pub use sink::{MetricSink, PushError, VictoriaMetricsSink};
