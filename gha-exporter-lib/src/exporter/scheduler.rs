use super::{DedupLedger, Ticker};
use crate::metrics::{
    Exemplar, LabelSet, MetricFamily, MetricSample, MetricSink, build_count_sample, build_duration_sample,
};
use crate::runs::{FetchError, RunQuery, RunRecord, RunSource, StatusFilter, UpstreamError, count_runs, fetch_all};
use crate::settings::{Settings, WorkflowFile};
use chrono::{DateTime, Utc};
use core::fmt;
use core::pin::pin;
use futures_util::StreamExt;
use futures_util::future::join_all;
use strum::IntoEnumIterator;

const LOG_TARGET: &str = "  exporter";

/// Outcome of a backfill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub pushed: usize,
    pub push_failures: usize,
    pub malformed: usize,

    /// Runs that were not completed or whose duration was already pushed
    pub skipped: usize,
}

impl fmt::Display for BackfillSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} duration sample(s) pushed, {} push failure(s), {} malformed run(s), {} skipped",
            self.pushed, self.push_failures, self.malformed, self.skipped
        )
    }
}

/// Outcome of one poll iteration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationSummary {
    pub counts_pushed: usize,

    /// Statuses whose count could not be fetched or pushed
    pub count_failures: usize,

    pub durations_pushed: usize,
    pub duration_failures: usize,
    pub malformed: usize,

    /// Whether listing the recent completed runs failed part-way
    pub window_failed: bool,
}

impl fmt::Display for IterationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} count(s) pushed ({} failed), {} new duration(s) pushed ({} failed), {} malformed run(s)",
            self.counts_pushed, self.count_failures, self.durations_pushed, self.duration_failures, self.malformed
        )?;

        if self.window_failed {
            write!(f, ", recent-run listing failed")?;
        }

        Ok(())
    }
}

/// Drives run collection and metric delivery for a single workflow.
///
/// Duration samples are pushed at least once per run and deduplicated through the
/// [`DedupLedger`]: a run is only marked seen after its sample was accepted by the sink,
/// so a failed push is retried on the next poll iteration.
#[derive(Debug)]
pub struct Exporter<S, K> {
    source: S,
    sink: K,
    workflow: WorkflowFile,
    event: String,
    duration_window: usize,
    ledger: DedupLedger,
}

impl<S, K> Exporter<S, K>
where
    S: RunSource + Sync,
    K: MetricSink + Sync,
{
    #[must_use]
    pub fn new(source: S, sink: K, settings: &Settings) -> Self {
        Self {
            source,
            sink,
            workflow: settings.target.workflow_file.clone(),
            event: settings.target.event.clone(),
            duration_window: settings.duration_window,
            ledger: DedupLedger::new(),
        }
    }

    #[must_use]
    pub const fn ledger(&self) -> &DedupLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn sink(&self) -> &K {
        &self.sink
    }

    /// Push one duration sample for each of up to `count` historical completed runs.
    ///
    /// Malformed runs and isolated push failures are counted and skipped. A failure to fetch a
    /// page ends the backfill with an error.
    pub async fn backfill(&mut self, count: usize) -> Result<BackfillSummary, UpstreamError> {
        log::info!(target: LOG_TARGET, "Backfilling up to {count} completed {} run(s) of {}", self.event, self.workflow);

        let query = RunQuery::new(self.event.as_str(), Some(StatusFilter::Completed));
        let mut runs = pin!(fetch_all(&self.source, &query, count));
        let mut summary = BackfillSummary::default();

        while let Some(item) = runs.next().await {
            let run = match item {
                Ok(run) => run,
                Err(FetchError::Malformed(e)) => {
                    log::warn!(target: LOG_TARGET, "Skipping malformed run: {e}");
                    summary.malformed += 1;
                    continue;
                }
                Err(FetchError::Upstream(e)) => return Err(e),
            };

            let id = run.id.to_string();
            if !run.is_completed() || self.ledger.seen(&id) {
                summary.skipped += 1;
                continue;
            }

            match self.sink.push(&[self.duration_sample(&run)]).await {
                Ok(()) => {
                    let _ = self.ledger.mark_seen(id);
                    summary.pushed += 1;
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not push duration of run {}: {e}", run.id);
                    summary.push_failures += 1;
                }
            }

            if summary.pushed > 0 && summary.pushed.is_multiple_of(1000) {
                log::info!(target: LOG_TARGET, "Backfill progress: {} run(s) pushed", summary.pushed);
            }
        }

        log::info!(target: LOG_TARGET, "Backfill complete: {summary}");
        Ok(summary)
    }

    /// Run one poll iteration observed at `now`.
    ///
    /// Never fails: every count, listing, and push failure is logged and recorded in the
    /// returned summary.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> IterationSummary {
        let mut summary = IterationSummary::default();
        self.push_status_counts(now, &mut summary).await;
        self.push_new_durations(&mut summary).await;
        summary
    }

    /// Poll once per tick until the ticker stops. Returns the number of iterations run.
    pub async fn run_poll_loop<T: Ticker>(&mut self, ticker: &mut T) -> u64 {
        log::info!(target: LOG_TARGET, "Polling {} run(s) of {}", self.event, self.workflow);

        let mut iterations = 0;
        while let Some(now) = ticker.tick().await {
            let summary = self.poll_once(now).await;
            iterations += 1;
            log::info!(target: LOG_TARGET, "Iteration {iterations}: {summary}");
        }

        log::info!(target: LOG_TARGET, "Poll loop stopped after {iterations} iteration(s)");
        iterations
    }

    async fn push_status_counts(&self, now: DateTime<Utc>, summary: &mut IterationSummary) {
        let source = &self.source;
        let event = self.event.as_str();

        // All statuses are attempted, independently of each other's outcome
        let counts = join_all(StatusFilter::iter().map(|status| async move {
            let query = RunQuery::new(event, Some(status));
            (status, count_runs(source, &query).await)
        }))
        .await;

        for (status, result) in counts {
            let count = match result {
                Ok(count) => count,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not count {status} runs: {e}");
                    summary.count_failures += 1;
                    continue;
                }
            };

            let sample = self.count_sample(status, count, now);
            match self.sink.push(&[sample]).await {
                Ok(()) => {
                    log::debug!(target: LOG_TARGET, "Pushed {status} count {count}");
                    summary.counts_pushed += 1;
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not push {status} count: {e}");
                    summary.count_failures += 1;
                }
            }
        }
    }

    async fn push_new_durations(&mut self, summary: &mut IterationSummary) {
        let query = RunQuery::new(self.event.as_str(), Some(StatusFilter::Completed));
        let mut runs = pin!(fetch_all(&self.source, &query, self.duration_window));

        while let Some(item) = runs.next().await {
            let run = match item {
                Ok(run) => run,
                Err(FetchError::Malformed(e)) => {
                    log::warn!(target: LOG_TARGET, "Skipping malformed run: {e}");
                    summary.malformed += 1;
                    continue;
                }
                Err(FetchError::Upstream(e)) => {
                    log::warn!(target: LOG_TARGET, "Could not list recent completed runs: {e}");
                    summary.window_failed = true;
                    break;
                }
            };

            let id = run.id.to_string();
            if self.ledger.seen(&id) || !run.is_completed() {
                continue;
            }

            match self.sink.push(&[self.duration_sample(&run)]).await {
                Ok(()) => {
                    log::info!(
                        target: LOG_TARGET,
                        "Pushed duration of run #{} ({}): {:.1} min",
                        run.run_number,
                        run.id,
                        run.duration_minutes()
                    );
                    let _ = self.ledger.mark_seen(id);
                    summary.durations_pushed += 1;
                }
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Could not push duration of run {}: {e}", run.id);
                    summary.duration_failures += 1;
                }
            }
        }
    }

    #[expect(clippy::cast_precision_loss, reason = "run counts stay far below 2^52")]
    fn count_sample(&self, status: StatusFilter, count: u64, now: DateTime<Utc>) -> MetricSample {
        build_count_sample(
            MetricFamily::RunsCount,
            count as f64,
            now,
            LabelSet::for_workflow(&self.workflow).with_status(status),
        )
    }

    fn duration_sample(&self, run: &RunRecord) -> MetricSample {
        build_duration_sample(
            MetricFamily::RunDurationSeconds,
            run.duration_seconds,
            run.created_at,
            LabelSet::for_workflow(&self.workflow),
            Exemplar::for_run(run.id),
        )
    }
}
