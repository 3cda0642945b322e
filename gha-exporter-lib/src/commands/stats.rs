use super::Host;
use crate::Result;
use crate::runs::{FetchError, GitHubRuns, RunQuery, RunRecord, RunStats, fetch_all};
use crate::settings::Settings;
use clap::Args;
use core::pin::pin;
use futures_util::StreamExt;
use ohno::IntoAppError;
use std::io::Write;

/// Number of most recent runs listed after the summary
const RECENT_RUNS_SHOWN: usize = 5;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Number of most recent runs to analyze
    #[arg(long, default_value_t = 50, value_name = "N")]
    pub limit: usize,
}

/// Print summary statistics over the most recent runs of the configured workflow.
pub async fn show_stats<H: Host>(host: &mut H, settings: &Settings, args: &StatsArgs) -> Result<()> {
    let source = GitHubRuns::new(settings)?;
    let query = RunQuery::new(settings.target.event.as_str(), None);

    let mut runs = Vec::with_capacity(args.limit.min(1000));
    let mut stream = pin!(fetch_all(&source, &query, args.limit));
    while let Some(item) = stream.next().await {
        match item {
            Ok(run) => runs.push(run),
            Err(FetchError::Malformed(e)) => log::warn!(target: "     stats", "Skipping malformed run: {e}"),
            Err(FetchError::Upstream(e)) => return Err(e).into_app_err("fetching workflow runs"),
        }
    }

    let target = &settings.target;
    let mut out = host.output();
    writeln!(out, "{}/{} {} ({} runs)", target.owner, target.repo, target.workflow_file, target.event)?;

    if runs.is_empty() {
        writeln!(out, "No runs found")?;
        return Ok(());
    }

    write_stats(&mut out, &RunStats::from_runs(&runs))?;

    writeln!(out)?;
    writeln!(out, "Most recent runs:")?;
    for run in runs.iter().take(RECENT_RUNS_SHOWN) {
        writeln!(out, "  {}", format_run(run))?;
    }

    Ok(())
}

fn write_stats(out: &mut impl Write, stats: &RunStats) -> std::io::Result<()> {
    writeln!(out, "Total runs:      {}", stats.total_runs)?;
    writeln!(out, "Completed runs:  {}", stats.completed_runs)?;
    writeln!(out, "Failures:        {}", stats.failures)?;
    writeln!(out, "Failure rate:    {:.1}%", stats.failure_rate * 100.0)?;
    writeln!(out, "Duration p50:    {:.1} min", stats.duration_p50_minutes)?;
    writeln!(out, "Duration p95:    {:.1} min", stats.duration_p95_minutes)?;
    writeln!(out, "Duration max:    {:.1} min", stats.duration_max_minutes)
}

/// `#run_number | conclusion | minutes | date`
fn format_run(run: &RunRecord) -> String {
    let conclusion = run.conclusion.map_or_else(|| run.status.to_string(), |c| c.to_string());
    let minutes = if run.is_completed() {
        format!("{:.1} min", run.duration_minutes())
    } else {
        "-".to_string()
    };

    format!("#{} | {conclusion} | {minutes} | {}", run.run_number, run.created_at.format("%Y-%m-%d %H:%M"))
}
