use super::Host;
use crate::Result;
use crate::exporter::{Exporter, IntervalTicker};
use crate::metrics::VictoriaMetricsSink;
use crate::runs::GitHubRuns;
use crate::settings::Settings;
use clap::Args;
use ohno::IntoAppError;
use std::io::Write;

const LOG_TARGET: &str = "  exporter";

#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Push the durations of the last --backfill-count completed runs, then exit
    #[arg(long)]
    pub backfill: bool,

    /// After --backfill, keep polling instead of exiting
    #[arg(long, requires = "backfill")]
    pub follow: bool,
}

/// Run the exporter: a one-shot backfill, the continuous poll loop, or both.
///
/// The poll loop ends only when the process receives SIGINT or SIGTERM.
pub async fn export<H: Host>(host: &mut H, settings: &Settings, args: &ExportArgs) -> Result<()> {
    let sink = VictoriaMetricsSink::new(settings)?;
    let source = GitHubRuns::new(settings)?;

    log::info!(
        target: LOG_TARGET,
        "Exporting {}/{} {} runs to {}",
        settings.target.owner,
        settings.target.repo,
        settings.target.workflow_file,
        sink.import_url()
    );

    let mut exporter = Exporter::new(source, sink, settings);

    if args.backfill {
        let summary = exporter
            .backfill(settings.backfill_count)
            .await
            .into_app_err("backfill aborted")?;

        writeln!(host.output(), "Backfill complete: {summary}")?;
        if summary.push_failures > 0 {
            writeln!(host.error(), "warning: {} run duration(s) could not be pushed", summary.push_failures)?;
        }

        if !args.follow {
            return Ok(());
        }
    }

    let mut ticker = IntervalTicker::new(settings.poll_interval);
    let iterations = exporter.run_poll_loop(&mut ticker).await;
    writeln!(host.output(), "Stopped after {iterations} poll iteration(s)")?;

    Ok(())
}
