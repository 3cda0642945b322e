//! Command dispatch logic for gha-exporter

use super::common::{CommonArgs, init_logging};
use super::config::Config;
use super::export::{ExportArgs, export};
use super::stats::{StatsArgs, show_stats};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "gha-exporter", version, author, long_about = None)]
#[command(about = "Export GitHub Actions merge-queue run metrics to VictoriaMetrics")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    export: ExportArgs,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print summary statistics over recent runs instead of exporting
    Stats(StatsArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// Without a subcommand this runs the exporter, which polls until the process is
/// interrupted (or, with `--backfill`, returns once the backfill is done).
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if configuration is missing or invalid, or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    init_logging(cli.common.log_level);

    let config = Config::load(cli.common.config.as_deref())?;
    let settings = cli.common.resolve(config)?;
    log::debug!(target: "    config", "Resolved settings: {settings:?}");

    match &cli.command {
        Some(Command::Stats(stats_args)) => show_stats(host, &settings, stats_args).await,
        None => export(host, &settings, &cli.export).await,
    }
}
