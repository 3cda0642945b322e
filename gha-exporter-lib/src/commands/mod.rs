//! Command-line interface and orchestration for gha-exporter
//!
//! This module parses the command line, loads configuration, sets up logging, and hands a
//! fully resolved [`Settings`](crate::settings::Settings) to the selected command.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **(default)**: Run the exporter. Without flags it polls forever; `--backfill` pushes
//!   historical run durations and exits, `--backfill --follow` does both.
//! - **stats**: Fetch recent runs and print failure rate and duration percentiles.
//!
//! ## Configuration
//!
//! Settings come from three layers, later ones winning: built-in defaults, an optional TOML
//! file given by `--config`, and command-line flags (several of which fall back to environment
//! variables such as `VM_URL` and `GITHUB_TOKEN`).

mod common;
mod config;
mod export;
mod host;
mod run;
mod stats;

pub use common::{CommonArgs, LogLevel};
pub use config::Config;
pub use export::{ExportArgs, export};
pub use host::Host;
pub use run::run;
pub use stats::{StatsArgs, show_stats};
