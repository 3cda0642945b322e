#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for gha-exporter
//!
//! This library consolidates all functionality for the gha-exporter tool, which polls
//! the GitHub Actions API for workflow runs and republishes derived metrics to a
//! VictoriaMetrics-compatible ingestion endpoint.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface, configuration, and logging setup
//! - [`runs`]: Paged fetching and normalization of workflow run records
//! - [`metrics`]: Metric samples, text exposition, and delivery to the sink
//! - [`exporter`]: Backfill and poll-loop scheduling with run deduplication
//! - [`settings`]: Resolved runtime settings handed to every component

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub(crate) type HashSet<T> = rustc_hash::FxHashSet<T>;

pub mod commands;
pub mod exporter;
mod http;
pub mod metrics;
pub mod runs;
pub mod settings;

pub use crate::commands::{Host, run};
