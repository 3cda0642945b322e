//! Workflow run collection
//!
//! This module pages through the GitHub Actions run listing for one workflow file and turns
//! each raw run object into a [`RunRecord`].
//!
//! # Implementation Model
//!
//! [`RunSource`] is the seam between the exporter and the upstream API. Its single operation
//! fetches one page; [`fetch_all`] builds a lazy stream on top of it that normalizes each run
//! before the next page is requested, so a consumer that stops early never pays for pages it
//! did not read. [`GitHubRuns`] is the production implementation.
//!
//! Per-record problems surface as [`MalformedRecordError`] and are meant to be skipped.
//! Page-level problems surface as [`UpstreamError`] and end the stream.

mod client;
mod record;
mod source;
mod stats;

pub use client::{Client, RateLimitInfo, UpstreamError};
pub use record::{Conclusion, MalformedRecordError, RunRecord, RunStatus, normalize};
pub use source::{FetchError, GitHubRuns, MAX_PER_PAGE, RunPage, RunQuery, RunSource, StatusFilter, count_runs, fetch_all};
pub use stats::RunStats;
