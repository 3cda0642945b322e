//! Backfill and continuous polling
//!
//! [`Exporter`] ties a [`RunSource`](crate::runs::RunSource) to a
//! [`MetricSink`](crate::metrics::MetricSink) and runs in one of two modes:
//!
//! - **Backfill** pushes a duration sample for each of the last N completed runs and stops.
//!   An upstream failure aborts it.
//! - **Poll loop** runs one iteration per [`Ticker`] tick. Each iteration pushes the current
//!   run count for every status and a duration sample for each recently completed run not
//!   yet in the [`DedupLedger`]. Failures are logged and never end the loop.

mod ledger;
mod scheduler;
mod ticker;

pub use ledger::DedupLedger;
pub use scheduler::{BackfillSummary, Exporter, IterationSummary};
pub use ticker::{IntervalTicker, Ticker};
