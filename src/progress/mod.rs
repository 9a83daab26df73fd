//! Run progress tracking
//!
//! Concurrency-safe per-job counters plus a background reporter that prints a
//! snapshot of every job on a fixed interval while a run is in flight.

mod reporter;
mod tracker;

pub use reporter::{ProgressReporter, RunContext};
pub use tracker::{StatEntry, StatsTracker};
