//! Interval progress reporting
//!
//! A background task prints the tracker snapshot and the last pagination
//! cursor seen on a fixed interval. The task is a display affordance only: it
//! never blocks the run and is aborted once the run concludes.

use crate::progress::StatsTracker;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Shared state for one run, handed to the reporter task.
///
/// The last-seen cursor lives here, not in process-wide state; it is
/// overwritten by whichever page most recently started and is used for
/// progress display only.
#[derive(Debug)]
pub struct RunContext {
    tracker: Arc<StatsTracker>,
    last_cursor: Mutex<Option<String>>,
    started: Instant,
}

impl RunContext {
    /// Create a context around a tracker.
    pub fn new(tracker: Arc<StatsTracker>) -> Self {
        Self {
            tracker,
            last_cursor: Mutex::new(None),
            started: Instant::now(),
        }
    }

    /// The tracker backing this run.
    pub fn tracker(&self) -> &Arc<StatsTracker> {
        &self.tracker
    }

    /// Overwrite the last-seen pagination cursor.
    pub fn set_last_cursor(&self, cursor: Option<String>) {
        *self.last_cursor.lock().expect("run context poisoned") = cursor;
    }

    /// The last-seen pagination cursor, if any page carried one yet.
    pub fn last_cursor(&self) -> Option<String> {
        self.last_cursor
            .lock()
            .expect("run context poisoned")
            .clone()
    }

    /// Time elapsed since the run context was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Handle to the background reporting task.
pub struct ProgressReporter {
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Spawn the reporter, printing every `interval` until stopped.
    pub fn spawn(ctx: Arc<RunContext>, interval: Duration, activity: impl Into<String>) -> Self {
        let activity = activity.into();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let cursor = ctx.last_cursor().unwrap_or_default();
                println!(
                    "LastKey: {}\n{}\n{}...",
                    cursor,
                    ctx.tracker().snapshot(),
                    activity
                );
            }
        });
        Self { handle }
    }

    /// Stop reporting. In-flight output is abandoned, not flushed.
    pub fn stop(self) {
        self.handle.abort();
    }
}
