//! Per-job outcome counters
//!
//! A `StatEntry` is the counter set for one job identity. Entries are created
//! lazily, handed out as `Arc` references, and mutated atomically by every
//! in-flight action of the job's dispatcher pool while the reporter reads
//! them from another task. Entries live for the whole run; completed jobs
//! stay visible in the report while later jobs execute.

use crate::engine::{ActionOutcome, JobIdentity};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Outcome counters for one job identity.
#[derive(Debug, Default)]
pub struct StatEntry {
    running: AtomicBool,
    matched: AtomicU64,
    diffed: AtomicU64,
    errored: AtomicU64,
    repaired: AtomicU64,
}

impl StatEntry {
    /// Flag the job as currently executing.
    pub fn mark_running(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    /// Flag the job as no longer executing.
    pub fn mark_complete(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the job is currently executing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Count a repair candidate. Every item listed by a repair job is a
    /// difference by definition, before the mutation is even attempted.
    pub fn add_diff_candidate(&self) {
        self.diffed.fetch_add(1, Ordering::Relaxed);
    }

    /// Apply exactly one counter increment for an action outcome.
    pub fn record(&self, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Match => self.matched.fetch_add(1, Ordering::Relaxed),
            ActionOutcome::Diff { .. } => self.diffed.fetch_add(1, Ordering::Relaxed),
            ActionOutcome::Repaired => self.repaired.fetch_add(1, Ordering::Relaxed),
            ActionOutcome::Errored { .. } => self.errored.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Items classified as matching.
    pub fn matched(&self) -> u64 {
        self.matched.load(Ordering::Relaxed)
    }

    /// Items classified as differing (including repair candidates).
    pub fn diffed(&self) -> u64 {
        self.diffed.load(Ordering::Relaxed)
    }

    /// Items whose action failed.
    pub fn errored(&self) -> u64 {
        self.errored.load(Ordering::Relaxed)
    }

    /// Items successfully repaired.
    pub fn repaired(&self) -> u64 {
        self.repaired.load(Ordering::Relaxed)
    }
}

/// Process-wide registry of `StatEntry` values, keyed by job identity.
///
/// The tracker exclusively owns the entries for a run; `get_or_create` is
/// idempotent so no concurrent increments are ever lost to replacement.
#[derive(Debug, Default)]
pub struct StatsTracker {
    entries: Mutex<Vec<(JobIdentity, Arc<StatEntry>)>>,
}

impl StatsTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the entry for an identity, creating it on first access.
    pub fn get_or_create(&self, identity: &JobIdentity) -> Arc<StatEntry> {
        let mut entries = self.entries.lock().expect("stats tracker poisoned");
        if let Some((_, entry)) = entries.iter().find(|(id, _)| id == identity) {
            return Arc::clone(entry);
        }
        let entry = Arc::new(StatEntry::default());
        entries.push((identity.clone(), Arc::clone(&entry)));
        entry
    }

    /// Human-readable multi-job report, one line per known job.
    pub fn snapshot(&self) -> String {
        let entries = self.entries.lock().expect("stats tracker poisoned");
        if entries.is_empty() {
            return "(no jobs started)".to_string();
        }

        let mut out = String::new();
        for (identity, entry) in entries.iter() {
            let state = if entry.is_running() { " [running]" } else { "" };
            let _ = writeln!(
                out,
                "{}{}: matched={} diffed={} errored={} repaired={}",
                identity,
                state,
                entry.matched(),
                entry.diffed(),
                entry.errored(),
                entry.repaired(),
            );
        }
        out.pop(); // trailing newline
        out
    }

    /// Number of known job identities.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("stats tracker poisoned").len()
    }

    /// Whether no job has touched the tracker yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
