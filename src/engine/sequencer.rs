//! Job sequencer
//!
//! Expands configured bindings into a job list via a pairing rule, then runs
//! the jobs strictly one at a time: each job drives the cursor lister and the
//! bounded dispatcher until its listing is exhausted. Serializing jobs keeps
//! one heavy traversal from starving another binding's rate limits, at the
//! cost of total wall-clock time.

use crate::compare::comparer_for;
use crate::engine::action::{ActionOutcome, CompareAction, ItemAction, RepairAction};
use crate::engine::dispatch::{dispatch_all, DEFAULT_CONCURRENCY};
use crate::engine::job::{Job, JobIdentity, JobOperation, JobState};
use crate::engine::lister::PageStream;
use crate::error::{Result, StoreSweepError};
use crate::progress::{ProgressReporter, RunContext, StatEntry, StatsTracker};
use crate::storage::{StorageBackend, DEFAULT_PAGE_SIZE};
use std::sync::Arc;
use std::time::Duration;

/// How bindings are expanded into jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingRule {
    /// One job per ordered (source, destination) pair; self-pairs are skipped
    EveryOrderedPair,
    /// One job per binding, no destination
    EachSingle,
}

/// Options carried by one `run_jobs` invocation.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum concurrently outstanding item actions within one job
    pub concurrency_limit: usize,
    /// Maximum items per listing page
    pub page_size_limit: usize,
    /// Interval between progress reports
    pub report_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY,
            page_size_limit: DEFAULT_PAGE_SIZE,
            report_interval: Duration::from_secs(5),
        }
    }
}

/// Final state of one run.
pub struct RunReport {
    /// Per-job counters, including jobs that only partially ran
    pub tracker: Arc<StatsTracker>,
    /// Final state of every planned job, in planning order
    pub job_states: Vec<(JobIdentity, JobState)>,
    /// Jobs that ran to listing exhaustion
    pub jobs_completed: usize,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
    /// The failure that aborted the queue, if any
    pub error: Option<StoreSweepError>,
}

impl RunReport {
    /// Whether every planned job completed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Number of jobs that were planned for this run.
    pub fn jobs_planned(&self) -> usize {
        self.job_states.len()
    }

    /// Print the final counters and a completion or abort message.
    pub fn print_summary(&self) {
        println!("{}", self.tracker.snapshot());
        match &self.error {
            None => println!(
                "Run complete ({} jobs in {})",
                self.jobs_completed,
                humantime::format_duration(Duration::from_secs(self.elapsed.as_secs())),
            ),
            Some(e) => println!("Run aborted: {}", e),
        }
    }
}

/// Expand bindings into the job list for one operation.
///
/// Self-pairs (same config and binding id) are always skipped for pairwise
/// operations; `exclude` filters out further combinations, e.g. from
/// configuration.
pub fn plan_jobs<F>(
    bindings: &[Arc<dyn StorageBackend>],
    rule: PairingRule,
    operation: JobOperation,
    root: &str,
    recursive: bool,
    exclude: F,
) -> Vec<Job>
where
    F: Fn(&dyn StorageBackend, &dyn StorageBackend) -> bool,
{
    let mut jobs = Vec::new();
    match rule {
        PairingRule::EachSingle => {
            for binding in bindings {
                jobs.push(Job {
                    source: Arc::clone(binding),
                    destination: None,
                    root: root.to_string(),
                    recursive,
                    operation: operation.clone(),
                });
            }
        }
        PairingRule::EveryOrderedPair => {
            for src in bindings {
                for dst in bindings {
                    if src.describe() == dst.describe() {
                        continue;
                    }
                    if exclude(src.as_ref(), dst.as_ref()) {
                        tracing::debug!(
                            src = %src.describe(),
                            dst = %dst.describe(),
                            "pair excluded"
                        );
                        continue;
                    }
                    jobs.push(Job {
                        source: Arc::clone(src),
                        destination: Some(Arc::clone(dst)),
                        root: root.to_string(),
                        recursive,
                        operation: operation.clone(),
                    });
                }
            }
        }
    }
    jobs
}

/// Run jobs strictly in series until all complete or one fails.
///
/// A job failure aborts the remaining queue; counters accumulated so far are
/// preserved in the report alongside the error. There is no automatic retry.
pub async fn run_jobs(jobs: Vec<Job>, options: RunOptions) -> RunReport {
    let tracker = Arc::new(StatsTracker::new());
    let ctx = Arc::new(RunContext::new(Arc::clone(&tracker)));
    let activity = jobs
        .first()
        .map(|j| j.operation.activity())
        .unwrap_or("Processing");
    let reporter = ProgressReporter::spawn(Arc::clone(&ctx), options.report_interval, activity);

    let mut job_states: Vec<(JobIdentity, JobState)> = jobs
        .iter()
        .map(|j| (j.identity(), JobState::Pending))
        .collect();
    let mut jobs_completed = 0;
    let mut error = None;

    for (index, job) in jobs.iter().enumerate() {
        let entry = tracker.get_or_create(&job.identity());
        job_states[index].1 = JobState::Running;
        entry.mark_running();
        tracing::info!(job = %job.describe(), "job starting");

        let result = run_job(job, &entry, &ctx, &options).await;
        entry.mark_complete();

        match result {
            Ok(()) => {
                job_states[index].1 = JobState::Completed;
                jobs_completed += 1;
                tracing::info!(job = %job.describe(), "job completed");
            }
            Err(e) => {
                job_states[index].1 = JobState::Failed;
                tracing::error!(
                    job = %job.describe(),
                    error = %e,
                    "job failed, aborting remaining queue"
                );
                error = Some(StoreSweepError::JobFailed {
                    job: job.describe(),
                    source: Box::new(e),
                });
                break;
            }
        }
    }

    reporter.stop();
    RunReport {
        tracker,
        job_states,
        jobs_completed,
        elapsed: ctx.elapsed(),
        error,
    }
}

/// Drive one job: list pages in cursor order, dispatch each page's items
/// under the concurrency ceiling, record every outcome.
async fn run_job(
    job: &Job,
    entry: &Arc<StatEntry>,
    ctx: &RunContext,
    options: &RunOptions,
) -> Result<()> {
    let action = build_action(job)?;
    let mut pages = PageStream::new(
        job.source.as_ref(),
        job.root.as_str(),
        job.recursive,
        options.page_size_limit,
    );

    while let Some(page) = pages.next_page().await? {
        ctx.set_last_cursor(page.continuation().map(str::to_string));

        let actions = page.items.into_iter().map(|item| {
            let action = Arc::clone(&action);
            let entry = Arc::clone(entry);
            async move {
                action.note_candidate(&entry);
                let outcome = action.execute(&item).await?;
                match &outcome {
                    ActionOutcome::Diff { cause: Some(cause) } => {
                        tracing::debug!(key = %item.key, %cause, "unverifiable, classified as diff");
                    }
                    ActionOutcome::Errored { cause } => {
                        tracing::warn!(key = %item.key, %cause, "item action failed");
                    }
                    _ => {}
                }
                entry.record(&outcome);
                Ok(())
            }
        });

        dispatch_all(actions, options.concurrency_limit).await?;
    }

    Ok(())
}

fn build_action(job: &Job) -> Result<Arc<dyn ItemAction>> {
    match &job.operation {
        JobOperation::Compare(mode) => {
            let destination = job.destination.clone().ok_or_else(|| {
                StoreSweepError::config("compare job requires a destination binding")
            })?;
            Ok(Arc::new(CompareAction::new(
                Arc::clone(&job.source),
                destination,
                comparer_for(*mode),
            )))
        }
        JobOperation::SetAcl(acl) => Ok(Arc::new(RepairAction::new(
            Arc::clone(&job.source),
            acl.clone(),
        ))),
    }
}
