//! # StoreSweep - Bulk Operations over Storage Backends
//!
//! StoreSweep walks arbitrarily large, cursor-paginated object listings and
//! applies a per-item action under bounded concurrency: compare objects
//! across storage bindings and environments, or repair ACLs across one
//! binding at a time. Jobs run strictly in series so a heavy traversal never
//! starves another binding's rate limits; within a job, up to the configured
//! number of item actions are outstanding at once.
//!
//! ## Quick Start
//!
//! ```no_run
//! use storesweep::compare::CompareMode;
//! use storesweep::engine::{plan_jobs, run_jobs, JobOperation, PairingRule, RunOptions};
//! use storesweep::storage::{MemoryBackend, StorageBackend};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bindings: Vec<Arc<dyn StorageBackend>> = vec![
//!     Arc::new(MemoryBackend::new("prod", "files")),
//!     Arc::new(MemoryBackend::new("stage", "files")),
//! ];
//!
//! let jobs = plan_jobs(
//!     &bindings,
//!     PairingRule::EveryOrderedPair,
//!     JobOperation::Compare(CompareMode::Metadata),
//!     "",
//!     true,
//!     |_, _| false,
//! );
//!
//! let report = run_jobs(jobs, RunOptions::default()).await;
//! report.print_summary();
//! # }
//! ```
//!
//! ## Design
//!
//! - **Cursor lister**: pages are requested strictly in cursor order; the
//!   continuation token is threaded back verbatim and never inspected.
//! - **Bounded dispatcher**: items within a page complete in arbitrary order
//!   under a concurrency ceiling; the first hard error stops further
//!   launches while in-flight actions drain.
//! - **Explicit outcomes**: every item action returns an `ActionOutcome`;
//!   unverifiable comparisons classify as differences (fail-closed) and
//!   failed mutations are recorded, not propagated.
//! - **Shared progress**: per-job counters are updated atomically by every
//!   in-flight action and printed on an interval by a background reporter.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod storage;

// Re-export commonly used types
pub use engine::{run_jobs, Job, JobOperation, RunOptions, RunReport};
pub use error::{Result, StoreSweepError};
pub use storage::StorageBackend;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use storesweep::prelude::*;
    //! ```

    pub use crate::compare::{Comparer, CompareMode};
    pub use crate::config::{CliArgs, EnvConfig, ExclusionRules};
    pub use crate::engine::{
        plan_jobs, run_jobs, ActionOutcome, Job, JobOperation, PairingRule, RunOptions,
        RunReport,
    };
    pub use crate::error::{Result, StoreSweepError};
    pub use crate::progress::{StatEntry, StatsTracker};
    pub use crate::storage::{
        AclSpec, FsBackend, ListOptions, ListPage, MemoryBackend, ObjectMeta, ObjectRef,
        StorageBackend,
    };
}
