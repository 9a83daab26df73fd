//! Job model
//!
//! A job is one traversal+action run over one binding or one ordered pair of
//! bindings. Jobs are created up front by the sequencer and own no mutable
//! state; all counters live in the progress tracker under the job's identity.

use crate::compare::CompareMode;
use crate::storage::{AclSpec, StorageBackend};
use std::fmt;
use std::sync::Arc;

/// Identity of one job, used as the stats map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobIdentity {
    src_config: String,
    src_binding: String,
    dst: Option<(String, String)>,
}

impl JobIdentity {
    /// Build an identity from opaque config/binding id strings.
    pub fn new(
        src_config: impl Into<String>,
        src_binding: impl Into<String>,
        dst: Option<(String, String)>,
    ) -> Self {
        Self {
            src_config: src_config.into(),
            src_binding: src_binding.into(),
            dst,
        }
    }
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.src_config, self.src_binding)?;
        if let Some((dst_config, dst_binding)) = &self.dst {
            write!(f, " -> {}/{}", dst_config, dst_binding)?;
        }
        Ok(())
    }
}

/// The per-item operation a job applies during traversal.
#[derive(Debug, Clone)]
pub enum JobOperation {
    /// Read both sides and classify match/diff
    Compare(CompareMode),
    /// Apply a canned ACL to every listed item on the source binding
    SetAcl(AclSpec),
}

impl JobOperation {
    /// Activity label shown by the interval reporter.
    pub fn activity(&self) -> &'static str {
        match self {
            Self::Compare(_) => "Comparing",
            Self::SetAcl(_) => "Applying ACLs",
        }
    }
}

/// One traversal+action run.
pub struct Job {
    /// Binding whose namespace is traversed
    pub source: Arc<dyn StorageBackend>,
    /// Second binding for pairwise operations
    pub destination: Option<Arc<dyn StorageBackend>>,
    /// Path prefix the traversal starts from
    pub root: String,
    /// Whether to flatten nested levels into the traversal
    pub recursive: bool,
    /// Per-item operation
    pub operation: JobOperation,
}

impl Job {
    /// The stats identity for this job.
    pub fn identity(&self) -> JobIdentity {
        JobIdentity::new(
            self.source.config_id(),
            self.source.binding_id(),
            self.destination
                .as_ref()
                .map(|d| (d.config_id().to_string(), d.binding_id().to_string())),
        )
    }

    /// Display form used in logs and error messages.
    pub fn describe(&self) -> String {
        self.identity().to_string()
    }
}

/// Lifecycle of a job inside the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Queued, not yet started
    Pending,
    /// Currently traversing
    Running,
    /// Finished with its listing exhausted
    Completed,
    /// Aborted by a listing failure or dispatcher hard error
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    #[test]
    fn test_identity_display() {
        let pair = JobIdentity::new(
            "prod",
            "files",
            Some(("stage".to_string(), "files".to_string())),
        );
        assert_eq!(pair.to_string(), "prod/files -> stage/files");

        let single = JobIdentity::new("prod", "files", None);
        assert_eq!(single.to_string(), "prod/files");
    }

    #[test]
    fn test_job_identity_from_bindings() {
        let job = Job {
            source: Arc::new(MemoryBackend::new("prod", "files")),
            destination: Some(Arc::new(MemoryBackend::new("stage", "files"))),
            root: String::new(),
            recursive: true,
            operation: JobOperation::Compare(CompareMode::Metadata),
        };
        assert_eq!(job.describe(), "prod/files -> stage/files");
        assert_eq!(job.operation.activity(), "Comparing");
    }
}
