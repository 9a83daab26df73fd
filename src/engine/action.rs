//! Per-item action strategies
//!
//! Every action maps one listed item to an explicit `ActionOutcome`, which
//! drives exactly one counter increment. Item-level failures are folded into
//! outcomes here; a strategy only returns `Err` for resource-level failures
//! that should abort the batch, which in practice none of these do.

use crate::compare::Comparer;
use crate::error::{Result, StoreSweepError};
use crate::progress::StatEntry;
use crate::storage::{AclSpec, ObjectRef, StorageBackend};
use async_trait::async_trait;
use std::sync::Arc;

/// Classification of one item action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Both sides are equivalent
    Match,
    /// Sides differ, or equivalence could not be established (fail-closed)
    Diff {
        /// Diagnostic cause when the diff came from a predicate error
        cause: Option<String>,
    },
    /// The mutation was applied
    Repaired,
    /// The mutation failed; the batch continues
    Errored {
        /// What went wrong, for logs and diagnostics
        cause: String,
    },
}

/// The per-item unit of work applied during traversal.
#[async_trait]
pub trait ItemAction: Send + Sync {
    /// Hook invoked once per listed item before the action runs.
    fn note_candidate(&self, _entry: &StatEntry) {}

    /// Run the action for one item.
    async fn execute(&self, item: &ObjectRef) -> Result<ActionOutcome>;
}

/// Compares one key across a source and destination binding.
pub struct CompareAction {
    src: Arc<dyn StorageBackend>,
    dst: Arc<dyn StorageBackend>,
    comparer: Arc<dyn Comparer>,
}

impl CompareAction {
    /// Build a compare strategy over a binding pair.
    pub fn new(
        src: Arc<dyn StorageBackend>,
        dst: Arc<dyn StorageBackend>,
        comparer: Arc<dyn Comparer>,
    ) -> Self {
        Self { src, dst, comparer }
    }
}

#[async_trait]
impl ItemAction for CompareAction {
    async fn execute(&self, item: &ObjectRef) -> Result<ActionOutcome> {
        match self
            .comparer
            .compare(&item.key, self.src.as_ref(), self.dst.as_ref())
            .await
        {
            Ok(true) => Ok(ActionOutcome::Match),
            Ok(false) => Ok(ActionOutcome::Diff { cause: None }),
            // Fail closed: not-found, fetch errors and metadata gaps all
            // classify as a difference, never as a match.
            Err(e) => Ok(ActionOutcome::Diff {
                cause: Some(e.to_string()),
            }),
        }
    }
}

/// Applies a canned ACL to every listed item on one binding.
pub struct RepairAction {
    backend: Arc<dyn StorageBackend>,
    acl: AclSpec,
    supported: bool,
}

impl RepairAction {
    /// Build a repair strategy; the binding's mutation capability is probed
    /// once here, not per item.
    pub fn new(backend: Arc<dyn StorageBackend>, acl: AclSpec) -> Self {
        let supported = backend.supports_set_acl();
        Self {
            backend,
            acl,
            supported,
        }
    }
}

#[async_trait]
impl ItemAction for RepairAction {
    fn note_candidate(&self, entry: &StatEntry) {
        // Every listed item is a mutation candidate by definition.
        entry.add_diff_candidate();
    }

    async fn execute(&self, item: &ObjectRef) -> Result<ActionOutcome> {
        if !self.supported {
            let err = StoreSweepError::unsupported(self.backend.describe(), "set_acl");
            return Ok(ActionOutcome::Errored {
                cause: err.to_string(),
            });
        }

        match self.backend.set_acl(&item.key, &self.acl).await {
            Ok(()) => Ok(ActionOutcome::Repaired),
            Err(e) => Ok(ActionOutcome::Errored {
                cause: e.to_string(),
            }),
        }
    }
}
