//! Error types for StoreSweep
//!
//! This module defines all error types used throughout the application,
//! providing detailed error information for debugging and operator feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for StoreSweep operations
#[derive(Error, Debug)]
pub enum StoreSweepError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object not found in a backend
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Listing a page of a namespace failed; fatal to the current job
    #[error("Listing failed on '{binding}' at '{path}': {message}")]
    ListingFailed {
        binding: String,
        path: String,
        message: String,
    },

    /// A backend operation other than listing failed
    #[error("Backend '{binding}' error: {message}")]
    Backend { binding: String, message: String },

    /// Backend does not support the requested operation
    #[error("Storage '{binding}' does not support required '{operation}'")]
    UnsupportedOperation { binding: String, operation: String },

    /// Comparison could not be carried to a verdict
    #[error("Comparison inconclusive for '{key}': {reason}")]
    Inconclusive { key: String, reason: String },

    /// A job failed and aborted the remaining queue
    #[error("Job '{job}' failed: {source}")]
    JobFailed {
        job: String,
        #[source]
        source: Box<StoreSweepError>,
    },

    /// A blocking or spawned task could not be joined
    #[error("Task join error: {0}")]
    TaskJoin(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StoreSweepError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a listing failure for a binding
    pub fn listing(
        binding: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ListingFailed {
            binding: binding.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic backend error
    pub fn backend(binding: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            binding: binding.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(binding: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            binding: binding.into(),
            operation: operation.into(),
        }
    }

    /// Create an inconclusive-comparison error
    pub fn inconclusive(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Inconclusive {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Check if this error denotes a missing object
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this error is fatal to a whole run (vs. absorbed into stats)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ListingFailed { .. } | Self::JobFailed { .. } | Self::TaskJoin(_)
        )
    }
}

/// Result type alias for StoreSweep operations
pub type Result<T> = std::result::Result<T, StoreSweepError>;

impl From<std::io::Error> for StoreSweepError {
    fn from(err: std::io::Error) -> Self {
        StoreSweepError::Io {
            path: std::path::PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for StoreSweepError {
    fn from(err: serde_json::Error) -> Self {
        StoreSweepError::ConfigError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreSweepError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreSweepError::TaskJoin(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = StoreSweepError::io("/test/path", io_err);
        assert!(err.is_not_found());

        let err = StoreSweepError::backend("prod/files", "throttled");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_fatality_classification() {
        assert!(StoreSweepError::listing("prod/files", "docs", "timeout").is_fatal());
        assert!(!StoreSweepError::unsupported("prod/files", "set_acl").is_fatal());
        assert!(!StoreSweepError::inconclusive("a/b.txt", "no size").is_fatal());
    }

    #[test]
    fn test_job_failure_wraps_cause() {
        let cause = StoreSweepError::listing("prod/files", "", "connection reset");
        let err = StoreSweepError::JobFailed {
            job: "prod/files -> stage/files".to_string(),
            source: Box::new(cause),
        };
        assert!(err.to_string().contains("prod/files -> stage/files"));
    }
}
