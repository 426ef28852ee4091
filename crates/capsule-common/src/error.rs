//! Unified error types for the capsule workspace.
//!
//! Every fault carries a [`Severity`]. Resource-control and cleanup faults
//! are warnings: the run proceeds and the fault is logged. Everything else
//! aborts before the target command is allowed to run.

use std::path::PathBuf;

use thiserror::Error;

/// How a fault affects forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Logged, execution continues.
    Warning,
    /// Execution stops immediately.
    Fatal,
}

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CapsuleError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The invocation itself is malformed (missing or unknown role, missing command).
    #[error("usage: {message}")]
    Usage {
        /// Description of the usage fault.
        message: String,
    },

    /// The kernel refused a namespace, root-change, hostname or mount request.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// A control-group directory or control file could not be written.
    #[error("resource control failed at {path}: {source}")]
    ResourceControl {
        /// Control-group path involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The target command could not be started.
    #[error("failed to start {command}: {source}")]
    TargetSpawn {
        /// Command that failed to start.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Teardown after the target exited did not complete.
    #[error("cleanup failed: {message}")]
    Cleanup {
        /// Description of the cleanup fault.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CapsuleError {
    /// Returns whether this fault stops forward progress.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::ResourceControl { .. } | Self::Cleanup { .. } => Severity::Warning,
            _ => Severity::Fatal,
        }
    }

    /// Shorthand for `self.severity() == Severity::Fatal`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CapsuleError>;
