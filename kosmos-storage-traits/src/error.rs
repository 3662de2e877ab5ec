//! Error taxonomy for the storage interface (spec §4.2, §7)

use kosmos_core::ModelError;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors a [`crate::WorldModelStore`] implementation may surface.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Caller supplied malformed input; never retried silently.
    #[error("validation error: {0}")]
    Validation(#[from] ModelError),

    /// Targeted id absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// One or both relationship endpoints do not exist.
    #[error("endpoint not found: {0}")]
    EndpointNotFound(String),

    /// Unique-constraint violation on `addEntity`.
    #[error("duplicate id: {0}")]
    Duplicate(String),

    /// Graph/relational round-trip failed.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// `reset` called without the explicit safety flag.
    #[error("reset requires explicit confirm=true")]
    MissingConfirm,

    /// Import document major version does not match the codec's.
    #[error("version mismatch: {0}")]
    VersionMismatch(String),

    /// Filesystem error during export/import.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
