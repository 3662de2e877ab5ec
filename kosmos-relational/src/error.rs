//! Error types for the relational store, grounded on the
//! `llmspell-graph::error::GraphError` shape and mapped into
//! `kosmos_storage_traits::StorageError` at the crate boundary.

use kosmos_storage_traits::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelationalError>;

#[derive(Debug, Error)]
pub enum RelationalError {
    #[error("row not found: {0}")]
    NotFound(String),

    #[error("foreign key target not found: {0}")]
    EndpointNotFound(String),

    #[error("duplicate row id: {0}")]
    Duplicate(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RelationalError> for StorageError {
    fn from(e: RelationalError) -> Self {
        match e {
            RelationalError::NotFound(id) => Self::NotFound(id),
            RelationalError::EndpointNotFound(id) => Self::EndpointNotFound(id),
            RelationalError::Duplicate(id) => Self::Duplicate(id),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}
