//! Error types for the graph backend, grounded on `llmspell-graph::error::GraphError`.

use kosmos_storage_traits::StorageError;
use thiserror::Error;

/// Result type alias for graph backend operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("relationship endpoint not found: {0}")]
    EndpointNotFound(String),

    #[error("duplicate entity id: {0}")]
    Duplicate(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("model error: {0}")]
    Model(#[from] kosmos_core::ModelError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("surrealdb error: {0}")]
    SurrealDb(String),
}

impl From<surrealdb::Error> for GraphError {
    fn from(e: surrealdb::Error) -> Self {
        Self::SurrealDb(e.to_string())
    }
}

impl From<GraphError> for StorageError {
    fn from(e: GraphError) -> Self {
        match e {
            GraphError::EntityNotFound(id) => Self::NotFound(id),
            GraphError::EndpointNotFound(id) => Self::EndpointNotFound(id),
            GraphError::Duplicate(id) => Self::Duplicate(id),
            GraphError::Model(m) => Self::Validation(m),
            GraphError::Io(io) => Self::Io(io),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}
