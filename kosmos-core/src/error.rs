//! Error types for the entity/relationship model

use thiserror::Error;

/// Result type alias for `kosmos-core` operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised while constructing or validating entities and relationships
#[derive(Debug, Error)]
pub enum ModelError {
    /// Confidence outside `[0.0, 1.0]`
    #[error("confidence must be within [0.0, 1.0], got {0}")]
    InvalidConfidence(f64),

    /// Required scalar field missing or empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Annotation text or creator was empty
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(&'static str),

    /// Serialization round-trip failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
