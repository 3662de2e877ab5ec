//! Error taxonomy for the director (spec §7), grounded on
//! `llmspell-core::error::LLMSpellError`'s kind-not-type enum shape.

use kosmos_core::ModelError;
use thiserror::Error;

use crate::state::DirectorState;

pub type Result<T> = std::result::Result<T, DirectorError>;

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("validation failed: {0}")]
    Validation(#[from] ModelError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: DirectorState, to: DirectorState },

    #[error("export/import major version mismatch: {0}")]
    VersionMismatch(String),

    #[error("relational store error: {0}")]
    Relational(#[from] kosmos_relational::RelationalError),

    #[error("message bus error: {0}")]
    Bus(#[from] kosmos_bus::BusError),
}

impl From<kosmos_storage_traits::StorageError> for DirectorError {
    fn from(e: kosmos_storage_traits::StorageError) -> Self {
        use kosmos_storage_traits::StorageError as SE;
        match e {
            SE::Validation(m) => Self::Validation(m),
            SE::NotFound(id) | SE::EndpointNotFound(id) => Self::NotFound(id),
            SE::Duplicate(id) => Self::Duplicate(id),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}
