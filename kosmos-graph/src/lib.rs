//! Property-graph backend for the Kosmos world model: a derived,
//! best-effort view reached over SurrealDB's embedded engine, grounded on
//! `llmspell-graph`.

pub mod backend;
pub mod error;
mod records;

pub use backend::SurrealGraphBackend;
pub use error::{GraphError, Result};
