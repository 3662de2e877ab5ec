//! The single abstract storage contract every backend satisfies
//! (spec §4.2), grounded on the `KnowledgeGraph`/`GraphBackend` split in
//! `llmspell-graph`, generalized to cover both the graph and relational
//! mirrors uniformly.

pub mod error;
pub mod query;

use std::path::Path;

use async_trait::async_trait;
use futures::stream::BoxStream;
use kosmos_core::{Annotation, Entity, Relationship};

pub use error::{Result, StorageError};
pub use query::{ExportFormat, ImportMode, QueryOptions, QuerySpec, Statistics};

/// Every storage backend (the graph mirror, the degraded no-op wrapper,
/// future polyglot backends) implements this single contract.
#[async_trait]
pub trait WorldModelStore: Send + Sync {
    /// Insert a new entity. Fails with [`StorageError::Duplicate`] if `entity.id`
    /// is already present.
    async fn add_entity(&self, entity: Entity) -> Result<String>;

    /// Look up an entity by id. Returns `Ok(None)` if absent.
    async fn get_entity(&self, id: &str) -> Result<Option<Entity>>;

    /// Overwrite an existing entity's mutable fields; advances `updated_at`.
    async fn update_entity(&self, entity: Entity) -> Result<()>;

    /// Delete an entity and its incident edges.
    async fn delete_entity(&self, id: &str) -> Result<()>;

    /// Insert a directed edge. Fails with [`StorageError::EndpointNotFound`]
    /// if either endpoint is absent. Parallel edges of the same type between
    /// the same pair are permitted.
    async fn add_relationship(&self, relationship: Relationship) -> Result<String>;

    /// Run a backend-specific query with cross-cutting filters applied.
    async fn query(&self, spec: QuerySpec, options: QueryOptions) -> Result<Vec<Entity>>;

    /// A restartable, per-call sequence over all entities in `project`
    /// (or every project if `None`). Each call produces a fresh stream.
    fn iterate_entities(&self, project: Option<String>) -> BoxStream<'static, Entity>;

    /// Counts by type, relationship counts, and known projects.
    async fn get_statistics(&self) -> Result<Statistics>;

    /// Write the export document described in spec §4.9 to `path`.
    async fn export_graph(&self, path: &Path, project: Option<&str>, format: ExportFormat) -> Result<()>;

    /// Load an export document from `path`, upserting (merge) or resetting
    /// the target project first (replace). Returns the count imported.
    async fn import_graph(&self, path: &Path, project: Option<&str>, mode: ImportMode) -> Result<usize>;

    /// Append an annotation to an entity's `annotations` list, persisted on write.
    async fn add_annotation(&self, entity_id: &str, annotation: Annotation) -> Result<()>;

    /// Delete all entities (and incident edges) in `project`, or everything
    /// if `project` is `None`. Fails with [`StorageError::MissingConfirm`]
    /// unless `confirm` is `true`.
    async fn reset(&self, project: Option<&str>, confirm: bool) -> Result<()>;
}
