//! The world-model facade (spec §4.4): delegates to the configured store,
//! attaches the active project tag, validates inputs, and records one
//! metric per operation.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use kosmos_core::{Annotation, Entity, ModelError, Relationship};
use kosmos_storage_traits::{
    ExportFormat, ImportMode, QueryOptions, QuerySpec, Result, StorageError, Statistics, WorldModelStore,
};

use crate::config::WorldModelConfig;
use crate::metrics::timed;

/// Readiness surface for the factory's graceful-degradation path (spec
/// §4.4), exposed as a gauge rather than only a log line (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldModelHealth {
    Healthy,
    Degraded,
    Disabled,
}

pub struct WorldModel {
    store: Arc<dyn WorldModelStore>,
    config: WorldModelConfig,
    degraded: bool,
}

impl WorldModel {
    #[must_use]
    pub fn new(store: Arc<dyn WorldModelStore>, config: WorldModelConfig) -> Self {
        Self {
            store,
            config,
            degraded: false,
        }
    }

    /// Construct a facade already known to be backed by a degraded store —
    /// used by the factory when the real backend is disabled or unreachable.
    #[must_use]
    pub fn new_degraded(store: Arc<dyn WorldModelStore>, config: WorldModelConfig) -> Self {
        Self {
            store,
            config,
            degraded: true,
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldModelConfig {
        &self.config
    }

    #[must_use]
    pub fn health(&self) -> WorldModelHealth {
        if !self.config.enabled {
            WorldModelHealth::Disabled
        } else if self.degraded {
            WorldModelHealth::Degraded
        } else {
            WorldModelHealth::Healthy
        }
    }

    fn require_non_empty(field: &'static str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(StorageError::Validation(ModelError::MissingField(field)));
        }
        Ok(())
    }

    fn tag_project(&self, mut entity: Entity) -> Entity {
        if entity.project.is_none() {
            if let Some(project) = &self.config.project {
                entity = entity.with_project(project.clone());
            }
        }
        entity
    }
}

#[async_trait]
impl WorldModelStore for WorldModel {
    async fn add_entity(&self, entity: Entity) -> Result<String> {
        let entity = self.tag_project(entity);
        let project = entity.project.clone();
        timed!("add_entity", project.as_deref(), self.store.add_entity(entity))
    }

    async fn get_entity(&self, id: &str) -> Result<Option<Entity>> {
        Self::require_non_empty("id", id)?;
        timed!("get_entity", self.config.project.as_deref(), self.store.get_entity(id))
    }

    async fn update_entity(&self, entity: Entity) -> Result<()> {
        let entity = self.tag_project(entity);
        let project = entity.project.clone();
        timed!("update_entity", project.as_deref(), self.store.update_entity(entity))
    }

    async fn delete_entity(&self, id: &str) -> Result<()> {
        Self::require_non_empty("id", id)?;
        timed!("delete_entity", self.config.project.as_deref(), self.store.delete_entity(id))
    }

    async fn add_relationship(&self, relationship: Relationship) -> Result<String> {
        Self::require_non_empty("source_id", &relationship.source_id)?;
        Self::require_non_empty("target_id", &relationship.target_id)?;
        timed!(
            "add_relationship",
            self.config.project.as_deref(),
            self.store.add_relationship(relationship)
        )
    }

    async fn query(&self, spec: QuerySpec, mut options: QueryOptions) -> Result<Vec<Entity>> {
        if options.project.is_none() {
            options.project.clone_from(&self.config.project);
        }
        let project = options.project.clone();
        timed!("query", project.as_deref(), self.store.query(spec, options))
    }

    fn iterate_entities(&self, project: Option<String>) -> BoxStream<'static, Entity> {
        let project = project.or_else(|| self.config.project.clone());
        self.store.iterate_entities(project)
    }

    async fn get_statistics(&self) -> Result<Statistics> {
        timed!("get_statistics", self.config.project.as_deref(), self.store.get_statistics())
    }

    async fn export_graph(&self, path: &Path, project: Option<&str>, format: ExportFormat) -> Result<()> {
        let project = project.or(self.config.project.as_deref());
        timed!("export_graph", project, self.store.export_graph(path, project, format))
    }

    async fn import_graph(&self, path: &Path, project: Option<&str>, mode: ImportMode) -> Result<usize> {
        let project = project.or(self.config.project.as_deref());
        timed!("import_graph", project, self.store.import_graph(path, project, mode))
    }

    async fn add_annotation(&self, entity_id: &str, annotation: Annotation) -> Result<()> {
        Self::require_non_empty("entity_id", entity_id)?;
        timed!(
            "add_annotation",
            self.config.project.as_deref(),
            self.store.add_annotation(entity_id, annotation)
        )
    }

    async fn reset(&self, project: Option<&str>, confirm: bool) -> Result<()> {
        let project = project.or(self.config.project.as_deref());
        timed!("reset", project, self.store.reset(project, confirm))
    }
}
