//! No-op storage used when `enabled = false` or when backend construction
//! fails (spec §4.4): mutations return synthetic-but-stable ids, reads
//! return empty, grounded on `llmspell-core::mocks::service::MockServiceInfrastructure`.

use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use kosmos_core::{Annotation, Entity, Relationship};
use kosmos_storage_traits::{
    ExportFormat, ImportMode, QueryOptions, QuerySpec, Result, Statistics, WorldModelStore,
};
use tracing::warn;

#[derive(Debug, Default)]
pub struct DegradedStore;

#[async_trait]
impl WorldModelStore for DegradedStore {
    async fn add_entity(&self, entity: Entity) -> Result<String> {
        warn!(entity_id = %entity.id, "world model degraded: add_entity is a no-op");
        Ok(entity.id)
    }

    async fn get_entity(&self, _id: &str) -> Result<Option<Entity>> {
        Ok(None)
    }

    async fn update_entity(&self, _entity: Entity) -> Result<()> {
        Ok(())
    }

    async fn delete_entity(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn add_relationship(&self, relationship: Relationship) -> Result<String> {
        warn!(relationship_id = %relationship.id, "world model degraded: add_relationship is a no-op");
        Ok(relationship.id)
    }

    async fn query(&self, _spec: QuerySpec, _options: QueryOptions) -> Result<Vec<Entity>> {
        Ok(Vec::new())
    }

    fn iterate_entities(&self, _project: Option<String>) -> BoxStream<'static, Entity> {
        Box::pin(stream::empty())
    }

    async fn get_statistics(&self) -> Result<Statistics> {
        Ok(Statistics::default())
    }

    async fn export_graph(&self, _path: &Path, _project: Option<&str>, _format: ExportFormat) -> Result<()> {
        Ok(())
    }

    async fn import_graph(&self, _path: &Path, _project: Option<&str>, _mode: ImportMode) -> Result<usize> {
        Ok(0)
    }

    async fn add_annotation(&self, _entity_id: &str, _annotation: Annotation) -> Result<()> {
        Ok(())
    }

    async fn reset(&self, _project: Option<&str>, _confirm: bool) -> Result<()> {
        Ok(())
    }
}
