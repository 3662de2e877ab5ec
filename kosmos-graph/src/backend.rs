//! SurrealDB-backed implementation of [`WorldModelStore`], grounded on
//! `llmspell-graph::storage::surrealdb::SurrealDBBackend`.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use kosmos_core::{Annotation, Entity, Relationship};
use kosmos_storage_traits::{ExportFormat, ImportMode, QueryOptions, QuerySpec, StorageError, Statistics, WorldModelStore};
use serde::Deserialize;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;
use tracing::{debug, instrument, warn};

use crate::error::{GraphError, Result};
use crate::records::{thing_to_id, EntityRecord, RelationshipRecord};

const ENTITY_TABLE: &str = "entity";
const RELATIONSHIP_TABLE: &str = "relationship";

/// Property-graph backend reached over SurrealDB's embedded RocksDB engine
/// (spec §4.3: "a binary protocol property-graph database").
pub struct SurrealGraphBackend {
    db: Surreal<Db>,
}

impl SurrealGraphBackend {
    /// Open (or create) a backend rooted at `data_dir`, initializing schema
    /// on first use.
    pub async fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let db = Surreal::new::<RocksDb>(data_dir.as_ref()).await?;
        db.use_ns("kosmos").use_db("world_model").await?;
        let backend = Self { db };
        backend.initialize_schema().await?;
        Ok(backend)
    }

    /// Open an ephemeral backend in a fresh temp directory; used by tests
    /// and by the degraded/in-memory configuration path.
    pub async fn new_temp() -> Result<(Self, tempfile::TempDir)> {
        let dir = tempfile::tempdir()?;
        let backend = Self::new(dir.path()).await?;
        Ok((backend, dir))
    }

    async fn initialize_schema(&self) -> Result<()> {
        self.db
            .query(
                "
                DEFINE TABLE IF NOT EXISTS entity SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS entity_type_idx ON entity FIELDS entity_type;
                DEFINE INDEX IF NOT EXISTS entity_project_idx ON entity FIELDS project;
                DEFINE ANALYZER IF NOT EXISTS properties_analyzer TOKENIZERS blank,class FILTERS lowercase;
                DEFINE INDEX IF NOT EXISTS entity_properties_text_idx ON entity
                    FIELDS properties_text SEARCH ANALYZER properties_analyzer BM25;

                DEFINE TABLE IF NOT EXISTS relationship SCHEMALESS;
                DEFINE INDEX IF NOT EXISTS relationship_source_idx ON relationship FIELDS source_id;
                DEFINE INDEX IF NOT EXISTS relationship_target_idx ON relationship FIELDS target_id;
                DEFINE INDEX IF NOT EXISTS relationship_type_idx ON relationship FIELDS relationship_type;
                ",
            )
            .await?;
        Ok(())
    }

    async fn entity_exists(&self, id: &str) -> Result<bool> {
        Ok(self.get_entity(id).await?.is_some())
    }

    /// Full-text search over `properties_text`, supplementing the core
    /// contract per the expanded requirements.
    #[instrument(skip(self))]
    pub async fn search(&self, text: &str, project: Option<&str>, limit: usize) -> Result<Vec<Entity>> {
        let mut response = self
            .db
            .query("SELECT * FROM entity WHERE properties_text @@ $text AND ($project IS NONE OR project = $project) LIMIT $limit")
            .bind(("text", text.to_string()))
            .bind(("project", project.map(ToString::to_string)))
            .bind(("limit", limit as i64))
            .await?;
        let records: Vec<EntityRecord> = response.take(0)?;
        records_to_entities(records)
    }

    /// Breadth-first traversal outward from `start_id` up to `depth` hops,
    /// grounded on `GraphBackend::traverse` in `llmspell-graph`.
    #[instrument(skip(self))]
    pub async fn traverse(&self, start_id: &str, depth: usize) -> Result<Vec<Entity>> {
        if !self.entity_exists(start_id).await? {
            return Err(GraphError::EntityNotFound(start_id.to_string()));
        }
        let mut visited = HashSet::new();
        visited.insert(start_id.to_string());
        let mut frontier = vec![start_id.to_string()];
        let mut collected = Vec::new();

        for _ in 0..depth {
            if frontier.is_empty() {
                break;
            }
            let mut next_frontier = Vec::new();
            for id in &frontier {
                for neighbor in self.neighbor_ids(id).await? {
                    if visited.insert(neighbor.clone()) {
                        if let Some(entity) = self.get_entity(&neighbor).await? {
                            collected.push(entity);
                        }
                        next_frontier.push(neighbor);
                    }
                }
            }
            frontier = next_frontier;
        }
        Ok(collected)
    }

    async fn neighbor_ids(&self, id: &str) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct Row {
            target_id: String,
        }
        let mut query = self
            .db
            .query("SELECT target_id FROM relationship WHERE source_id = $id")
            .bind(("id", id.to_string()));
        let rows: Vec<Row> = query.take(0)?;
        Ok(rows.into_iter().map(|r| r.target_id).collect())
    }
}

impl SurrealGraphBackend {
    #[instrument(skip(self, entity), fields(entity_id = %entity.id))]
    async fn add_entity(&self, entity: Entity) -> Result<String> {
        if self.entity_exists(&entity.id).await? {
            return Err(GraphError::Duplicate(entity.id));
        }
        let record = EntityRecord::from_entity(&entity)?;
        let thing = (ENTITY_TABLE, entity.id.as_str());
        let created: Option<EntityRecord> = self.db.create(thing).content(record).await?;
        debug!(created = created.is_some(), "entity inserted");
        Ok(entity.id)
    }

    async fn get_entity(&self, id: &str) -> Result<Option<Entity>> {
        let record: Option<EntityRecord> = self.db.select((ENTITY_TABLE, id)).await?;
        record.map(|r| r.into_entity(id)).transpose()
    }

    async fn update_entity(&self, mut entity: Entity) -> Result<()> {
        if !self.entity_exists(&entity.id).await? {
            return Err(GraphError::EntityNotFound(entity.id));
        }
        entity.touch();
        let record = EntityRecord::from_entity(&entity)?;
        let _: Option<EntityRecord> = self.db.update((ENTITY_TABLE, entity.id.as_str())).content(record).await?;
        Ok(())
    }

    async fn delete_entity(&self, id: &str) -> Result<()> {
        if !self.entity_exists(id).await? {
            return Err(GraphError::EntityNotFound(id.to_string()));
        }
        self.db
            .query("DELETE relationship WHERE source_id = $id OR target_id = $id")
            .bind(("id", id.to_string()))
            .await?;
        let _: Option<EntityRecord> = self.db.delete((ENTITY_TABLE, id)).await?;
        Ok(())
    }

    async fn add_relationship(&self, relationship: Relationship) -> Result<String> {
        if !self.entity_exists(&relationship.source_id).await? {
            return Err(GraphError::EndpointNotFound(relationship.source_id.clone()));
        }
        if !self.entity_exists(&relationship.target_id).await? {
            return Err(GraphError::EndpointNotFound(relationship.target_id.clone()));
        }
        let relationship_id = relationship.id.clone();
        let record = RelationshipRecord::from_relationship(&relationship)?;
        let created: Option<RelationshipRecord> = self.db.create(RELATIONSHIP_TABLE).content(record).await?;
        created.ok_or_else(|| GraphError::Query("insert returned no record".to_string()))?;
        Ok(relationship_id)
    }

    async fn query(&self, spec: QuerySpec, options: QueryOptions) -> Result<Vec<Entity>> {
        let mut clauses = Vec::new();
        if let Some(filter) = spec.filter {
            clauses.push(format!("({filter})"));
        }
        if options.project.is_some() {
            clauses.push("project = $project".to_string());
        }
        if options.entity_type.is_some() {
            clauses.push("entity_type = $entity_type".to_string());
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let limit_clause = options.limit.map(|l| format!(" LIMIT {l}")).unwrap_or_default();
        let sql = format!("SELECT * FROM entity {where_clause}{limit_clause}");

        let mut query = self
            .db
            .query(sql)
            .bind(("project", options.project.clone()))
            .bind(("entity_type", options.entity_type.as_ref().map(|t| t.as_str().to_string())));
        let records: Vec<EntityRecord> = query.take(0)?;
        records_to_entities(records)
    }

    fn iterate_entities(&self, project: Option<String>) -> BoxStream<'static, Entity> {
        let db = self.db.clone();
        Box::pin(
            stream::once(async move {
                let sql = match &project {
                    Some(_) => "SELECT * FROM entity WHERE project = $project",
                    None => "SELECT * FROM entity",
                };
                let records: Vec<EntityRecord> = match db.query(sql).bind(("project", project)).await {
                    Ok(mut response) => response.take(0).unwrap_or_default(),
                    Err(error) => {
                        warn!(%error, "iterate_entities query failed");
                        Vec::new()
                    }
                };
                let entities: Vec<Entity> = records_to_entities(records).unwrap_or_default();
                stream::iter(entities)
            })
            .flatten(),
        )
    }

    #[instrument(skip(self))]
    async fn get_statistics(&self) -> Result<Statistics> {
        #[derive(Deserialize)]
        struct TypeCount {
            entity_type: String,
            count: i64,
        }
        let mut q1 = self
            .db
            .query("SELECT entity_type, count() AS count FROM entity GROUP BY entity_type")
            .await?;
        let type_counts: Vec<TypeCount> = q1.take(0)?;

        #[derive(Deserialize)]
        struct RelCount {
            relationship_type: String,
            count: i64,
        }
        let mut q2 = self
            .db
            .query("SELECT relationship_type, count() AS count FROM relationship GROUP BY relationship_type")
            .await?;
        let rel_counts: Vec<RelCount> = q2.take(0)?;

        #[derive(Deserialize)]
        struct ProjectRow {
            project: Option<String>,
        }
        let mut q3 = self.db.query("SELECT project FROM entity GROUP BY project").await?;
        let project_rows: Vec<ProjectRow> = q3.take(0)?;

        Ok(Statistics {
            entity_counts: type_counts.into_iter().map(|t| (t.entity_type, t.count as usize)).collect(),
            relationship_counts: rel_counts.into_iter().map(|r| (r.relationship_type, r.count as usize)).collect(),
            projects: project_rows.into_iter().filter_map(|p| p.project).collect(),
        })
    }

    #[instrument(skip(self, path))]
    async fn export_graph(&self, path: &Path, project: Option<&str>, format: ExportFormat) -> Result<()> {
        let ExportFormat::Json = format;
        let options = project.map_or_else(QueryOptions::default, |p| QueryOptions::default().with_project(p));
        let entities = self.query(QuerySpec::all(), options).await?;
        let entity_ids: HashSet<&str> = entities.iter().map(|e| e.id.as_str()).collect();

        let mut q = self.db.query("SELECT * FROM relationship").await?;
        let all_relationships: Vec<RelationshipRecord> = q.take(0)?;
        let mut relationships = Vec::new();
        for record in all_relationships {
            if entity_ids.contains(record.source_id.as_str()) || entity_ids.contains(record.target_id.as_str()) {
                relationships.push(record.into_relationship()?);
            }
        }

        let statistics = Statistics {
            entity_counts: count_by(entities.iter().map(|e| e.entity_type.as_str().to_string())),
            relationship_counts: count_by(relationships.iter().map(|r| r.rel_type.as_str().to_string())),
            projects: project.map(ToString::to_string).into_iter().collect(),
        };
        let document = ExportDocument {
            version: "1.0".to_string(),
            export_date: chrono::Utc::now(),
            source: "kosmos".to_string(),
            mode: "simple".to_string(),
            project: project.map(ToString::to_string),
            statistics,
            entities,
            relationships,
        };
        let json = serde_json::to_string_pretty(&document)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    #[instrument(skip(self, path))]
    async fn import_graph(&self, path: &Path, project: Option<&str>, mode: ImportMode) -> Result<usize> {
        let raw = tokio::fs::read_to_string(path).await?;
        let document: ExportDocument = serde_json::from_str(&raw)?;
        check_version(&document.version)?;

        if mode == ImportMode::Replace {
            self.reset(project, true).await?;
        }

        let mut imported = 0;
        for mut entity in document.entities {
            if let Some(project) = project {
                entity = entity.with_project(project);
            }
            match mode {
                ImportMode::Replace => {
                    self.add_entity(entity).await?;
                }
                // Upsert: properties overwritten, updated_at advanced, annotations
                // concatenated (spec §4.9).
                ImportMode::Merge => match self.get_entity(&entity.id).await? {
                    Some(mut existing) => {
                        existing.properties = entity.properties;
                        existing.confidence = entity.confidence;
                        existing.verified = entity.verified;
                        existing.annotations.extend(entity.annotations);
                        existing.touch();
                        self.update_entity(existing).await?;
                    }
                    None => {
                        self.add_entity(entity).await?;
                    }
                },
            }
            imported += 1;
        }
        for relationship in document.relationships {
            match self.add_relationship(relationship).await {
                Ok(_) => {}
                Err(GraphError::EndpointNotFound(missing)) => {
                    warn!(missing, "skipping relationship with missing endpoint during import");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(imported)
    }

    async fn add_annotation(&self, entity_id: &str, annotation: Annotation) -> Result<()> {
        let mut entity = self
            .get_entity(entity_id)
            .await?
            .ok_or_else(|| GraphError::EntityNotFound(entity_id.to_string()))?;
        entity.annotations.push(annotation);
        entity.touch();
        self.update_entity(entity).await
    }

    #[instrument(skip(self))]
    async fn reset(&self, project: Option<&str>, confirm: bool) -> Result<()> {
        if !confirm {
            return Err(GraphError::Query("reset requires explicit confirmation".to_string()));
        }
        match project {
            Some(project) => {
                self.db
                    .query(
                        "DELETE relationship WHERE source_id IN (SELECT VALUE id FROM entity WHERE project = $project) \
                            OR target_id IN (SELECT VALUE id FROM entity WHERE project = $project); \
                         DELETE entity WHERE project = $project;",
                    )
                    .bind(("project", project.to_string()))
                    .await?;
            }
            None => {
                self.db.query("DELETE relationship; DELETE entity;").await?;
            }
        }
        Ok(())
    }
}

/// Thin delegation to the inherent methods above: the trait fixes
/// [`StorageError`] as the error type, while the inherent methods (used
/// directly by this crate's own tests and helpers) carry the
/// backend-specific [`GraphError`] variants callers match on.
#[async_trait]
impl WorldModelStore for SurrealGraphBackend {
    async fn add_entity(&self, entity: Entity) -> kosmos_storage_traits::Result<String> {
        self.add_entity(entity).await.map_err(StorageError::from)
    }

    async fn get_entity(&self, id: &str) -> kosmos_storage_traits::Result<Option<Entity>> {
        self.get_entity(id).await.map_err(StorageError::from)
    }

    async fn update_entity(&self, entity: Entity) -> kosmos_storage_traits::Result<()> {
        self.update_entity(entity).await.map_err(StorageError::from)
    }

    async fn delete_entity(&self, id: &str) -> kosmos_storage_traits::Result<()> {
        self.delete_entity(id).await.map_err(StorageError::from)
    }

    async fn add_relationship(&self, relationship: Relationship) -> kosmos_storage_traits::Result<String> {
        self.add_relationship(relationship).await.map_err(StorageError::from)
    }

    async fn query(&self, spec: QuerySpec, options: QueryOptions) -> kosmos_storage_traits::Result<Vec<Entity>> {
        self.query(spec, options).await.map_err(StorageError::from)
    }

    fn iterate_entities(&self, project: Option<String>) -> BoxStream<'static, Entity> {
        self.iterate_entities(project)
    }

    async fn get_statistics(&self) -> kosmos_storage_traits::Result<Statistics> {
        self.get_statistics().await.map_err(StorageError::from)
    }

    async fn export_graph(&self, path: &Path, project: Option<&str>, format: ExportFormat) -> kosmos_storage_traits::Result<()> {
        self.export_graph(path, project, format).await.map_err(StorageError::from)
    }

    async fn import_graph(&self, path: &Path, project: Option<&str>, mode: ImportMode) -> kosmos_storage_traits::Result<usize> {
        self.import_graph(path, project, mode).await.map_err(StorageError::from)
    }

    async fn add_annotation(&self, entity_id: &str, annotation: Annotation) -> kosmos_storage_traits::Result<()> {
        self.add_annotation(entity_id, annotation).await.map_err(StorageError::from)
    }

    async fn reset(&self, project: Option<&str>, confirm: bool) -> kosmos_storage_traits::Result<()> {
        self.reset(project, confirm).await.map_err(StorageError::from)
    }
}

fn records_to_entities(records: Vec<EntityRecord>) -> Result<Vec<Entity>> {
    records
        .into_iter()
        .map(|r| {
            let id = thing_to_id(r.id.clone())?;
            r.into_entity(&id)
        })
        .collect()
}

#[derive(Debug, serde::Serialize, Deserialize)]
struct ExportDocument {
    version: String,
    export_date: chrono::DateTime<chrono::Utc>,
    source: String,
    mode: String,
    project: Option<String>,
    statistics: Statistics,
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

fn count_by(keys: impl Iterator<Item = String>) -> HashMapCounts {
    let mut counts = HashMapCounts::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

type HashMapCounts = std::collections::HashMap<String, usize>;

/// Export documents are versioned `major.minor`; imports reject a mismatched
/// major version outright and only warn on a minor mismatch (spec §4.9).
fn check_version(version: &str) -> Result<()> {
    let mut parts = version.splitn(2, '.');
    let major = parts.next().unwrap_or("0");
    let minor = parts.next().unwrap_or("0");
    if major != "1" {
        return Err(GraphError::Query(format!("unsupported export major version: {version}")));
    }
    if minor != "0" {
        warn!(version, "importing export document with a newer minor version");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kosmos_core::{EntityType, RelationshipType};
    use serde_json::json;

    async fn backend() -> (SurrealGraphBackend, tempfile::TempDir) {
        SurrealGraphBackend::new_temp().await.unwrap()
    }

    #[tokio::test]
    async fn add_and_get_round_trip() {
        let (backend, _dir) = backend().await;
        let entity = Entity::new(EntityType::Hypothesis, json!({"statement": "x"}), "agent").unwrap();
        let id = backend.add_entity(entity.clone()).await.unwrap();
        let fetched = backend.get_entity(&id).await.unwrap().unwrap();
        assert_eq!(fetched.id, entity.id);
        assert_eq!(fetched.properties, entity.properties);
    }

    #[tokio::test]
    async fn duplicate_entity_id_rejected() {
        let (backend, _dir) = backend().await;
        let entity = Entity::new(EntityType::Concept, json!({}), "agent").unwrap();
        backend.add_entity(entity.clone()).await.unwrap();
        let err = backend.add_entity(entity).await.unwrap_err();
        assert!(matches!(err, GraphError::Duplicate(_)));
    }

    #[tokio::test]
    async fn relationship_requires_existing_endpoints() {
        let (backend, _dir) = backend().await;
        let a = Entity::new(EntityType::Hypothesis, json!({}), "agent").unwrap();
        backend.add_entity(a.clone()).await.unwrap();
        let relationship = Relationship::new(a.id.clone(), "missing-target".to_string(), RelationshipType::Tests, "agent", 1.0).unwrap();
        let err = backend.add_relationship(relationship).await.unwrap_err();
        assert!(matches!(err, GraphError::EndpointNotFound(_)));
    }

    #[tokio::test]
    async fn delete_entity_cascades_to_relationships() {
        let (backend, _dir) = backend().await;
        let a = Entity::new(EntityType::Hypothesis, json!({}), "agent").unwrap();
        let b = Entity::new(EntityType::ExperimentProtocol, json!({}), "agent").unwrap();
        backend.add_entity(a.clone()).await.unwrap();
        backend.add_entity(b.clone()).await.unwrap();
        let relationship = Relationship::new(a.id.clone(), b.id.clone(), RelationshipType::Tests, "agent", 1.0).unwrap();
        backend.add_relationship(relationship).await.unwrap();

        backend.delete_entity(&a.id).await.unwrap();
        let neighbors = backend.neighbor_ids(&a.id).await.unwrap();
        assert!(neighbors.is_empty());
    }

    #[tokio::test]
    async fn add_relationship_returns_stable_logical_id() {
        let (backend, _dir) = backend().await;
        let a = Entity::new(EntityType::Hypothesis, json!({}), "agent").unwrap();
        let b = Entity::new(EntityType::ExperimentProtocol, json!({}), "agent").unwrap();
        backend.add_entity(a.clone()).await.unwrap();
        backend.add_entity(b.clone()).await.unwrap();
        let relationship = Relationship::new(a.id.clone(), b.id.clone(), RelationshipType::Tests, "agent", 1.0).unwrap();
        let expected_id = relationship.id.clone();

        let returned_id = backend.add_relationship(relationship).await.unwrap();
        assert_eq!(returned_id, expected_id);

        let mut q = backend.db.query("SELECT * FROM relationship").await.unwrap();
        let stored: Vec<RelationshipRecord> = q.take(0).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].relationship_id, expected_id);
    }

    #[tokio::test]
    async fn reset_without_confirm_fails() {
        let (backend, _dir) = backend().await;
        let err = backend.reset(None, false).await.unwrap_err();
        assert!(matches!(err, GraphError::Query(_)));
    }

    #[tokio::test]
    async fn export_then_import_merge_round_trip() {
        let (backend, dir) = backend().await;
        let entity = Entity::new(EntityType::Finding, json!({"summary": "caffeine helps"}), "agent")
            .unwrap()
            .with_project("proj-1");
        backend.add_entity(entity.clone()).await.unwrap();

        let path = dir.path().join("export.json");
        backend.export_graph(&path, Some("proj-1"), ExportFormat::Json).await.unwrap();

        let (backend2, _dir2) = backend().await;
        let imported = backend2.import_graph(&path, Some("proj-1"), ImportMode::Merge).await.unwrap();
        assert_eq!(imported, 1);
        let fetched = backend2.get_entity(&entity.id).await.unwrap().unwrap();
        assert_eq!(fetched.project.as_deref(), Some("proj-1"));
    }
}
