//! On-disk node/edge representation for the SurrealDB backend.
//!
//! The open `properties` map is stored as a serialized JSON string (to
//! sidestep the backend's flat-property restriction) with a parallel
//! `properties_text` field maintained for full-text search, per spec §4.3.

use chrono::{DateTime, Utc};
use kosmos_core::{Annotation, Entity, EntityType, Relationship, RelationshipType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AnnotationRecord {
    pub text: String,
    pub created_by: String,
    pub created_at: surrealdb::sql::Datetime,
}

impl From<&Annotation> for AnnotationRecord {
    fn from(a: &Annotation) -> Self {
        Self {
            text: a.text.clone(),
            created_by: a.created_by.clone(),
            created_at: a.created_at.into(),
        }
    }
}

impl From<AnnotationRecord> for Annotation {
    fn from(r: AnnotationRecord) -> Self {
        Self {
            text: r.text,
            created_by: r.created_by,
            created_at: datetime_to_chrono(&r.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EntityRecord {
    #[serde(skip_serializing)]
    pub id: Option<surrealdb::sql::Thing>,
    pub entity_type: String,
    pub properties: String,
    pub properties_text: String,
    pub confidence: f64,
    pub project: Option<String>,
    pub created_at: surrealdb::sql::Datetime,
    pub updated_at: surrealdb::sql::Datetime,
    pub created_by: String,
    pub verified: bool,
    pub annotations: Vec<AnnotationRecord>,
}

impl EntityRecord {
    pub fn from_entity(entity: &Entity) -> Result<Self> {
        let properties = serde_json::to_string(&entity.properties)?;
        let properties_text = flatten_properties_text(&entity.properties);
        Ok(Self {
            id: None,
            entity_type: entity.entity_type.as_str().to_string(),
            properties,
            properties_text,
            confidence: entity.confidence,
            project: entity.project.clone(),
            created_at: entity.created_at.into(),
            updated_at: entity.updated_at.into(),
            created_by: entity.created_by.clone(),
            verified: entity.verified,
            annotations: entity.annotations.iter().map(AnnotationRecord::from).collect(),
        })
    }

    pub fn into_entity(self, id: &str) -> Result<Entity> {
        let properties: Value = serde_json::from_str(&self.properties)?;
        Ok(Entity {
            id: id.to_string(),
            entity_type: EntityType::from_str_warn(&self.entity_type),
            properties,
            confidence: self.confidence,
            project: self.project,
            created_at: datetime_to_chrono(&self.created_at),
            updated_at: datetime_to_chrono(&self.updated_at),
            created_by: self.created_by,
            verified: self.verified,
            annotations: self.annotations.into_iter().map(Annotation::from).collect(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct RelationshipRecord {
    #[serde(skip_serializing)]
    pub id: Option<surrealdb::sql::Thing>,
    /// The logical `Relationship.id` (a v4 UUID), stored as a plain field
    /// rather than the backend's own record handle so `addRelationship`'s
    /// returned id is stable across export/import regardless of how the
    /// backend reassigns its internal handle.
    pub relationship_id: String,
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    pub properties: String,
    pub confidence: f64,
    pub created_at: surrealdb::sql::Datetime,
    pub created_by: String,
}

impl RelationshipRecord {
    pub fn from_relationship(relationship: &Relationship) -> Result<Self> {
        Ok(Self {
            id: None,
            relationship_id: relationship.id.clone(),
            source_id: relationship.source_id.clone(),
            target_id: relationship.target_id.clone(),
            relationship_type: relationship.rel_type.as_str().to_string(),
            properties: serde_json::to_string(&relationship.properties)?,
            confidence: relationship.confidence,
            created_at: relationship.created_at.into(),
            created_by: relationship.created_by.clone(),
        })
    }

    pub fn into_relationship(self) -> Result<Relationship> {
        let properties: Value = serde_json::from_str(&self.properties)?;
        Ok(Relationship {
            id: self.relationship_id,
            source_id: self.source_id,
            target_id: self.target_id,
            rel_type: RelationshipType::from_str_warn(&self.relationship_type),
            properties,
            confidence: self.confidence,
            created_at: datetime_to_chrono(&self.created_at),
            created_by: self.created_by,
        })
    }
}

fn datetime_to_chrono(dt: &surrealdb::sql::Datetime) -> DateTime<Utc> {
    dt.clone().0
}

/// Flatten scalar and list-of-scalar property values into `"key: value"`
/// segments for the full-text index, per spec §4.3.
pub(crate) fn flatten_properties_text(properties: &Value) -> String {
    let Value::Object(map) = properties else {
        return String::new();
    };
    let mut segments = Vec::new();
    for (key, value) in map {
        match value {
            Value::String(s) => segments.push(format!("{key}: {s}")),
            Value::Number(n) => segments.push(format!("{key}: {n}")),
            Value::Bool(b) => segments.push(format!("{key}: {b}")),
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                if !joined.is_empty() {
                    segments.push(format!("{key}: {joined}"));
                }
            }
            _ => {}
        }
    }
    segments.join(" | ")
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn thing_to_id(thing: Option<surrealdb::sql::Thing>) -> Result<String> {
    thing
        .map(|t| t.id.to_string())
        .ok_or_else(|| GraphError::Query("missing record id".to_string()))
}
