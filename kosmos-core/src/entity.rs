//! Entities: the unit of persistent knowledge (spec §3.1)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ModelError, Result};

/// Closed set of well-known entity kinds, with an extension escape hatch.
///
/// Constructing an entity with an [`EntityType::Extension`] never fails
/// validation; callers are expected to log a warning (see
/// [`EntityType::from_str_warn`]) so unknown kinds can still be noticed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    Paper,
    Concept,
    Author,
    Method,
    Experiment,
    Hypothesis,
    Finding,
    Dataset,
    ResearchQuestion,
    ExperimentProtocol,
    ExperimentResult,
    /// Any kind outside the closed set above.
    Extension(String),
}

impl EntityType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Paper => "Paper",
            Self::Concept => "Concept",
            Self::Author => "Author",
            Self::Method => "Method",
            Self::Experiment => "Experiment",
            Self::Hypothesis => "Hypothesis",
            Self::Finding => "Finding",
            Self::Dataset => "Dataset",
            Self::ResearchQuestion => "ResearchQuestion",
            Self::ExperimentProtocol => "ExperimentProtocol",
            Self::ExperimentResult => "ExperimentResult",
            Self::Extension(s) => s.as_str(),
        }
    }

    /// Parse a type name, emitting a `tracing::warn!` for anything outside
    /// the closed set instead of failing construction.
    #[must_use]
    pub fn from_str_warn(s: &str) -> Self {
        let parsed = Self::from(s);
        if matches!(parsed, Self::Extension(_)) {
            tracing::warn!(entity_type = %s, "unrecognized entity type, treating as extension");
        }
        parsed
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        match s {
            "Paper" => Self::Paper,
            "Concept" => Self::Concept,
            "Author" => Self::Author,
            "Method" => Self::Method,
            "Experiment" => Self::Experiment,
            "Hypothesis" => Self::Hypothesis,
            "Finding" => Self::Finding,
            "Dataset" => Self::Dataset,
            "ResearchQuestion" => Self::ResearchQuestion,
            "ExperimentProtocol" => Self::ExperimentProtocol,
            "ExperimentResult" => Self::ExperimentResult,
            other => Self::Extension(other.to_string()),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for EntityType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// A single curation/provenance annotation attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub text: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    /// Construct a new annotation, stamping `created_at` at the current time.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidAnnotation`] if `text` or `created_by` is empty.
    pub fn new(text: impl Into<String>, created_by: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let created_by = created_by.into();
        if text.is_empty() {
            return Err(ModelError::InvalidAnnotation("text must be non-empty"));
        }
        if created_by.is_empty() {
            return Err(ModelError::InvalidAnnotation("created_by must be non-empty"));
        }
        Ok(Self {
            text,
            created_by,
            created_at: Utc::now(),
        })
    }
}

/// An entity: the unit of persistent knowledge (spec §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub properties: Value,
    pub confidence: f64,
    pub project: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub verified: bool,
    pub annotations: Vec<Annotation>,
}

impl Entity {
    /// Construct a new entity with an auto-generated id and `created_at == updated_at`.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfidence`] if `confidence` is outside `[0.0, 1.0]`.
    pub fn new(entity_type: EntityType, properties: Value, created_by: impl Into<String>) -> Result<Self> {
        Self::with_confidence(entity_type, properties, created_by, 1.0)
    }

    /// Construct with an explicit confidence value.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidConfidence`] if `confidence` is outside `[0.0, 1.0]`.
    pub fn with_confidence(
        entity_type: EntityType,
        properties: Value,
        created_by: impl Into<String>,
        confidence: f64,
    ) -> Result<Self> {
        validate_confidence(confidence)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            entity_type,
            properties: normalize_properties(properties),
            confidence,
            project: None,
            created_at: now,
            updated_at: now,
            created_by: created_by.into(),
            verified: false,
            annotations: Vec::new(),
        })
    }

    /// Override the generated id (used by converters that preserve a
    /// relational primary key as the graph entity id).
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Attach a project namespace tag.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Touch `updated_at`, enforcing monotonicity: it never moves backwards.
    pub fn touch(&mut self) {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Append an annotation and advance `updated_at`.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidAnnotation`] if the annotation is malformed.
    pub fn annotate(&mut self, text: impl Into<String>, created_by: impl Into<String>) -> Result<()> {
        let annotation = Annotation::new(text, created_by)?;
        self.annotations.push(annotation);
        self.touch();
        Ok(())
    }

    /// Mark the entity verified by curation.
    pub fn verify(&mut self) {
        self.verified = true;
        self.touch();
    }

    /// Serialize to a JSON document. `from_dict(to_dict(e)) == e` for all valid `e`.
    ///
    /// # Errors
    /// Returns [`ModelError::Serialization`] if encoding fails.
    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize from a JSON document produced by [`Entity::to_dict`].
    ///
    /// # Errors
    /// Returns [`ModelError::Serialization`] if the document doesn't match the schema,
    /// or [`ModelError::InvalidConfidence`] if `confidence` is out of range.
    pub fn from_dict(value: Value) -> Result<Self> {
        let entity: Self = serde_json::from_value(value)?;
        validate_confidence(entity.confidence)?;
        Ok(entity)
    }
}

fn validate_confidence(confidence: f64) -> Result<()> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(())
    } else {
        Err(ModelError::InvalidConfidence(confidence))
    }
}

/// The open `properties` map must be a JSON object; coerce bare scalars
/// into an empty object rather than silently accepting a malformed shape.
fn normalize_properties(value: Value) -> Value {
    match value {
        Value::Object(_) => value,
        Value::Null => Value::Object(Map::new()),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trip_preserves_all_fields() {
        let mut entity = Entity::new(
            EntityType::Hypothesis,
            json!({"statement": "caffeine improves focus"}),
            "HypothesisGeneratorAgent",
        )
        .unwrap();
        entity.annotate("looks promising", "curator-1").unwrap();
        entity.verify();

        let dict = entity.to_dict().unwrap();
        let restored = Entity::from_dict(dict).unwrap();

        assert_eq!(restored.id, entity.id);
        assert_eq!(restored.entity_type, entity.entity_type);
        assert_eq!(restored.properties, entity.properties);
        assert_eq!(restored.confidence, entity.confidence);
        assert_eq!(restored.verified, entity.verified);
        assert_eq!(restored.annotations, entity.annotations);
        assert_eq!(restored.created_at, entity.created_at);
        assert_eq!(restored.updated_at, entity.updated_at);
    }

    #[test]
    fn confidence_out_of_range_fails_validation() {
        let err = Entity::with_confidence(EntityType::Paper, json!({}), "agent", 1.5).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfidence(_)));

        let err = Entity::with_confidence(EntityType::Paper, json!({}), "agent", -0.1).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfidence(_)));
    }

    #[test]
    fn unknown_type_is_extension_not_error() {
        let entity = Entity::new(EntityType::from_str_warn("Widget"), json!({}), "agent").unwrap();
        assert_eq!(entity.entity_type, EntityType::Extension("Widget".into()));
    }

    #[test]
    fn empty_annotation_text_rejected() {
        let mut entity = Entity::new(EntityType::Concept, json!({}), "agent").unwrap();
        let err = entity.annotate("", "someone").unwrap_err();
        assert!(matches!(err, ModelError::InvalidAnnotation(_)));
    }

    #[test]
    fn created_at_never_exceeds_updated_at() {
        let entity = Entity::new(EntityType::Concept, json!({}), "agent").unwrap();
        assert!(entity.created_at <= entity.updated_at);
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.entity_type == other.entity_type
            && self.properties == other.properties
            && (self.confidence - other.confidence).abs() < f64::EPSILON
            && self.project == other.project
            && self.created_at == other.created_at
            && self.updated_at == other.updated_at
            && self.created_by == other.created_by
            && self.verified == other.verified
            && self.annotations == other.annotations
    }
}
