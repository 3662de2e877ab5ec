//! Relationships: directed, typed, provenance-bearing edges (spec §3.2)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ModelError, Result};

/// Closed set of well-known relationship kinds, with an extension escape hatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    Cites,
    AuthorOf,
    Mentions,
    RelatesTo,
    Supports,
    Refutes,
    UsesMethod,
    ProducedBy,
    DerivedFrom,
    /// Workflow: hypothesis generated from a research question.
    SpawnedBy,
    /// Workflow: protocol designed to test a hypothesis.
    Tests,
    /// Workflow: hypothesis refined from a parent hypothesis.
    RefinedFrom,
    Extension(String),
}

impl RelationshipType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cites => "CITES",
            Self::AuthorOf => "AUTHOR_OF",
            Self::Mentions => "MENTIONS",
            Self::RelatesTo => "RELATES_TO",
            Self::Supports => "SUPPORTS",
            Self::Refutes => "REFUTES",
            Self::UsesMethod => "USES_METHOD",
            Self::ProducedBy => "PRODUCED_BY",
            Self::DerivedFrom => "DERIVED_FROM",
            Self::SpawnedBy => "SPAWNED_BY",
            Self::Tests => "TESTS",
            Self::RefinedFrom => "REFINED_FROM",
            Self::Extension(s) => s.as_str(),
        }
    }

    #[must_use]
    pub fn from_str_warn(s: &str) -> Self {
        let parsed = Self::from(s);
        if matches!(parsed, Self::Extension(_)) {
            tracing::warn!(relationship_type = %s, "unrecognized relationship type, treating as extension");
        }
        parsed
    }
}

impl From<&str> for RelationshipType {
    fn from(s: &str) -> Self {
        match s {
            "CITES" => Self::Cites,
            "AUTHOR_OF" => Self::AuthorOf,
            "MENTIONS" => Self::Mentions,
            "RELATES_TO" => Self::RelatesTo,
            "SUPPORTS" => Self::Supports,
            "REFUTES" => Self::Refutes,
            "USES_METHOD" => Self::UsesMethod,
            "PRODUCED_BY" => Self::ProducedBy,
            "DERIVED_FROM" => Self::DerivedFrom,
            "SPAWNED_BY" => Self::SpawnedBy,
            "TESTS" => Self::Tests,
            "REFINED_FROM" => Self::RefinedFrom,
            other => Self::Extension(other.to_string()),
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for RelationshipType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationshipType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// A directed typed edge with rich provenance properties (spec §3.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(rename = "type")]
    pub rel_type: RelationshipType,
    pub properties: Value,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Relationship {
    /// Construct a relationship directly. Prefer [`with_provenance`] when
    /// the edge carries agent/iteration/statistics metadata.
    ///
    /// # Errors
    /// Returns [`ModelError::MissingField`] if either endpoint id is empty,
    /// or [`ModelError::InvalidConfidence`] if `confidence` is out of range.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        rel_type: RelationshipType,
        created_by: impl Into<String>,
        confidence: f64,
    ) -> Result<Self> {
        let source_id = source_id.into();
        let target_id = target_id.into();
        if source_id.is_empty() {
            return Err(ModelError::MissingField("source_id"));
        }
        if target_id.is_empty() {
            return Err(ModelError::MissingField("target_id"));
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ModelError::InvalidConfidence(confidence));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            source_id,
            target_id,
            rel_type,
            properties: Value::Object(Map::new()),
            confidence,
            created_at: Utc::now(),
            created_by: created_by.into(),
        })
    }

    /// Serialize to a JSON document.
    ///
    /// # Errors
    /// Returns [`ModelError::Serialization`] if encoding fails.
    pub fn to_dict(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserialize from a JSON document produced by [`Relationship::to_dict`].
    ///
    /// # Errors
    /// Returns [`ModelError::Serialization`] if the document doesn't match the schema.
    pub fn from_dict(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_endpoints_rejected() {
        let err = Relationship::new("", "b", RelationshipType::Cites, "agent", 1.0).unwrap_err();
        assert!(matches!(err, ModelError::MissingField("source_id")));

        let err = Relationship::new("a", "", RelationshipType::Cites, "agent", 1.0).unwrap_err();
        assert!(matches!(err, ModelError::MissingField("target_id")));
    }

    #[test]
    fn round_trip() {
        let rel = Relationship::new("a", "b", RelationshipType::Supports, "DataAnalystAgent", 0.9).unwrap();
        let restored = Relationship::from_dict(rel.to_dict().unwrap()).unwrap();
        assert_eq!(rel, restored);
    }

    #[test]
    fn unknown_relationship_type_is_extension() {
        let rel = Relationship::new(
            "a",
            "b",
            RelationshipType::from_str_warn("ORBITS"),
            "agent",
            1.0,
        )
        .unwrap();
        assert_eq!(rel.rel_type, RelationshipType::Extension("ORBITS".into()));
    }
}
