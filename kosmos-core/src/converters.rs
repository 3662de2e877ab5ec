//! Named converters from relational summaries to graph entities, and the
//! provenance-edge factory (spec §4.1).
//!
//! These are pure functions over small summary structs rather than over the
//! relational row types directly, so `kosmos-core` has no dependency on
//! `kosmos-relational` — the relational adapter builds a summary and hands
//! it to the converter.

use serde_json::{json, Map, Value};

use crate::entity::{Entity, EntityType};
use crate::error::Result;
use crate::relationship::{Relationship, RelationshipType};

/// Summary fields extracted from a `hypotheses` row (spec §4.5 table).
#[derive(Debug, Clone)]
pub struct HypothesisSummary {
    pub id: String,
    pub statement: String,
    pub rationale: Option<String>,
    pub status: String,
    pub confidence_score: Option<f64>,
    pub generation: i64,
    pub parent_hypothesis_id: Option<String>,
}

/// Summary fields extracted from an `experiment_protocols` row.
#[derive(Debug, Clone)]
pub struct ProtocolSummary {
    pub id: String,
    pub hypothesis_id: String,
    pub title: String,
    pub steps: Value,
    pub status: String,
}

/// Summary fields extracted from an `experiment_results` row.
#[derive(Debug, Clone)]
pub struct ResultSummary {
    pub id: String,
    pub protocol_id: String,
    pub status: String,
    pub metrics: Value,
    pub supports_hypothesis: Option<bool>,
}

/// Summary fields for the singleton `ResearchQuestion`.
#[derive(Debug, Clone)]
pub struct ResearchQuestionSummary {
    pub id: String,
    pub text: String,
}

/// Build a `Hypothesis` entity from a relational summary.
///
/// # Errors
/// Propagates [`crate::error::ModelError`] if the resulting entity fails validation.
pub fn from_hypothesis(summary: &HypothesisSummary, agent: &str) -> Result<Entity> {
    let properties = json!({
        "statement": summary.statement,
        "rationale": summary.rationale,
        "status": summary.status,
        "generation": summary.generation,
        "parent_hypothesis_id": summary.parent_hypothesis_id,
    });
    let confidence = summary.confidence_score.unwrap_or(1.0).clamp(0.0, 1.0);
    let entity = Entity::with_confidence(EntityType::Hypothesis, properties, agent, confidence)?
        .with_id(summary.id.clone());
    Ok(entity)
}

/// Build an `ExperimentProtocol` entity from a relational summary.
///
/// # Errors
/// Propagates [`crate::error::ModelError`] if the resulting entity fails validation.
pub fn from_protocol(summary: &ProtocolSummary, agent: &str) -> Result<Entity> {
    let properties = json!({
        "title": summary.title,
        "status": summary.status,
        "steps": summary.steps,
        "hypothesis_id": summary.hypothesis_id,
    });
    Ok(Entity::new(EntityType::ExperimentProtocol, properties, agent)?.with_id(summary.id.clone()))
}

/// Build an `ExperimentResult` entity from a relational summary.
///
/// # Errors
/// Propagates [`crate::error::ModelError`] if the resulting entity fails validation.
pub fn from_result(summary: &ResultSummary, agent: &str) -> Result<Entity> {
    let properties = json!({
        "status": summary.status,
        "metrics": summary.metrics,
        "supports_hypothesis": summary.supports_hypothesis,
        "protocol_id": summary.protocol_id,
    });
    Ok(Entity::new(EntityType::ExperimentResult, properties, agent)?.with_id(summary.id.clone()))
}

/// Build the singleton `ResearchQuestion` entity from a relational summary.
///
/// # Errors
/// Propagates [`crate::error::ModelError`] if the resulting entity fails validation.
pub fn from_research_question(summary: &ResearchQuestionSummary, agent: &str) -> Result<Entity> {
    let properties = json!({ "text": summary.text });
    Ok(Entity::new(EntityType::ResearchQuestion, properties, agent)?.with_id(summary.id.clone()))
}

/// Build a provenance-bearing edge, stamping `timestamp = now()` and folding
/// arbitrary key/value metadata into `properties` (spec §4.1).
///
/// # Errors
/// Propagates [`crate::error::ModelError`] if either endpoint id is empty or
/// `confidence` is out of range.
pub fn with_provenance(
    source_id: impl Into<String>,
    target_id: impl Into<String>,
    rel_type: RelationshipType,
    agent: impl Into<String>,
    confidence: f64,
    metadata: Map<String, Value>,
) -> Result<Relationship> {
    let agent = agent.into();
    let mut relationship = Relationship::new(source_id, target_id, rel_type, agent.clone(), confidence)?;

    let mut properties = Map::new();
    properties.insert("agent".to_string(), Value::String(agent));
    properties.insert(
        "timestamp".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    for (key, value) in metadata {
        properties.insert(key, value);
    }
    relationship.properties = Value::Object(properties);
    Ok(relationship)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hypothesis_converter_preserves_primary_key_as_id() {
        let summary = HypothesisSummary {
            id: "hyp-1".into(),
            statement: "caffeine improves focus".into(),
            rationale: None,
            status: "pending".into(),
            confidence_score: Some(0.8),
            generation: 1,
            parent_hypothesis_id: None,
        };
        let entity = from_hypothesis(&summary, "HypothesisGeneratorAgent").unwrap();
        assert_eq!(entity.id, "hyp-1");
        assert_eq!(entity.created_by, "HypothesisGeneratorAgent");
        assert_eq!(entity.properties["statement"], "caffeine improves focus");
    }

    #[test]
    fn with_provenance_stamps_agent_and_timestamp() {
        let mut metadata = Map::new();
        metadata.insert("generation".to_string(), json!(1));
        metadata.insert("iteration".to_string(), json!(0));

        let edge = with_provenance(
            "hyp-1",
            "question-1",
            RelationshipType::SpawnedBy,
            "HypothesisGeneratorAgent",
            1.0,
            metadata,
        )
        .unwrap();

        assert_eq!(edge.properties["agent"], "HypothesisGeneratorAgent");
        assert_eq!(edge.properties["generation"], 1);
        assert_eq!(edge.properties["iteration"], 0);
        assert!(edge.properties.get("timestamp").is_some());
    }
}
