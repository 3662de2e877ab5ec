//! Row types for the four tables backing the research session (spec §4.5).

use chrono::{DateTime, Utc};
use kosmos_core::{HypothesisSummary, ProtocolSummary, ResearchQuestionSummary, ResultSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResearchPlanRow {
    pub id: String,
    pub research_question_id: String,
    pub project: Option<String>,
    pub iteration_count: i64,
    pub converged: bool,
    pub convergence_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status of a hypothesis as it moves through the research loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStatus {
    Proposed,
    UnderTest,
    Supported,
    Refuted,
    Refined,
}

impl HypothesisStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::UnderTest => "under_test",
            Self::Supported => "supported",
            Self::Refuted => "refuted",
            Self::Refined => "refined",
        }
    }
}

impl std::str::FromStr for HypothesisStatus {
    type Err = crate::error::RelationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposed" => Ok(Self::Proposed),
            "under_test" => Ok(Self::UnderTest),
            "supported" => Ok(Self::Supported),
            "refuted" => Ok(Self::Refuted),
            "refined" => Ok(Self::Refined),
            other => Err(crate::error::RelationalError::NotFound(format!("unknown hypothesis status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HypothesisRow {
    pub id: String,
    pub research_plan_id: String,
    pub parent_hypothesis_id: Option<String>,
    pub statement: String,
    pub rationale: String,
    pub status: String,
    pub confidence_score: f64,
    pub generation: i64,
    pub refinement_count: i64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HypothesisRow {
    #[must_use]
    pub fn to_summary(&self) -> HypothesisSummary {
        HypothesisSummary {
            id: self.id.clone(),
            statement: self.statement.clone(),
            rationale: Some(self.rationale.clone()),
            status: self.status.clone(),
            confidence_score: Some(self.confidence_score),
            generation: self.generation,
            parent_hypothesis_id: self.parent_hypothesis_id.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProtocolRow {
    pub id: String,
    pub hypothesis_id: String,
    pub title: String,
    pub steps: String,
    pub status: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProtocolRow {
    /// # Errors
    /// Returns an error if `steps` is not valid JSON.
    pub fn to_summary(&self) -> crate::error::Result<ProtocolSummary> {
        let steps: Value = serde_json::from_str(&self.steps)?;
        Ok(ProtocolSummary {
            id: self.id.clone(),
            hypothesis_id: self.hypothesis_id.clone(),
            title: self.title.clone(),
            steps,
            status: self.status.clone(),
        })
    }
}

/// Tri-state verdict: unknown until the analyst renders a decision (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportsHypothesis {
    Unknown,
    Supports,
    Refutes,
}

impl SupportsHypothesis {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Supports => "supports",
            Self::Refutes => "refutes",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ResultRow {
    pub id: String,
    pub protocol_id: String,
    pub hypothesis_id: String,
    pub status: String,
    pub metrics: String,
    pub supports_hypothesis: String,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub stdout: String,
    pub stderr: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResultRow {
    /// # Errors
    /// Returns an error if `metrics` is not valid JSON.
    pub fn to_summary(&self) -> crate::error::Result<ResultSummary> {
        let metrics: Value = serde_json::from_str(&self.metrics)?;
        let supports_hypothesis = match self.supports_hypothesis.as_str() {
            "supports" => Some(true),
            "refutes" => Some(false),
            _ => None,
        };
        Ok(ResultSummary {
            id: self.id.clone(),
            protocol_id: self.protocol_id.clone(),
            status: self.status.clone(),
            metrics,
            supports_hypothesis,
        })
    }
}

/// Builds the singleton research-question summary from the plan's text,
/// kept outside a dedicated table since the question is immutable per plan.
#[must_use]
pub fn research_question_summary(plan: &ResearchPlanRow, text: &str) -> ResearchQuestionSummary {
    ResearchQuestionSummary {
        id: plan.research_question_id.clone(),
        text: text.to_string(),
    }
}
