//! Specialist role payload types carried as [`kosmos_bus::AgentMessage::content`]
//! (spec §4.6, §4.7). The director only ever sees these typed shapes; it
//! never inspects a specialist's internal reasoning.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const HYPOTHESIS_GENERATOR: &str = "HypothesisGeneratorAgent";
pub const EXPERIMENT_DESIGNER: &str = "ExperimentDesignerAgent";
pub const DATA_ANALYST: &str = "DataAnalystAgent";
pub const HYPOTHESIS_REFINER: &str = "HypothesisRefinerAgent";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisProposed {
    pub statement: String,
    pub rationale: String,
    pub generation: i64,
    pub parent_hypothesis_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolDesigned {
    pub hypothesis_id: String,
    pub title: String,
    pub steps: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultReady {
    pub protocol_id: String,
    pub hypothesis_id: String,
    pub status: String,
    pub metrics: Value,
    pub supports_hypothesis: Option<bool>,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalystVerdict {
    pub result_id: String,
    pub hypothesis_id: String,
    pub hypothesis_supported: Option<bool>,
    pub confidence: f64,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisRefined {
    pub parent_hypothesis_id: String,
    pub statement: String,
    pub rationale: String,
}
