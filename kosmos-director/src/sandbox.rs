//! The sandbox executor contract (spec §4.8): the director treats execution
//! as a black box and never reconstructs traces, only stores the result record.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxProtocol {
    pub language: String,
    pub code: String,
    pub dependencies: Vec<String>,
    pub inputs: Map<String, Value>,
    pub resource_requirements: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxStatus {
    Success,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxResult {
    pub status: SandboxStatus,
    pub metrics: Value,
    pub figures: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    /// Tri-state: `None` until the analyst renders a verdict downstream.
    pub supports_hypothesis: Option<bool>,
    pub p_value: Option<f64>,
    pub effect_size: Option<f64>,
}

impl SandboxResult {
    #[must_use]
    pub fn timed_out() -> Self {
        Self {
            status: SandboxStatus::TimedOut,
            metrics: Value::Object(Map::new()),
            figures: Vec::new(),
            stdout: String::new(),
            stderr: String::new(),
            supports_hypothesis: None,
            p_value: None,
            effect_size: None,
        }
    }
}

/// Out-of-process executor contract. Isolation guarantees (no network
/// egress, read-only filesystem except a scratch directory, resource caps,
/// schema-validated results) are the executor's responsibility, not the
/// director's.
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    async fn execute(&self, protocol: &SandboxProtocol) -> SandboxResult;
}
