//! Typed configuration for the world-model singleton (spec §4.4).

use serde::{Deserialize, Serialize};

/// `simple` runs a single graph backend; `production` (polyglot, multiple
/// backends behind one facade) is declared but not required by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldModelMode {
    Simple,
    Production,
}

impl Default for WorldModelMode {
    fn default() -> Self {
        Self::Simple
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldModelConfig {
    /// When `false`, every mutating call is a no-op and every read is empty.
    pub enabled: bool,
    pub mode: WorldModelMode,
    pub project: Option<String>,
    /// Directory backing the embedded graph engine.
    pub graph_uri: String,
    pub graph_auth: Option<String>,
    pub graph_database: String,
    /// Minimum cosine similarity for future semantic-dedup lookups; carried
    /// through configuration even though no backend implements it yet.
    pub similarity_threshold: f64,
}

impl Default for WorldModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: WorldModelMode::Simple,
            project: None,
            graph_uri: "./kosmos-data/graph".to_string(),
            graph_auth: None,
            graph_database: "world_model".to_string(),
            similarity_threshold: 0.85,
        }
    }
}
