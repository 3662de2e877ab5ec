//! Process-wide singleton factory (spec §4.4), grounded on
//! `llmspell-state-persistence::factory::StateFactory::create_from_config`.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::warn;

use crate::config::{WorldModelConfig, WorldModelMode};
use crate::degraded::DegradedStore;
use crate::facade::WorldModel;

static SINGLETON: OnceLock<RwLock<Option<Arc<WorldModel>>>> = OnceLock::new();

fn slot() -> &'static RwLock<Option<Arc<WorldModel>>> {
    SINGLETON.get_or_init(|| RwLock::new(None))
}

/// Return the process-wide world model, constructing it on first call.
///
/// `mode` overrides [`WorldModelConfig::mode`] for this call only; `reset`
/// forces the previous instance to be closed and rebuilt. Construction
/// failure is never fatal: callers receive a [`WorldModel`] backed by
/// [`DegradedStore`] whose mutations are no-ops and whose reads are empty.
pub async fn get_world_model(config: WorldModelConfig, mode: Option<WorldModelMode>, reset: bool) -> Arc<WorldModel> {
    if reset {
        *slot().write() = None;
    }
    if let Some(existing) = slot().read().clone() {
        return existing;
    }

    let mut config = config;
    if let Some(mode) = mode {
        config.mode = mode;
    }

    let world_model = Arc::new(build(config).await);
    *slot().write() = Some(world_model.clone());
    world_model
}

async fn build(config: WorldModelConfig) -> WorldModel {
    if !config.enabled {
        return WorldModel::new_degraded(Arc::new(DegradedStore), config);
    }
    match kosmos_graph::SurrealGraphBackend::new(&config.graph_uri).await {
        Ok(backend) => WorldModel::new(Arc::new(backend), config),
        Err(error) => {
            warn!(%error, "world model construction failed, falling back to degraded store");
            WorldModel::new_degraded(Arc::new(DegradedStore), config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kosmos_storage_traits::WorldModelStore;

    #[tokio::test]
    async fn disabled_config_yields_degraded_store() {
        let config = WorldModelConfig {
            enabled: false,
            ..WorldModelConfig::default()
        };
        let world_model = build(config).await;
        let entity = kosmos_core::Entity::new(kosmos_core::EntityType::Concept, serde_json::json!({}), "agent").unwrap();
        let id = world_model.add_entity(entity.clone()).await.unwrap();
        assert_eq!(id, entity.id);
        assert!(world_model.get_entity(&entity.id).await.unwrap().is_none());
        assert_eq!(world_model.health(), crate::facade::WorldModelHealth::Disabled);
    }

    #[tokio::test]
    async fn unusable_path_reports_degraded_health() {
        let config = WorldModelConfig {
            enabled: true,
            graph_uri: "/dev/null/not-a-real-path".to_string(),
            ..WorldModelConfig::default()
        };
        let world_model = build(config).await;
        assert_eq!(world_model.health(), crate::facade::WorldModelHealth::Degraded);
    }

    #[tokio::test]
    async fn unreachable_backend_degrades_gracefully() {
        let config = WorldModelConfig {
            enabled: true,
            graph_uri: "/dev/null/not-a-real-path".to_string(),
            ..WorldModelConfig::default()
        };
        // Construction over an unusable path must not panic or propagate;
        // the factory always yields a usable (possibly degraded) handle.
        let _world_model = build(config).await;
    }
}
