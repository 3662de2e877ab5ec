//! The research director: the iterative-loop orchestrator that drives
//! hypothesis generation, experiment design, sandboxed execution, and
//! analysis to convergence (spec §4.7), dual-writing every relational
//! change into the derived graph mirror with provenance.

pub mod agents;
pub mod convergence;
pub mod director;
pub mod error;
pub mod plan;
pub mod sandbox;
pub mod state;

pub use convergence::{ConvergenceDecision, ConvergencePolicy};
pub use director::ResearchDirector;
pub use error::{DirectorError, Result};
pub use plan::{PlanState, SharedResearchPlan};
pub use sandbox::{SandboxExecutor, SandboxProtocol, SandboxResult, SandboxStatus};
pub use state::DirectorState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use kosmos_graph::SurrealGraphBackend;
    use kosmos_relational::ResearchSessionStore;
    use kosmos_storage_traits::WorldModelStore;
    use kosmos_world_model::{WorldModel, WorldModelConfig};
    use serde_json::json;

    use super::*;

    async fn new_director(question: &str) -> (ResearchDirector, tempfile::TempDir) {
        let (backend, dir) = SurrealGraphBackend::new_temp().await.unwrap();
        let world_model = Arc::new(WorldModel::new(Arc::new(backend), WorldModelConfig::default()));
        let relational = Arc::new(ResearchSessionStore::connect("sqlite::memory:").await.unwrap());
        let director = ResearchDirector::new(question, relational, world_model, ConvergencePolicy::default())
            .await
            .unwrap();
        (director, dir)
    }

    #[tokio::test]
    async fn hypothesis_generation_mirrors_spawned_by_edge() {
        let (director, _dir) = new_director("does caffeine improve focus?").await;
        director.transition(DirectorState::GeneratingHypotheses).unwrap();

        let hypothesis = director
            .record_hypothesis_generated("caffeine improves sustained attention", "prior literature suggests dose-response", 1, agents::HYPOTHESIS_GENERATOR, 0)
            .await
            .unwrap();

        assert_eq!(hypothesis.generation, 1);
        assert_eq!(hypothesis.parent_hypothesis_id, None);
        assert_eq!(director.plan().snapshot().hypothesis_ids, vec![hypothesis.id.clone()]);
    }

    #[tokio::test]
    async fn hypothesis_refinement_chain_advances_generation_and_count() {
        let (director, _dir) = new_director("does caffeine improve focus?").await;
        director.transition(DirectorState::GeneratingHypotheses).unwrap();

        let parent = director
            .record_hypothesis_generated("caffeine improves focus", "baseline rationale", 1, agents::HYPOTHESIS_GENERATOR, 0)
            .await
            .unwrap();

        let child = director
            .record_hypothesis_refined(&parent.id, "caffeine improves focus only below 400mg/day", "dose-capped refinement", agents::HYPOTHESIS_REFINER)
            .await
            .unwrap();

        assert_eq!(child.generation, parent.generation + 1);
        assert_eq!(child.parent_hypothesis_id.as_deref(), Some(parent.id.as_str()));
        assert_eq!(child.refinement_count, 1);
    }

    #[tokio::test]
    async fn full_cycle_records_protocol_result_and_supports_verdict() {
        let (director, _dir) = new_director("does caffeine improve focus?").await;
        director.transition(DirectorState::GeneratingHypotheses).unwrap();

        let hypothesis = director
            .record_hypothesis_generated("caffeine improves focus", "baseline rationale", 1, agents::HYPOTHESIS_GENERATOR, 0)
            .await
            .unwrap();

        director.transition(DirectorState::DesigningExperiments).unwrap();
        let protocol = director
            .record_protocol_designed(&hypothesis.id, "double-blind focus trial", &json!(["recruit", "dose", "measure"]), agents::EXPERIMENT_DESIGNER, 0)
            .await
            .unwrap();

        director.transition(DirectorState::ExecutingExperiments).unwrap();
        let result = director
            .record_result_produced(
                &protocol.id,
                &hypothesis.id,
                "completed",
                &json!({"mean_diff": 0.4}),
                Some(true),
                Some(0.01),
                Some(0.4),
                "",
                "",
                agents::DATA_ANALYST,
                0,
            )
            .await
            .unwrap();

        director.transition(DirectorState::AnalyzingResults).unwrap();
        director
            .record_analyst_verdict(&result.id, &hypothesis.id, Some(true), 0.9, Some(0.01), Some(0.4), agents::DATA_ANALYST, 0)
            .await
            .unwrap();

        let stored = director.plan().snapshot();
        assert_eq!(stored.protocol_ids, vec![protocol.id.clone()]);
        assert_eq!(stored.result_ids, vec![result.id.clone()]);
    }

    #[tokio::test]
    async fn budget_exhaustion_converges_via_evaluate_convergence() {
        let policy = ConvergencePolicy {
            per_iteration_budget: Duration::from_millis(1),
            ..ConvergencePolicy::default()
        };
        let (backend, _dir) = SurrealGraphBackend::new_temp().await.unwrap();
        let world_model = Arc::new(WorldModel::new(Arc::new(backend), WorldModelConfig::default()));
        let relational = Arc::new(ResearchSessionStore::connect("sqlite::memory:").await.unwrap());
        let director = ResearchDirector::new("converges under budget pressure", relational, world_model, policy).await.unwrap();

        let decision = director.evaluate_convergence(0, 0, Duration::from_secs(1)).await.unwrap();
        assert!(decision.should_converge);
        assert_eq!(decision.reason.as_deref(), Some("budget_exhausted"));
        assert!(director.plan().has_converged());
    }

    #[tokio::test]
    async fn invalid_transition_is_rejected() {
        let (director, _dir) = new_director("invalid transition probe").await;
        let err = director.transition(DirectorState::ExecutingExperiments).unwrap_err();
        assert!(matches!(err, DirectorError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn director_still_progresses_when_graph_mirror_is_degraded() {
        let relational = Arc::new(ResearchSessionStore::connect("sqlite::memory:").await.unwrap());
        let degraded_store: Arc<dyn WorldModelStore> = Arc::new(kosmos_world_model::DegradedStore::default());
        let world_model = Arc::new(WorldModel::new(degraded_store, WorldModelConfig { enabled: false, ..WorldModelConfig::default() }));
        let director = ResearchDirector::new("graceful degradation probe", relational, world_model, ConvergencePolicy::default())
            .await
            .unwrap();

        director.transition(DirectorState::GeneratingHypotheses).unwrap();
        let hypothesis = director
            .record_hypothesis_generated("degraded-mode hypothesis", "rationale", 1, agents::HYPOTHESIS_GENERATOR, 0)
            .await
            .unwrap();

        assert_eq!(director.plan().snapshot().hypothesis_ids, vec![hypothesis.id]);
    }
}
