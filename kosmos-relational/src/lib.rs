//! Authoritative relational record of the research session (spec §4.5).
//! The graph is a derived projection of these tables.

pub mod error;
pub mod models;
pub mod store;

pub use error::{RelationalError, Result};
pub use models::{HypothesisRow, HypothesisStatus, ProtocolRow, ResearchPlanRow, ResultRow, SupportsHypothesis};
pub use store::{ResearchSessionStore, Session};

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> ResearchSessionStore {
        ResearchSessionStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn plan_and_hypothesis_round_trip() {
        let store = store().await;
        let plan = store.create_plan("question-1", Some("proj-a")).await.unwrap();
        let hypothesis = store
            .add_hypothesis(&plan.id, None, "caffeine improves focus", "prior literature", 0, "HypothesisGeneratorAgent")
            .await
            .unwrap();

        let fetched = store.get_hypothesis(&hypothesis.id).await.unwrap().unwrap();
        assert_eq!(fetched.statement, "caffeine improves focus");
        assert_eq!(fetched.research_plan_id, plan.id);
    }

    #[tokio::test]
    async fn protocol_requires_existing_hypothesis() {
        let store = store().await;
        let err = store.add_protocol("missing-hypothesis", "t", "[]", "agent").await.unwrap_err();
        assert!(matches!(err, RelationalError::EndpointNotFound(_)));
    }

    #[tokio::test]
    async fn hypothesis_rows_are_never_deleted_only_mutated() {
        let store = store().await;
        let plan = store.create_plan("question-1", None).await.unwrap();
        let hypothesis = store.add_hypothesis(&plan.id, None, "x", "y", 0, "agent").await.unwrap();
        store.update_hypothesis_status(&hypothesis.id, "supported", 0.9).await.unwrap();

        let fetched = store.get_hypothesis(&hypothesis.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, "supported");
        assert!((fetched.confidence_score - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn convergence_latch_is_one_way() {
        let store = store().await;
        let plan = store.create_plan("question-1", None).await.unwrap();
        store.mark_converged(&plan.id, "max iterations reached").await.unwrap();
        store.mark_converged(&plan.id, "overwritten reason").await.unwrap();

        let fetched = store.get_plan(&plan.id).await.unwrap().unwrap();
        assert!(fetched.converged);
        assert_eq!(fetched.convergence_reason.as_deref(), Some("max iterations reached"));
    }

    #[tokio::test]
    async fn iteration_count_is_monotonic() {
        let store = store().await;
        let plan = store.create_plan("question-1", None).await.unwrap();
        let first = store.advance_iteration(&plan.id).await.unwrap();
        let second = store.advance_iteration(&plan.id).await.unwrap();
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }
}
