//! The research director: owns the loop, the shared plan, and the
//! dual-write discipline between the authoritative relational store and its
//! derived graph mirror (spec §4.7).

use std::sync::Arc;
use std::time::Duration;

use kosmos_core::{from_hypothesis, from_protocol, from_research_question, from_result, with_provenance, Annotation, Entity, RelationshipType};
use kosmos_relational::{HypothesisRow, ProtocolRow, ResearchPlanRow, ResearchSessionStore, ResultRow};
use kosmos_storage_traits::WorldModelStore;
use kosmos_world_model::WorldModel;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::convergence::{ConvergenceDecision, ConvergencePolicy};
use crate::error::{DirectorError, Result};
use crate::plan::SharedResearchPlan;
use crate::state::DirectorState;

pub struct ResearchDirector {
    relational: Arc<ResearchSessionStore>,
    world_model: Arc<WorldModel>,
    plan: Arc<SharedResearchPlan>,
    state: Mutex<DirectorState>,
    convergence: ConvergencePolicy,
    research_question_id: String,
}

impl ResearchDirector {
    /// Construct a director for `question`, creating exactly one
    /// `ResearchQuestion` entity and the backing plan row.
    ///
    /// # Errors
    /// Propagates relational write failures; graph mirror failure is logged
    /// and does not block construction.
    #[instrument(skip(relational, world_model))]
    pub async fn new(
        question: &str,
        relational: Arc<ResearchSessionStore>,
        world_model: Arc<WorldModel>,
        convergence: ConvergencePolicy,
    ) -> Result<Self> {
        let research_question_id = Uuid::new_v4().to_string();
        let plan_row = relational.create_plan(&research_question_id, None).await?;

        let director = Self {
            relational,
            world_model,
            plan: Arc::new(SharedResearchPlan::new(plan_row.id.clone(), research_question_id.clone())),
            state: Mutex::new(DirectorState::Init),
            convergence,
            research_question_id,
        };

        let summary = kosmos_core::ResearchQuestionSummary {
            id: director.research_question_id.clone(),
            text: question.to_string(),
        };
        let entity = from_research_question(&summary, "ResearchDirector")?;
        if let Err(error) = director.world_model.add_entity(entity).await {
            warn!(%error, "failed to mirror research question to graph, continuing");
        }

        Ok(director)
    }

    #[must_use]
    pub fn plan(&self) -> &Arc<SharedResearchPlan> {
        &self.plan
    }

    #[must_use]
    pub fn state(&self) -> DirectorState {
        *self.state.lock()
    }

    #[must_use]
    pub fn plan_row_id(&self) -> String {
        self.plan.snapshot().plan_id
    }

    #[must_use]
    pub fn research_question_id(&self) -> &str {
        &self.research_question_id
    }

    /// Validate and apply a state transition.
    ///
    /// # Errors
    /// Returns [`DirectorError::InvalidTransition`] if `to` may not follow
    /// the director's current state.
    pub fn transition(&self, to: DirectorState) -> Result<()> {
        let mut state = self.state.lock();
        to.validate_transition_from(*state)?;
        *state = to;
        Ok(())
    }

    /// Force the director into `Failed`, preserving whatever the relational
    /// store already committed (spec §7: partial writes are not rolled back).
    pub fn fail(&self) {
        *self.state.lock() = DirectorState::Failed;
    }

    async fn fetch_plan(&self) -> Result<ResearchPlanRow> {
        let plan_id = self.plan.snapshot().plan_id;
        self.relational
            .get_plan(&plan_id)
            .await?
            .ok_or_else(|| DirectorError::NotFound(plan_id))
    }

    /// Record a newly generated hypothesis: relational write (authoritative)
    /// followed by a best-effort `SPAWNED_BY` graph mirror.
    ///
    /// # Errors
    /// Propagates relational write failures.
    #[instrument(skip(self, statement, rationale))]
    pub async fn record_hypothesis_generated(
        &self,
        statement: &str,
        rationale: &str,
        generation: i64,
        agent: &str,
        iteration: i64,
    ) -> Result<HypothesisRow> {
        let plan_id = self.plan.snapshot().plan_id;
        let row = self.relational.add_hypothesis(&plan_id, None, statement, rationale, generation, agent).await?;
        self.plan.with_lock(|p| p.hypothesis_ids.push(row.id.clone()));

        let mut metadata = Map::new();
        metadata.insert("generation".to_string(), Value::from(generation));
        metadata.insert("iteration".to_string(), Value::from(iteration));
        self.mirror_hypothesis(&row, agent, RelationshipType::SpawnedBy, &self.research_question_id, metadata)
            .await;

        Ok(row)
    }

    /// Record a refinement of `parent_hypothesis_id`: a new hypothesis row
    /// one generation ahead, mirrored with a `REFINED_FROM` edge.
    ///
    /// # Errors
    /// Propagates relational write failures, including *not-found* if the
    /// parent hypothesis does not exist.
    #[instrument(skip(self, statement, rationale))]
    pub async fn record_hypothesis_refined(
        &self,
        parent_hypothesis_id: &str,
        statement: &str,
        rationale: &str,
        agent: &str,
    ) -> Result<HypothesisRow> {
        let parent = self
            .relational
            .get_hypothesis(parent_hypothesis_id)
            .await?
            .ok_or_else(|| DirectorError::NotFound(parent_hypothesis_id.to_string()))?;
        let plan_id = self.plan.snapshot().plan_id;
        let row = self
            .relational
            .add_hypothesis(&plan_id, Some(parent_hypothesis_id), statement, rationale, parent.generation + 1, agent)
            .await?;
        let refinement_count = self.relational.mark_refined(&row.id).await?;
        let row = self
            .relational
            .get_hypothesis(&row.id)
            .await?
            .ok_or_else(|| DirectorError::NotFound(row.id.clone()))?;
        self.plan.with_lock(|p| p.hypothesis_ids.push(row.id.clone()));

        let mut metadata = Map::new();
        metadata.insert("refinement_count".to_string(), Value::from(refinement_count));
        self.mirror_hypothesis(&row, agent, RelationshipType::RefinedFrom, parent_hypothesis_id, metadata).await;

        Ok(row)
    }

    async fn mirror_hypothesis(&self, row: &HypothesisRow, agent: &str, edge_type: RelationshipType, target_id: &str, metadata: Map<String, Value>) {
        let entity = match from_hypothesis(&row.to_summary(), agent) {
            Ok(entity) => entity,
            Err(error) => {
                warn!(%error, hypothesis_id = %row.id, "failed to build hypothesis entity for graph mirror");
                return;
            }
        };
        self.mirror_entity_and_edge(entity, row.id.clone(), target_id.to_string(), edge_type, agent, metadata).await;
    }

    /// Record a designed protocol: relational write followed by a
    /// best-effort `TESTS` graph mirror.
    ///
    /// # Errors
    /// Propagates relational write failures, including *not-found* if
    /// `hypothesis_id` does not exist.
    #[instrument(skip(self, title, steps))]
    pub async fn record_protocol_designed(&self, hypothesis_id: &str, title: &str, steps: &Value, agent: &str, iteration: i64) -> Result<ProtocolRow> {
        let steps_json = serde_json::to_string(steps).map_err(kosmos_core::ModelError::Serialization)?;
        let row = self.relational.add_protocol(hypothesis_id, title, &steps_json, agent).await?;
        self.plan.with_lock(|p| p.protocol_ids.push(row.id.clone()));

        let entity = match row.to_summary() {
            Ok(summary) => match from_protocol(&summary, agent) {
                Ok(entity) => entity,
                Err(error) => {
                    warn!(%error, protocol_id = %row.id, "failed to build protocol entity for graph mirror");
                    return Ok(row);
                }
            },
            Err(error) => {
                warn!(%error, protocol_id = %row.id, "failed to decode protocol steps for graph mirror");
                return Ok(row);
            }
        };
        let mut metadata = Map::new();
        metadata.insert("iteration".to_string(), Value::from(iteration));
        self.mirror_entity_and_edge(entity, row.id.clone(), hypothesis_id.to_string(), RelationshipType::Tests, agent, metadata)
            .await;

        Ok(row)
    }

    /// Record an experiment result: relational write followed by a
    /// best-effort `PRODUCED_BY` graph mirror.
    ///
    /// # Errors
    /// Propagates relational write failures, including *not-found* if
    /// `protocol_id` does not exist.
    #[instrument(skip(self, metrics, stdout, stderr))]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_result_produced(
        &self,
        protocol_id: &str,
        hypothesis_id: &str,
        status: &str,
        metrics: &Value,
        supports_hypothesis: Option<bool>,
        p_value: Option<f64>,
        effect_size: Option<f64>,
        stdout: &str,
        stderr: &str,
        agent: &str,
        iteration: i64,
    ) -> Result<ResultRow> {
        let metrics_json = serde_json::to_string(metrics).map_err(kosmos_core::ModelError::Serialization)?;
        let supports_str = match supports_hypothesis {
            Some(true) => "supports",
            Some(false) => "refutes",
            None => "unknown",
        };
        let row = self
            .relational
            .add_result(protocol_id, hypothesis_id, status, &metrics_json, supports_str, p_value, effect_size, stdout, stderr, agent)
            .await?;
        self.plan.with_lock(|p| p.result_ids.push(row.id.clone()));

        let entity = match row.to_summary() {
            Ok(summary) => match from_result(&summary, agent) {
                Ok(entity) => entity,
                Err(error) => {
                    warn!(%error, result_id = %row.id, "failed to build result entity for graph mirror");
                    return Ok(row);
                }
            },
            Err(error) => {
                warn!(%error, result_id = %row.id, "failed to decode result metrics for graph mirror");
                return Ok(row);
            }
        };
        let mut metadata = Map::new();
        metadata.insert("iteration".to_string(), Value::from(iteration));
        self.mirror_entity_and_edge(entity, row.id.clone(), protocol_id.to_string(), RelationshipType::ProducedBy, agent, metadata)
            .await;

        Ok(row)
    }

    /// Record the analyst's verdict: a `SUPPORTS`/`REFUTES` edge from result
    /// to hypothesis carrying `p_value`/`effect_size`, and a relational
    /// status update on the hypothesis row.
    ///
    /// # Errors
    /// Propagates relational write failures.
    #[instrument(skip(self))]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_analyst_verdict(
        &self,
        result_id: &str,
        hypothesis_id: &str,
        hypothesis_supported: Option<bool>,
        confidence: f64,
        p_value: Option<f64>,
        effect_size: Option<f64>,
        agent: &str,
        iteration: i64,
    ) -> Result<()> {
        let Some(supported) = hypothesis_supported else {
            // Tri-state unknown: nothing to record until the analyst commits to a verdict.
            return Ok(());
        };
        let status = if supported { "supported" } else { "refuted" };
        self.relational.update_hypothesis_status(hypothesis_id, status, confidence).await?;

        let edge_type = if supported { RelationshipType::Supports } else { RelationshipType::Refutes };
        let mut metadata = Map::new();
        metadata.insert("iteration".to_string(), Value::from(iteration));
        if let Some(p) = p_value {
            metadata.insert("p_value".to_string(), Value::from(p));
        }
        if let Some(effect) = effect_size {
            metadata.insert("effect_size".to_string(), Value::from(effect));
        }

        match with_provenance(result_id, hypothesis_id, edge_type, agent, confidence, metadata) {
            Ok(edge) => {
                if let Err(error) = self.world_model.add_relationship(edge).await {
                    warn!(%error, result_id, hypothesis_id, "failed to mirror analyst verdict edge, continuing");
                }
            }
            Err(error) => warn!(%error, "failed to build analyst verdict edge"),
        }
        Ok(())
    }

    async fn mirror_entity_and_edge(&self, entity: Entity, source_id: String, target_id: String, edge_type: RelationshipType, agent: &str, metadata: Map<String, Value>) {
        if let Err(error) = self.world_model.add_entity(entity).await {
            warn!(%error, entity_id = %source_id, "failed to mirror entity to graph, continuing");
            return;
        }
        match with_provenance(source_id.clone(), target_id.clone(), edge_type, agent, 1.0, metadata) {
            Ok(edge) => {
                if let Err(error) = self.world_model.add_relationship(edge).await {
                    warn!(%error, %source_id, %target_id, "failed to mirror edge to graph, continuing");
                }
            }
            Err(error) => warn!(%error, "failed to build provenance edge"),
        }
    }

    /// Evaluate the convergence policy against this iteration's verdicts,
    /// applying the one-way `converged` latch and annotating the research
    /// question with the reason (spec §4.7 edge table, last row).
    ///
    /// # Errors
    /// Propagates relational read failures.
    #[instrument(skip(self))]
    pub async fn evaluate_convergence(&self, supported: usize, analyzed: usize, elapsed: Duration) -> Result<ConvergenceDecision> {
        let iteration_count = self.fetch_plan().await?.iteration_count;
        let decision = self.convergence.evaluate(iteration_count, supported, analyzed, elapsed);
        if decision.should_converge {
            let reason = decision.reason.clone().unwrap_or_default();
            self.plan.set_converged(reason.clone());
            self.relational.mark_converged(&self.plan.snapshot().plan_id, &reason).await?;

            match Annotation::new(reason, "ResearchDirector") {
                Ok(annotation) => {
                    if let Err(error) = self.world_model.add_annotation(&self.research_question_id, annotation).await {
                        warn!(%error, "failed to annotate research question with convergence reason");
                    }
                }
                Err(error) => warn!(%error, "failed to build convergence annotation"),
            }
        }
        Ok(decision)
    }

    /// Advance the plan's iteration counter; called once per outer-loop cycle.
    ///
    /// # Errors
    /// Propagates relational write failures.
    pub async fn advance_iteration(&self) -> Result<i64> {
        let plan_id = self.plan.snapshot().plan_id;
        let count = self.relational.advance_iteration(&plan_id).await?;
        self.plan.with_lock(|p| p.iteration_count = count);
        Ok(count)
    }
}
