//! The authoritative sqlx-backed adapter (spec §4.5), grounded on
//! `bpmn-lite-core::store_postgres::PostgresProcessStore`'s query/bind/execute
//! style and upsert idiom.

use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{RelationalError, Result};
use crate::models::{HypothesisRow, ProtocolRow, ResearchPlanRow, ResultRow};

/// A released connection handle; `getSession()` in the distilled spec is
/// modeled here as pool acquisition, with release guaranteed by `Drop` on
/// every exit path (matching sqlx's own pooled-connection contract).
pub type Session = sqlx::pool::PoolConnection<sqlx::Sqlite>;

#[derive(Clone)]
pub struct ResearchSessionStore {
    pool: SqlitePool,
}

impl ResearchSessionStore {
    /// Open (or create) a SQLite database at `url` (e.g. `sqlite://path/to/db.sqlite`
    /// or `sqlite::memory:`) and run pending migrations.
    ///
    /// # Errors
    /// Returns [`RelationalError::Database`] if the connection fails, or
    /// [`RelationalError::Migration`] if schema migration fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new().max_connections(8).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// A scoped session with guaranteed release on all exit paths (spec §4.5).
    ///
    /// # Errors
    /// Returns [`RelationalError::Database`] if the pool is exhausted or closed.
    pub async fn get_session(&self) -> Result<Session> {
        Ok(self.pool.acquire().await?)
    }

    #[instrument(skip(self))]
    pub async fn create_plan(&self, research_question_id: &str, project: Option<&str>) -> Result<ResearchPlanRow> {
        let now = Utc::now();
        let row = ResearchPlanRow {
            id: Uuid::new_v4().to_string(),
            research_question_id: research_question_id.to_string(),
            project: project.map(ToString::to_string),
            iteration_count: 0,
            converged: false,
            convergence_reason: None,
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO research_plan (id, research_question_id, project, iteration_count, converged, convergence_reason, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.research_question_id)
        .bind(&row.project)
        .bind(row.iteration_count)
        .bind(row.converged)
        .bind(&row.convergence_reason)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_plan(&self, id: &str) -> Result<Option<ResearchPlanRow>> {
        let row = sqlx::query_as::<_, ResearchPlanRow>("SELECT * FROM research_plan WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Advance the plan's iteration counter by one. Monotonic: never moves backwards.
    #[instrument(skip(self))]
    pub async fn advance_iteration(&self, plan_id: &str) -> Result<i64> {
        let updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE research_plan SET iteration_count = iteration_count + 1, updated_at = ? WHERE id = ?",
        )
        .bind(updated_at)
        .bind(plan_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RelationalError::NotFound(plan_id.to_string()));
        }
        let plan = self
            .get_plan(plan_id)
            .await?
            .ok_or_else(|| RelationalError::NotFound(plan_id.to_string()))?;
        Ok(plan.iteration_count)
    }

    /// Set the plan's convergence flag atomically; a one-way latch — calling
    /// this on an already-converged plan is a no-op, not an error.
    #[instrument(skip(self))]
    pub async fn mark_converged(&self, plan_id: &str, reason: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE research_plan SET converged = 1, convergence_reason = ?, updated_at = ?
             WHERE id = ? AND converged = 0",
        )
        .bind(reason)
        .bind(Utc::now())
        .bind(plan_id)
        .execute(&self.pool)
        .await?;
        let _ = result.rows_affected();
        Ok(())
    }

    #[instrument(skip(self, statement, rationale))]
    pub async fn add_hypothesis(
        &self,
        research_plan_id: &str,
        parent_hypothesis_id: Option<&str>,
        statement: &str,
        rationale: &str,
        generation: i64,
        created_by: &str,
    ) -> Result<HypothesisRow> {
        let now = Utc::now();
        let row = HypothesisRow {
            id: Uuid::new_v4().to_string(),
            research_plan_id: research_plan_id.to_string(),
            parent_hypothesis_id: parent_hypothesis_id.map(ToString::to_string),
            statement: statement.to_string(),
            rationale: rationale.to_string(),
            status: "proposed".to_string(),
            confidence_score: 0.0,
            generation,
            refinement_count: 0,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO hypotheses
                (id, research_plan_id, parent_hypothesis_id, statement, rationale, status,
                 confidence_score, generation, refinement_count, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.research_plan_id)
        .bind(&row.parent_hypothesis_id)
        .bind(&row.statement)
        .bind(&row.rationale)
        .bind(&row.status)
        .bind(row.confidence_score)
        .bind(row.generation)
        .bind(row.refinement_count)
        .bind(&row.created_by)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_hypothesis(&self, id: &str) -> Result<Option<HypothesisRow>> {
        let row = sqlx::query_as::<_, HypothesisRow>("SELECT * FROM hypotheses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Mutate status/confidence in place; rows are never deleted (spec §4.5 invariant).
    #[instrument(skip(self))]
    pub async fn update_hypothesis_status(&self, id: &str, status: &str, confidence_score: f64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE hypotheses SET status = ?, confidence_score = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status)
        .bind(confidence_score)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RelationalError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn mark_refined(&self, id: &str) -> Result<i64> {
        sqlx::query("UPDATE hypotheses SET refinement_count = refinement_count + 1, status = 'refined', updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        let row = self
            .get_hypothesis(id)
            .await?
            .ok_or_else(|| RelationalError::NotFound(id.to_string()))?;
        Ok(row.refinement_count)
    }

    #[instrument(skip(self, title, steps))]
    pub async fn add_protocol(&self, hypothesis_id: &str, title: &str, steps: &str, created_by: &str) -> Result<ProtocolRow> {
        if self.get_hypothesis(hypothesis_id).await?.is_none() {
            return Err(RelationalError::EndpointNotFound(hypothesis_id.to_string()));
        }
        let now = Utc::now();
        let row = ProtocolRow {
            id: Uuid::new_v4().to_string(),
            hypothesis_id: hypothesis_id.to_string(),
            title: title.to_string(),
            steps: steps.to_string(),
            status: "designed".to_string(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO experiment_protocols (id, hypothesis_id, title, steps, status, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.hypothesis_id)
        .bind(&row.title)
        .bind(&row.steps)
        .bind(&row.status)
        .bind(&row.created_by)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_experiment(&self, id: &str) -> Result<Option<ProtocolRow>> {
        let row = sqlx::query_as::<_, ProtocolRow>("SELECT * FROM experiment_protocols WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    #[instrument(skip(self, metrics, stdout, stderr))]
    #[allow(clippy::too_many_arguments)]
    pub async fn add_result(
        &self,
        protocol_id: &str,
        hypothesis_id: &str,
        status: &str,
        metrics: &str,
        supports_hypothesis: &str,
        p_value: Option<f64>,
        effect_size: Option<f64>,
        stdout: &str,
        stderr: &str,
        created_by: &str,
    ) -> Result<ResultRow> {
        if self.get_experiment(protocol_id).await?.is_none() {
            return Err(RelationalError::EndpointNotFound(protocol_id.to_string()));
        }
        let now = Utc::now();
        let row = ResultRow {
            id: Uuid::new_v4().to_string(),
            protocol_id: protocol_id.to_string(),
            hypothesis_id: hypothesis_id.to_string(),
            status: status.to_string(),
            metrics: metrics.to_string(),
            supports_hypothesis: supports_hypothesis.to_string(),
            p_value,
            effect_size,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO experiment_results
                (id, protocol_id, hypothesis_id, status, metrics, supports_hypothesis, p_value, effect_size,
                 stdout, stderr, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.id)
        .bind(&row.protocol_id)
        .bind(&row.hypothesis_id)
        .bind(&row.status)
        .bind(&row.metrics)
        .bind(&row.supports_hypothesis)
        .bind(row.p_value)
        .bind(row.effect_size)
        .bind(&row.stdout)
        .bind(&row.stderr)
        .bind(&row.created_by)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_result(&self, id: &str) -> Result<Option<ResultRow>> {
        let row = sqlx::query_as::<_, ResultRow>("SELECT * FROM experiment_results WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
