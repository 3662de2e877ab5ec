//! The shared `research_plan` state (spec §4.7), guarded by a scoped lock so
//! every entry/exit pair is paired on all paths, including exception paths.

use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct PlanState {
    pub plan_id: String,
    pub research_question_id: String,
    pub iteration_count: i64,
    pub converged: bool,
    pub convergence_reason: Option<String>,
    pub hypothesis_ids: Vec<String>,
    pub protocol_ids: Vec<String>,
    pub result_ids: Vec<String>,
}

/// Wraps [`PlanState`] behind a lock so callers always go through
/// [`SharedResearchPlan::with_lock`] — entry and exit are paired by the
/// guard's `Drop`, even if the closure panics or returns early via `?`.
pub struct SharedResearchPlan {
    state: Mutex<PlanState>,
}

impl SharedResearchPlan {
    #[must_use]
    pub fn new(plan_id: String, research_question_id: String) -> Self {
        Self {
            state: Mutex::new(PlanState {
                plan_id,
                research_question_id,
                iteration_count: 0,
                converged: false,
                convergence_reason: None,
                hypothesis_ids: Vec::new(),
                protocol_ids: Vec::new(),
                result_ids: Vec::new(),
            }),
        }
    }

    pub fn with_lock<R>(&self, f: impl FnOnce(&mut PlanState) -> R) -> R {
        let mut guard = self.state.lock();
        f(&mut guard)
    }

    #[must_use]
    pub fn snapshot(&self) -> PlanState {
        self.state.lock().clone()
    }

    /// Advance the iteration counter by exactly one; monotonic by construction.
    pub fn advance_iteration(&self) -> i64 {
        self.with_lock(|plan| {
            plan.iteration_count += 1;
            plan.iteration_count
        })
    }

    /// One-way latch: once converged, further calls are no-ops.
    pub fn set_converged(&self, reason: impl Into<String>) {
        self.with_lock(|plan| {
            if !plan.converged {
                plan.converged = true;
                plan.convergence_reason = Some(reason.into());
            }
        });
    }

    #[must_use]
    pub fn has_converged(&self) -> bool {
        self.state.lock().converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_count_only_increases() {
        let plan = SharedResearchPlan::new("plan-1".into(), "q-1".into());
        assert_eq!(plan.advance_iteration(), 1);
        assert_eq!(plan.advance_iteration(), 2);
        assert_eq!(plan.advance_iteration(), 3);
    }

    #[test]
    fn convergence_latch_never_reverts() {
        let plan = SharedResearchPlan::new("plan-1".into(), "q-1".into());
        plan.set_converged("max_iterations");
        plan.set_converged("ignored");
        assert!(plan.has_converged());
        assert_eq!(plan.snapshot().convergence_reason.as_deref(), Some("max_iterations"));
    }
}
