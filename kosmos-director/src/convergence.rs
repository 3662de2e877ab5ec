//! Convergence policy (spec §4.7, §5): inspects per-iteration metrics and
//! emits a `should_converge` decision with a reason, including the
//! budget-exhausted → `CONVERGED` (never `FAILED`) mapping.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ConvergencePolicy {
    pub max_iterations: i64,
    /// Minimum proportion of supported hypotheses (of those analyzed this
    /// iteration) below which refinement continues.
    pub min_supported_ratio: f64,
    pub per_iteration_budget: Duration,
}

impl Default for ConvergencePolicy {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            min_supported_ratio: 0.5,
            per_iteration_budget: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConvergenceDecision {
    pub should_converge: bool,
    pub reason: Option<String>,
}

impl ConvergenceDecision {
    const fn continue_loop() -> Self {
        Self {
            should_converge: false,
            reason: None,
        }
    }

    fn converge(reason: impl Into<String>) -> Self {
        Self {
            should_converge: true,
            reason: Some(reason.into()),
        }
    }
}

impl ConvergencePolicy {
    /// `supported` and `analyzed` describe this iteration's analyst verdicts;
    /// `elapsed` is the wall time spent so far in the current cycle.
    #[must_use]
    pub fn evaluate(&self, iteration_count: i64, supported: usize, analyzed: usize, elapsed: Duration) -> ConvergenceDecision {
        if elapsed >= self.per_iteration_budget {
            return ConvergenceDecision::converge("budget_exhausted");
        }
        if iteration_count >= self.max_iterations {
            return ConvergenceDecision::converge("max_iterations_reached");
        }
        if analyzed > 0 {
            let ratio = supported as f64 / analyzed as f64;
            if ratio >= self.min_supported_ratio {
                return ConvergenceDecision::converge("sufficient_support_achieved");
            }
        }
        ConvergenceDecision::continue_loop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhaustion_converges_rather_than_fails() {
        let policy = ConvergencePolicy {
            per_iteration_budget: Duration::from_millis(1),
            ..ConvergencePolicy::default()
        };
        let decision = policy.evaluate(1, 0, 0, Duration::from_secs(1));
        assert!(decision.should_converge);
        assert_eq!(decision.reason.as_deref(), Some("budget_exhausted"));
    }

    #[test]
    fn insufficient_support_continues() {
        let policy = ConvergencePolicy::default();
        let decision = policy.evaluate(1, 1, 5, Duration::from_secs(1));
        assert!(!decision.should_converge);
    }

    #[test]
    fn sufficient_support_converges() {
        let policy = ConvergencePolicy::default();
        let decision = policy.evaluate(1, 4, 5, Duration::from_secs(1));
        assert!(decision.should_converge);
        assert_eq!(decision.reason.as_deref(), Some("sufficient_support_achieved"));
    }
}
