//! The director's state machine (spec §4.7), grounded on
//! `llmspell-agents::lifecycle::state_machine::AgentState`'s
//! enumerated-predecessor transition discipline.

use serde::{Deserialize, Serialize};

use crate::error::{DirectorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectorState {
    Init,
    GeneratingHypotheses,
    DesigningExperiments,
    ExecutingExperiments,
    AnalyzingResults,
    RefiningHypotheses,
    Converged,
    Failed,
}

impl DirectorState {
    /// States from which a transition into `self` is permitted.
    #[must_use]
    pub fn allowed_predecessors(self) -> &'static [Self] {
        match self {
            Self::Init => &[],
            Self::GeneratingHypotheses => &[Self::Init, Self::RefiningHypotheses],
            Self::DesigningExperiments => &[Self::GeneratingHypotheses],
            Self::ExecutingExperiments => &[Self::DesigningExperiments],
            Self::AnalyzingResults => &[Self::ExecutingExperiments],
            Self::RefiningHypotheses => &[Self::AnalyzingResults],
            // Convergence and budget exhaustion can both be detected right
            // after analysis, without a refinement pass.
            Self::Converged => &[Self::AnalyzingResults, Self::RefiningHypotheses],
            Self::Failed => &[
                Self::Init,
                Self::GeneratingHypotheses,
                Self::DesigningExperiments,
                Self::ExecutingExperiments,
                Self::AnalyzingResults,
                Self::RefiningHypotheses,
            ],
        }
    }

    /// Validate `from -> self`.
    ///
    /// # Errors
    /// Returns [`DirectorError::InvalidTransition`] if `from` is not an
    /// allowed predecessor of `self`.
    pub fn validate_transition_from(self, from: Self) -> Result<()> {
        if self.allowed_predecessors().contains(&from) {
            Ok(())
        } else {
            Err(DirectorError::InvalidTransition { from, to: self })
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Converged | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_transition_back_to_generating_is_allowed() {
        DirectorState::GeneratingHypotheses
            .validate_transition_from(DirectorState::RefiningHypotheses)
            .unwrap();
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        let err = DirectorState::ExecutingExperiments
            .validate_transition_from(DirectorState::GeneratingHypotheses)
            .unwrap_err();
        assert!(matches!(err, DirectorError::InvalidTransition { .. }));
    }

    #[test]
    fn failed_and_converged_are_terminal() {
        assert!(DirectorState::Converged.is_terminal());
        assert!(DirectorState::Failed.is_terminal());
        assert!(!DirectorState::Init.is_terminal());
    }
}
