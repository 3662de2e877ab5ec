//! Observability hooks (spec §4.10): every mutating call records operation
//! name, duration, outcome, and project tag. Simple mode collects via
//! `tracing` only; no business logic depends on whether a sink is attached.

use std::time::Instant;

use tracing::info;

pub struct OperationTimer {
    operation: &'static str,
    project: Option<String>,
    start: Instant,
}

impl OperationTimer {
    #[must_use]
    pub fn start(operation: &'static str, project: Option<&str>) -> Self {
        Self {
            operation,
            project: project.map(ToString::to_string),
            start: Instant::now(),
        }
    }

    pub fn finish_ok(self) {
        info!(
            operation = self.operation,
            project = self.project.as_deref().unwrap_or("-"),
            duration_ms = self.start.elapsed().as_millis(),
            outcome = "ok",
            "world model operation"
        );
    }

    pub fn finish_err(self, error: &dyn std::fmt::Display) {
        info!(
            operation = self.operation,
            project = self.project.as_deref().unwrap_or("-"),
            duration_ms = self.start.elapsed().as_millis(),
            outcome = "fail",
            error = %error,
            "world model operation"
        );
    }
}

/// Runs `f`, recording one metric for the operation regardless of outcome.
macro_rules! timed {
    ($operation:expr, $project:expr, $body:expr) => {{
        let timer = $crate::metrics::OperationTimer::start($operation, $project);
        match $body.await {
            Ok(value) => {
                timer.finish_ok();
                Ok(value)
            }
            Err(error) => {
                timer.finish_err(&error);
                Err(error)
            }
        }
    }};
}

pub(crate) use timed;
