//! Serializable run summaries

use crate::core::context::RunContext;
use crate::core::state::{RunStatus, StepStatus};
use crate::core::step::Step;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub id: Uuid,

    pub name: String,

    pub status: RunStatus,

    pub started_at: Option<DateTime<Utc>>,

    pub ended_at: Option<DateTime<Utc>>,

    pub steps: Vec<StepSummary>,
}

/// Summary of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSummary {
    pub name: String,
    pub status: StepStatus,
    pub skipped: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Elapsed time in seconds (if the step has finished)
    pub elapsed_secs: Option<f64>,

    pub report: Option<String>,
}

impl RunSummary {
    pub fn from_run(run: &RunContext) -> Self {
        Self {
            id: run.id(),
            name: run.name().to_string(),
            status: run.status(),
            started_at: run.started_at(),
            ended_at: run.ended_at(),
            steps: run.steps().iter().map(StepSummary::from_step).collect(),
        }
    }

    /// Number of steps in the given status
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

impl StepSummary {
    pub fn from_step(step: &Step) -> Self {
        Self {
            name: step.name().to_string(),
            status: step.status(),
            skipped: step.is_skipped(),
            started_at: step.started_at(),
            ended_at: step.ended_at(),
            elapsed_secs: step.elapsed().map(|d| d.as_secs_f64()),
            report: step.report().map(str::to_string),
        }
    }
}
