//! Execution state models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall run status, set only when the run scope exits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run scope has not exited yet
    NotStarted,
    /// Run scope exited without a failure
    Completed,
    /// A failure escaped the run scope
    Aborted,
}

impl RunStatus {
    /// Check if the run has been finalized
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::NotStarted)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunStatus::NotStarted => "App Not Started",
            RunStatus::Completed => "App Completed",
            RunStatus::Aborted => "App Aborted",
        };
        f.write_str(label)
    }
}

/// State of a single step
///
/// `NotStarted -> Started -> {Completed | Aborted}`, plus the skip path
/// `NotStarted -> Skipped`. A skipped step never becomes `Started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step is created but its scope was not entered
    NotStarted,
    /// Step scope is open
    Started,
    /// Step scope exited without a failure
    Completed,
    /// A failure was raised inside the step scope
    Aborted,
    /// Step was exempted at creation and its scope has exited
    Skipped,
}

impl StepStatus {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Aborted | StepStatus::Skipped
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepStatus::NotStarted => "Not Started",
            StepStatus::Started => "Started",
            StepStatus::Completed => "Completed",
            StepStatus::Aborted => "Aborted",
            StepStatus::Skipped => "Skipped",
        };
        f.write_str(label)
    }
}
