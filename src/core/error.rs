//! Step-attributed execution errors

use thiserror::Error;

/// An operational failure attributed to the step it happened in
///
/// Renders as `error in step {step} - {kind}`.
#[derive(Debug, Error)]
#[error("error in step {step} - {kind}")]
pub struct ExecutionError {
    step: String,
    #[source]
    kind: ErrorKind,
}

/// What went wrong inside a step
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("Missing parameter - {0}")]
    MissingParameter(String),

    #[error("Input assertion - {0}")]
    InputAssertion(String),

    #[error("Configuration error - {0}")]
    Configuration(String),

    #[error("Root of scripts (code_root) not found at {0}")]
    ScriptRootNotFound(String),

    #[error("Interpreter not found at {0}")]
    InterpreterNotFound(String),

    #[error("Script not found at {0}")]
    ScriptNotFound(String),

    #[error("Failed to start {target}: {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{target} exited with code {code}: {stderr}")]
    ProcessFailed {
        target: String,
        code: i32,
        stderr: String,
    },

    #[error("Step already entered")]
    AlreadyEntered,

    #[error("No step #{0} in this run")]
    UnknownStep(usize),
}

impl ExecutionError {
    pub fn new(step: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            step: step.into(),
            kind,
        }
    }

    /// Name of the step the failure is attributed to
    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}
