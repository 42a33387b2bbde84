//! batchstep - step-oriented batch pipelines with per-step reporting

pub mod cli;
pub mod configuration;
pub mod core;
pub mod execution;
pub mod logging;
pub mod monitor;
pub mod runner;

// Re-export commonly used types
pub use configuration::{ConfigError, ConfigurationProvider, MapConfiguration, YamlConfiguration};
pub use crate::core::{
    ErrorKind, ExecutionError, PipelineConfig, RunContext, RunGuard, RunStatus, RunSummary, Step,
    StepGuard, StepId, StepStatus,
};
pub use execution::{ExecutionEngine, ExecutionEvent};
pub use monitor::{FileAudit, FileMonitor};
pub use runner::{Runner, ScriptRunner, ScriptSettings, StepContext};
