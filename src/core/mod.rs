//! Core domain models for a run
//!
//! This module defines the run context, its steps, their status state
//! machines and the pipeline file that drives them.

pub mod config;
pub mod context;
pub mod error;
pub mod state;
pub mod step;
pub mod summary;

pub use config::{PipelineConfig, StepConfig};
pub use context::*;
pub use error::{ErrorKind, ExecutionError};
pub use state::*;
pub use step::*;
pub use summary::{RunSummary, StepSummary};
