//! Pipeline execution engine

pub mod engine;

pub use engine::{prepare_run, EventHandler, ExecutionEngine, ExecutionEvent, RunOptions};
