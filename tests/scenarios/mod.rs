//! Scenario-based tests for batchstep

mod pipeline_file;
mod run_report;
mod script_runner;
