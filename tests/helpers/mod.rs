//! Test utility functions for batchstep
#![allow(dead_code)]

use batchstep::core::{PipelineConfig, RunStatus, RunSummary, StepStatus};
use batchstep::execution::{prepare_run, ExecutionEngine, RunOptions};
use batchstep::runner::settings::{CODE_ROOT_KEY, INTERPRETER_KEY};

use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;

/// In-memory writer whose contents stay readable after it is handed to a run
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Outcome of running a pipeline in a test
#[derive(Debug, Clone)]
pub struct RunTestResult {
    pub status: RunStatus,
    pub report: String,
    pub summary: RunSummary,
}

impl RunTestResult {
    pub fn step_status(&self, name: &str) -> Option<StepStatus> {
        self.summary
            .steps
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.status)
    }

    pub fn step_report(&self, name: &str) -> Option<&str> {
        self.summary
            .steps
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.report.as_deref())
    }

    /// Names of the steps that were created, in order
    pub fn step_names(&self) -> Vec<&str> {
        self.summary.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn report_lines(&self) -> Vec<&str> {
        self.report.lines().collect()
    }
}

/// Run a pipeline given as YAML, capturing its report
pub fn run_pipeline_yaml(yaml: &str, options: RunOptions) -> RunTestResult {
    let config = PipelineConfig::from_yaml(yaml).expect("pipeline should parse");
    run_pipeline(&config, &options)
}

/// Run a parsed pipeline, capturing its report
pub fn run_pipeline(config: &PipelineConfig, options: &RunOptions) -> RunTestResult {
    let buffer = SharedBuffer::default();
    let mut run = prepare_run(config, options)
        .expect("run should be prepared")
        .with_output(buffer.clone());

    let status = ExecutionEngine::new().execute(config, &mut run);

    RunTestResult {
        status,
        report: buffer.contents(),
        summary: run.summary(),
    }
}

/// Directory of shell scripts run through `sh`
pub struct ScriptFixture {
    dir: TempDir,
}

impl ScriptFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub fn script(&self, name: &str, body: &str) -> &Self {
        std::fs::write(self.dir.path().join(name), body).expect("write script");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> String {
        self.dir.path().display().to_string()
    }

    /// Overrides pointing the script runner at this directory and `sh`
    pub fn overrides(&self) -> Vec<(String, String)> {
        vec![
            (CODE_ROOT_KEY.to_string(), self.root()),
            (INTERPRETER_KEY.to_string(), "sh".to_string()),
        ]
    }

    pub fn options(&self) -> RunOptions {
        RunOptions {
            overrides: self.overrides(),
            ..RunOptions::default()
        }
    }
}

/// Assert that the run completed
pub fn assert_run_completed(result: &RunTestResult) {
    assert_eq!(
        result.status,
        RunStatus::Completed,
        "run should complete, report:\n{}",
        result.report
    );
}

/// Assert that the run aborted
pub fn assert_run_aborted(result: &RunTestResult) {
    assert_eq!(
        result.status,
        RunStatus::Aborted,
        "run should abort, report:\n{}",
        result.report
    );
}

/// Assert the final status of one step
pub fn assert_step_status(result: &RunTestResult, name: &str, expected: StepStatus) {
    assert_eq!(
        result.step_status(name),
        Some(expected),
        "unexpected status for step {}, report:\n{}",
        name,
        result.report
    );
}

/// Assert that the report contains a line starting with `prefix`
pub fn assert_report_line(result: &RunTestResult, prefix: &str) {
    assert!(
        result.report_lines().iter().any(|line| line.starts_with(prefix)),
        "no report line starting with {:?} in:\n{}",
        prefix,
        result.report
    );
}
