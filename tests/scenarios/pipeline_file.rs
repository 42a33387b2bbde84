//! Test: Pipeline files - parameter files, overrides and interpolation

use crate::helpers::*;
use batchstep::core::{PipelineConfig, StepStatus};
use batchstep::execution::{prepare_run, RunOptions};

const PARAMS: &str = r#"
PATHS:
  root: /opt/jobs
PERIOD:
  start: "201709"
  stop: "201801"
SCRIPT:
  code_root: ${PATHS:root}/r/
"#;

fn pipeline_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("params.yaml"), PARAMS).unwrap();
    std::fs::write(
        dir.path().join("pipeline.yaml"),
        r#"
name: nightly
parameters: params.yaml
steps:
  - name: extract
    script: extract.r
    params: ["PERIOD:start", "PERIOD:stop"]
"#,
    )
    .unwrap();
    dir
}

/// The parameter file is found next to the pipeline file
#[test]
fn test_parameter_file_loaded() {
    let dir = pipeline_dir();
    let config = PipelineConfig::from_file(dir.path().join("pipeline.yaml")).unwrap();
    let run = prepare_run(&config, &RunOptions::default()).unwrap();

    let configuration = run.configuration().unwrap();
    assert_eq!(configuration.resolve("PERIOD:stop").unwrap(), "201801");
    assert_eq!(configuration.resolve("SCRIPT:code_root").unwrap(), "/opt/jobs/r/");
}

/// Overrides win over the parameter file and fall back to it otherwise
#[test]
fn test_overrides_take_precedence() {
    let dir = pipeline_dir();
    let config = PipelineConfig::from_file(dir.path().join("pipeline.yaml")).unwrap();
    let options = RunOptions {
        overrides: vec![("PERIOD:start".to_string(), "202001".to_string())],
        ..RunOptions::default()
    };
    let run = prepare_run(&config, &options).unwrap();

    let configuration = run.configuration().unwrap();
    assert_eq!(configuration.resolve("PERIOD:start").unwrap(), "202001");
    assert_eq!(configuration.resolve("PERIOD:stop").unwrap(), "201801");
}

/// A missing code root aborts the step that needs it
#[test]
fn test_missing_code_root_aborts() {
    let dir = pipeline_dir();
    let config = PipelineConfig::from_file(dir.path().join("pipeline.yaml")).unwrap();

    let result = run_pipeline(&config, &RunOptions::default());

    assert_run_aborted(&result);
    assert_step_status(&result, "extract", StepStatus::Aborted);
}

/// An explicit parameter file replaces the pipeline's
#[test]
fn test_explicit_parameter_file() {
    let dir = pipeline_dir();
    let other = dir.path().join("other.yaml");
    std::fs::write(&other, "PERIOD:\n  start: \"199901\"\n").unwrap();

    let config = PipelineConfig::from_file(dir.path().join("pipeline.yaml")).unwrap();
    let options = RunOptions {
        parameters: Some(other),
        ..RunOptions::default()
    };
    let run = prepare_run(&config, &options).unwrap();

    let configuration = run.configuration().unwrap();
    assert_eq!(configuration.resolve("PERIOD:start").unwrap(), "199901");
    assert!(configuration.resolve("PERIOD:stop").is_err());
}

/// An unreadable parameter file fails preparation
#[test]
fn test_unreadable_parameter_file() {
    let config = PipelineConfig::from_yaml(
        "name: nightly\nparameters: /definitely/not/here.yaml\nsteps: []\n",
    )
    .unwrap();

    let err = prepare_run(&config, &RunOptions::default()).unwrap_err();
    assert!(err.to_string().contains("/definitely/not/here.yaml"));
}
