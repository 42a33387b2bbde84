//! Test: Script runner - delegation from a step to an interpreter subprocess

use crate::helpers::*;
use batchstep::configuration::MapConfiguration;
use batchstep::core::{ErrorKind, RunContext, RunStatus, StepStatus};
use batchstep::runner::settings::CODE_ROOT_KEY;
use batchstep::runner::{Runner, ScriptRunner};

fn period() -> MapConfiguration {
    MapConfiguration::new()
        .with(CODE_ROOT_KEY, "a/")
        .with("PERIOD:start", "201709")
        .with("PERIOD:stop", "201801")
}

/// Parameters come back as key=value in request order, after the code root
#[test]
fn test_parameters_from_step_context() {
    let mut run = RunContext::new("nightly")
        .with_output(std::io::sink())
        .with_configuration(Box::new(period()));

    let params = run
        .step("echo", |step| {
            step.delegate(ScriptRunner::new)
                .get_parameters_as_map(&["PERIOD:start", "PERIOD:stop"])
        })
        .unwrap();

    assert_eq!(
        params,
        vec!["pathToCode=a/", "PERIOD:start=201709", "PERIOD:stop=201801"]
    );
}

/// The code root may come from the path parameter key itself
#[test]
fn test_code_root_from_path_parameter() {
    let configuration = MapConfiguration::new()
        .with("pathToCode", "a/")
        .with("PERIOD:start", "201709");
    let mut run = RunContext::new("nightly")
        .with_output(std::io::sink())
        .with_configuration(Box::new(configuration));

    let params = run
        .step("echo", |step| {
            step.delegate(ScriptRunner::new)
                .get_parameters_as_map(&["PERIOD:start"])
        })
        .unwrap();

    assert_eq!(params, vec!["pathToCode=a/", "PERIOD:start=201709"]);
}

/// The first missing parameter is named and the step aborts
#[cfg(unix)]
#[test]
fn test_missing_parameter_aborts_step() {
    let fixture = ScriptFixture::new();
    let configuration = fixture
        .overrides()
        .into_iter()
        .fold(period(), |config, (key, value)| config.with(key, value));
    let mut run = RunContext::new("nightly")
        .with_output(std::io::sink())
        .with_configuration(Box::new(configuration));

    let err = run
        .step("echo", |step| {
            let mut runner = step.delegate(ScriptRunner::new);
            runner.scope(|runner| runner.call("echo.r", &["PERIOD:start", "x", "y"]))
        })
        .unwrap_err();

    assert_eq!(err.to_string(), "error in step echo - Missing parameter - x");
    assert_eq!(run.steps()[0].status(), StepStatus::Aborted);
}

/// Without a configuration every required parameter is missing
#[test]
fn test_no_configuration() {
    let mut run = RunContext::new("nightly").with_output(std::io::sink());

    let err = run
        .step("echo", |step| step.delegate(ScriptRunner::new).get_parameters_as_map(&[]))
        .unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::MissingParameter(key) if key == CODE_ROOT_KEY));
}

/// A missing code root is reported before any parameter is resolved
#[test]
fn test_wrong_code_root() {
    let mut run = RunContext::new("nightly")
        .with_output(std::io::sink())
        .with_configuration(Box::new(MapConfiguration::new().with(CODE_ROOT_KEY, "doesnotexist")));

    let err = run
        .step("echo", |step| step.delegate(ScriptRunner::new).call("echo.r", &["x"]))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "error in step echo - Root of scripts (code_root) not found at doesnotexist"
    );
}

/// A pipeline step runs its script with the resolved parameters
#[cfg(unix)]
#[test]
fn test_pipeline_runs_scripts() {
    let fixture = ScriptFixture::new();
    let out = fixture.path().join("out.txt");
    fixture.script(
        "extract.sh",
        &format!("echo \"$@\" > {}\n", out.display()),
    );

    let yaml = r#"
name: nightly
steps:
  - name: extract
    script: extract.sh
    params: ["PERIOD:start"]
"#;
    let mut options = fixture.options();
    options
        .overrides
        .push(("PERIOD:start".to_string(), "201709".to_string()));

    let result = run_pipeline_yaml(yaml, options);

    assert_run_completed(&result);
    assert_step_status(&result, "extract", StepStatus::Completed);
    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        written.trim(),
        format!("pathToCode={} PERIOD:start=201709", fixture.root())
    );
}

/// A non-zero exit aborts the step and the run
#[cfg(unix)]
#[test]
fn test_failing_script_aborts_run() {
    let fixture = ScriptFixture::new();
    fixture
        .script("extract.sh", "exit 0\n")
        .script("transform.sh", "echo 'row 12 is malformed' >&2\nexit 2\n")
        .script("load.sh", "exit 0\n");

    let yaml = r#"
name: nightly
steps:
  - name: extract
    script: extract.sh
  - name: transform
    script: transform.sh
  - name: load
    script: load.sh
"#;
    let result = run_pipeline_yaml(yaml, fixture.options());

    assert_run_aborted(&result);
    assert_eq!(result.step_names(), vec!["extract", "transform"]);
    assert_step_status(&result, "transform", StepStatus::Aborted);
    assert_report_line(&result, "| transform - Aborted in ");
    assert_eq!(result.summary.status, RunStatus::Aborted);
}

/// Inputs are asserted before the script runs
#[cfg(unix)]
#[test]
fn test_inputs_checked_before_script() {
    let fixture = ScriptFixture::new();
    let marker = fixture.path().join("ran");
    fixture.script("load.sh", &format!("touch {}\n", marker.display()));

    let yaml = format!(
        r#"
name: nightly
steps:
  - name: load
    script: load.sh
    inputs: ["{}/input/*.csv"]
"#,
        fixture.root()
    );
    let result = run_pipeline_yaml(&yaml, fixture.options());

    assert_run_aborted(&result);
    assert!(!marker.exists());

    std::fs::create_dir(fixture.path().join("input")).unwrap();
    std::fs::write(fixture.path().join("input/data.csv"), "x\n").unwrap();
    let result = run_pipeline_yaml(&yaml, fixture.options());

    assert_run_completed(&result);
    assert!(marker.exists());
}
