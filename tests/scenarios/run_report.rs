//! Test: Run report - layout, abort reporting, file audit and JSON summary

use crate::helpers::*;
use batchstep::core::{RunContext, RunStatus, StepStatus};
use batchstep::monitor::FileAudit;

/// The report block has a fixed layout
#[test]
fn test_report_layout() {
    let buffer = SharedBuffer::default();
    let mut run = RunContext::new("nightly").with_output(buffer.clone());
    run.skip_steps(["load"]);

    run.execute(|run| {
        run.step("extract", |_| Ok::<(), anyhow::Error>(()))?;
        run.step("load", |_| Ok::<(), anyhow::Error>(()))?;
        Ok(())
    });

    let report = buffer.contents();
    let lines: Vec<&str> = report.lines().collect();
    let border = "=".repeat(59);

    assert_eq!(lines.len(), 9, "report:\n{}", report);
    assert_eq!(lines[0], border);
    assert_eq!(lines[1], "|");
    assert_eq!(lines[2], "| REPORT - nightly");
    assert_eq!(lines[3], "|");
    assert_eq!(lines[4], "| Status: App Completed");
    assert_eq!(lines[5], "| Number of steps: 2");
    assert!(lines[6].starts_with("| extract - Completed in "));
    assert!(lines[6].ends_with(" seconds"));
    assert_eq!(lines[7], "| load - Skipped");
    assert_eq!(lines[8], border);
}

/// Durations print as seconds with six decimal places
#[test]
fn test_duration_has_microseconds() {
    let mut run = RunContext::new("nightly").with_output(std::io::sink());
    run.step("extract", |_| Ok::<(), String>(())).unwrap();

    let line = run.steps()[0].report().unwrap();
    let seconds = line
        .strip_prefix("extract - Completed in ")
        .and_then(|rest| rest.strip_suffix(" seconds"))
        .unwrap();
    let (whole, fraction) = seconds.split_once('.').unwrap();
    assert!(whole.parse::<u64>().is_ok());
    assert_eq!(fraction.len(), 6);
}

/// An aborted run still writes its report
#[test]
fn test_report_written_on_abort() {
    let buffer = SharedBuffer::default();
    let mut run = RunContext::new("nightly").with_output(buffer.clone());

    let status = run.execute(|_| Err(anyhow::anyhow!("configuration unreadable")));

    assert_eq!(status, RunStatus::Aborted);
    let report = buffer.contents();
    assert!(report.contains("| Status: App Aborted"));
    assert!(report.contains("| Number of steps: 0"));
}

/// The file audit lists what changed while the run was open
#[test]
fn test_file_audit_section() {
    let dir = tempfile::tempdir().unwrap();
    let existing = dir.path().join("existing.csv");
    let removed = dir.path().join("removed.csv");
    std::fs::write(&existing, "a,b\n").unwrap();
    std::fs::write(&removed, "a,b\n").unwrap();

    let pattern = format!("{}/*.csv", dir.path().display());
    let buffer = SharedBuffer::default();
    let mut run = RunContext::new("nightly")
        .with_output(buffer.clone())
        .with_monitor(Box::new(FileAudit::new([pattern])));

    let created = dir.path().join("created.csv");
    let status = run.execute(|run| {
        run.step("write", |_| {
            std::fs::write(&created, "x\n")?;
            std::fs::write(&existing, "a,b\n1,2\n")?;
            std::fs::remove_file(&removed)?;
            Ok::<(), std::io::Error>(())
        })?;
        Ok(())
    });

    assert_eq!(status, RunStatus::Completed);
    let report = buffer.contents();
    assert!(report.contains("| File audit (1 pattern(s))"));
    assert!(report.contains(&format!("|   created  {}", created.display())));
    assert!(report.contains(&format!("|   modified {}", existing.display())));
    assert!(report.contains(&format!("|   removed  {}", removed.display())));
}

/// The JSON summary mirrors the report
#[test]
fn test_summary_json() {
    let result = run_pipeline_yaml(
        r#"
name: nightly
skip: [load]
steps:
  - name: extract
  - name: load
"#,
        Default::default(),
    );

    assert_run_completed(&result);
    assert_eq!(result.step_names(), vec!["extract", "load"]);

    let json = serde_json::to_value(&result.summary).unwrap();
    assert_eq!(json["name"], "nightly");
    assert_eq!(json["status"], "Completed");
    assert_eq!(json["steps"][1]["status"], "Skipped");
    assert_eq!(json["steps"][1]["skipped"], true);
    assert!(json["steps"][0]["elapsed_secs"].is_number());
    assert_eq!(result.summary.count(StepStatus::Completed), 1);
}
