//! CLI output formatting

use crate::{
    core::{RunStatus, RunSummary, StepStatus},
    execution::ExecutionEvent,
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Format a step status for display
pub fn format_step_status(status: StepStatus) -> String {
    let label = status.to_string().to_uppercase();
    match status {
        StepStatus::NotStarted => style(label).dim().to_string(),
        StepStatus::Started => style(label).yellow().to_string(),
        StepStatus::Completed => style(label).green().to_string(),
        StepStatus::Aborted => style(label).red().to_string(),
        StepStatus::Skipped => style(label).dim().to_string(),
    }
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::NotStarted => style("NOT STARTED").dim().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Aborted => style("ABORTED").red().to_string(),
    }
}

/// One-line summary of a finished run
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Completed => CHECK,
        RunStatus::Aborted => CROSS,
        RunStatus::NotStarted => INFO,
    };

    format!(
        "{} {} ({}) - {} - {} completed, {} skipped, {} aborted",
        status_icon,
        style(&summary.name).bold(),
        style(&summary.id.to_string()[..8]).dim(),
        format_status(summary.status),
        style(summary.count(StepStatus::Completed)).green(),
        style(summary.count(StepStatus::Skipped)).dim(),
        style(summary.count(StepStatus::Aborted)).red(),
    )
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::RunStarted {
            run_id,
            run_name,
            steps,
        } => format!(
            "{} Starting {} ({}) with {} step(s)",
            ROCKET,
            style(run_name).bold(),
            style(&run_id.to_string()[..8]).dim(),
            steps
        ),
        ExecutionEvent::StepStarted { step, skipped } => {
            if *skipped {
                format!("{} {} (skipped)", SKIP, style(step).dim())
            } else {
                format!("{} {}", SPINNER, style(step).cyan())
            }
        }
        ExecutionEvent::StepFinished { step, status, report } => {
            let icon = match status {
                StepStatus::Completed => CHECK,
                StepStatus::Aborted => CROSS,
                StepStatus::Skipped => SKIP,
                _ => WARN,
            };
            match report {
                Some(report) => format!("{} {}", icon, style(report).dim()),
                None => format!("{} {} {}", icon, style(step).bold(), format_step_status(*status)),
            }
        }
        ExecutionEvent::RunFinished { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(&run_id.to_string()[..8]).dim(),
            format_status(*status)
        ),
    }
}
