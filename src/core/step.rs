//! Step domain model and its scope guard

use crate::configuration::ConfigurationProvider;
use crate::core::error::{ErrorKind, ExecutionError};
use crate::core::state::StepStatus;
use crate::monitor::patterns;
use crate::runner::StepContext;
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A single named unit of work in a run
///
/// Steps are created by `RunContext::new_step` and are only mutated through
/// a `StepGuard` while their scope is open.
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    status: StepStatus,
    skipped: bool,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    elapsed: Option<Duration>,
    report: Option<String>,
}

impl Step {
    pub(crate) fn new(name: String, skipped: bool) -> Self {
        Self {
            name,
            status: StepStatus::NotStarted,
            skipped,
            started_at: None,
            ended_at: None,
            elapsed: None,
            report: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    /// Whether the step was exempted from execution when it was created
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Callers branch their work on this rather than on the status
    pub fn is_enabled(&self) -> bool {
        !self.skipped
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    /// Whether the scope has been entered at least once
    pub fn was_entered(&self) -> bool {
        self.started_at.is_some()
    }

    /// Report line, available once the scope has exited
    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    /// Check that an input file or glob pattern matches something on disk
    ///
    /// Exact paths must exist; glob patterns must match at least one path.
    pub fn assert_input_exists(&self, pattern: &str) -> Result<(), ExecutionError> {
        let matches = patterns::expand(pattern).map_err(|e| {
            ExecutionError::new(
                &self.name,
                ErrorKind::InputAssertion(format!("invalid pattern {}: {}", pattern, e)),
            )
        })?;

        if matches.is_empty() {
            warn!(step = %self.name, pattern, "input not found");
            return Err(ExecutionError::new(
                &self.name,
                ErrorKind::InputAssertion(format!("no input matches {}", pattern)),
            ));
        }

        debug!(step = %self.name, pattern, matched = matches.len(), "input present");
        Ok(())
    }

    fn finish(&mut self, aborted: bool, elapsed: Duration) {
        self.status = if aborted {
            StepStatus::Aborted
        } else if self.skipped {
            StepStatus::Skipped
        } else {
            StepStatus::Completed
        };
        self.ended_at = Some(Utc::now());
        self.elapsed = Some(elapsed);
        self.report = Some(format_report(&self.name, self.status, elapsed));
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Format the report line of a finalized step
///
/// Skipped steps carry no duration. Microseconds are zero-padded so the
/// duration reads as a decimal number of seconds.
pub fn format_report(name: &str, status: StepStatus, elapsed: Duration) -> String {
    match status {
        StepStatus::Skipped => format!("{} - {}", name, status),
        _ => format!(
            "{} - {} in {}.{:06} seconds",
            name,
            status,
            elapsed.as_secs(),
            elapsed.subsec_micros()
        ),
    }
}

/// Open scope of a step
///
/// Created by `RunContext::enter_step` or `RunContext::step`. `exit` must be
/// given the outcome of the scope's work; if the guard is dropped without
/// `exit` (panic or early return), the step is finalized as aborted.
pub struct StepGuard<'a> {
    step: &'a mut Step,
    run_name: &'a str,
    configuration: Option<&'a dyn ConfigurationProvider>,
    clock: Instant,
    finished: bool,
}

impl<'a> StepGuard<'a> {
    pub(crate) fn enter(
        step: &'a mut Step,
        run_name: &'a str,
        configuration: Option<&'a dyn ConfigurationProvider>,
    ) -> Self {
        step.started_at = Some(Utc::now());
        if !step.skipped {
            step.status = StepStatus::Started;
        }

        info!(run = %run_name, step = %step.name, skipped = step.skipped, "STEP {} is starting", step.name);

        Self {
            step,
            run_name,
            configuration,
            clock: Instant::now(),
            finished: false,
        }
    }

    pub fn step(&self) -> &Step {
        &*self.step
    }

    pub fn name(&self) -> &str {
        &self.step.name
    }

    pub fn is_enabled(&self) -> bool {
        self.step.is_enabled()
    }

    pub fn assert_input_exists(&self, pattern: &str) -> Result<(), ExecutionError> {
        self.step.assert_input_exists(pattern)
    }

    /// Context handed to runners: run name, step name and configuration
    pub fn context(&self) -> StepContext<'_> {
        StepContext::new(self.run_name, &self.step.name, self.configuration)
    }

    /// Build a runner for this step
    ///
    /// The factory receives the step context, e.g.
    /// `step.delegate(ScriptRunner::new)`.
    pub fn delegate<'s, R, F>(&'s self, factory: F) -> R
    where
        F: FnOnce(StepContext<'s>) -> R,
    {
        factory(self.context())
    }

    /// Close the scope with the outcome of its work
    ///
    /// A failure aborts the step, is logged and is handed back unchanged.
    pub fn exit<T, E>(mut self, outcome: Result<T, E>) -> Result<T, E>
    where
        E: fmt::Display + fmt::Debug,
    {
        if let Err(e) = &outcome {
            error!(
                run = %self.run_name,
                step = %self.step.name,
                error = %e,
                details = ?e,
                "ERROR - in step {}",
                self.step.name
            );
        }
        self.finalize(outcome.is_err());
        outcome
    }

    fn finalize(&mut self, aborted: bool) {
        self.finished = true;
        self.step.finish(aborted, self.clock.elapsed());

        let report = self.step.report.as_deref().unwrap_or_default();
        info!(run = %self.run_name, step = %self.step.name, status = %self.step.status, "STEP {}", report);
    }
}

impl Drop for StepGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            error!(step = %self.step.name, "step scope unwound by a panic");
        } else {
            warn!(step = %self.step.name, "step scope closed without an outcome");
        }
        self.finalize(true);
    }
}

impl fmt::Debug for StepGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepGuard")
            .field("step", &self.step)
            .field("run_name", &self.run_name)
            .field("finished", &self.finished)
            .finish()
    }
}
