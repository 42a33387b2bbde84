//! Run context - the ordered steps of one execution and their report

use crate::configuration::ConfigurationProvider;
use crate::core::error::{ErrorKind, ExecutionError};
use crate::core::state::RunStatus;
use crate::core::step::{Step, StepGuard};
use crate::core::summary::RunSummary;
use crate::monitor::FileMonitor;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};
use std::ops::{Deref, DerefMut};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

const BORDER: &str = "===========================================================";

/// Handle to a step created by `RunContext::new_step`
///
/// Only valid for the run that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId {
    run: Uuid,
    index: usize,
}

impl StepId {
    /// Position of the step in creation order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Id of the run that created the step
    pub fn run_id(&self) -> Uuid {
        self.run
    }
}

/// Execution context for one run
///
/// Owns the steps in declaration order, the optional parameter
/// configuration and the optional file monitor. The steps are append-only.
pub struct RunContext {
    id: Uuid,
    name: String,
    status: RunStatus,
    steps: Vec<Step>,
    skipped_step_names: BTreeSet<String>,
    configuration: Option<Box<dyn ConfigurationProvider>>,
    monitor: Option<Box<dyn FileMonitor>>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    output: Box<dyn Write>,
}

impl RunContext {
    /// Create a run that reports to stdout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            status: RunStatus::NotStarted,
            steps: Vec::new(),
            skipped_step_names: BTreeSet::new(),
            configuration: None,
            monitor: None,
            started_at: None,
            ended_at: None,
            output: Box::new(io::stdout()),
        }
    }

    /// Send the end-of-run report to another writer
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    pub fn with_configuration(mut self, configuration: Box<dyn ConfigurationProvider>) -> Self {
        self.set_configuration(configuration);
        self
    }

    pub fn with_monitor(mut self, monitor: Box<dyn FileMonitor>) -> Self {
        self.set_monitor(monitor);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Steps in creation order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get_step(&self, id: StepId) -> Option<&Step> {
        if id.run != self.id {
            return None;
        }
        self.steps.get(id.index)
    }

    pub fn set_configuration(&mut self, configuration: Box<dyn ConfigurationProvider>) {
        info!(run = %self.name, source = %configuration.describe(), "configuration attached");
        self.configuration = Some(configuration);
    }

    pub fn configuration(&self) -> Option<&dyn ConfigurationProvider> {
        self.configuration.as_deref()
    }

    pub fn set_monitor(&mut self, monitor: Box<dyn FileMonitor>) {
        self.monitor = Some(monitor);
    }

    /// Names of steps to exempt from execution when they are created
    ///
    /// Only affects steps created afterwards.
    pub fn skip_steps<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.steps.is_empty() {
            warn!(
                run = %self.name,
                created = self.steps.len(),
                "skip list changed after steps were created; existing steps are unaffected"
            );
        }
        self.skipped_step_names = names.into_iter().map(Into::into).collect();
    }

    pub fn skipped_step_names(&self) -> &BTreeSet<String> {
        &self.skipped_step_names
    }

    /// Create and append a step; its skip flag is decided here
    pub fn new_step(&mut self, name: impl Into<String>) -> StepId {
        let name = name.into();
        let skipped = self.skipped_step_names.contains(&name);
        self.steps.push(Step::new(name, skipped));
        StepId {
            run: self.id,
            index: self.steps.len() - 1,
        }
    }

    /// Open the scope of a step created by `new_step`
    ///
    /// A step scope can be entered only once.
    pub fn enter_step(&mut self, id: StepId) -> Result<StepGuard<'_>, ExecutionError> {
        let Some(step) = self.get_step(id) else {
            return Err(ExecutionError::new("<unknown>", ErrorKind::UnknownStep(id.index)));
        };
        if step.was_entered() {
            return Err(ExecutionError::new(step.name(), ErrorKind::AlreadyEntered));
        }
        Ok(self.open_step(id.index))
    }

    fn open_step(&mut self, index: usize) -> StepGuard<'_> {
        let configuration = self.configuration.as_deref();
        StepGuard::enter(&mut self.steps[index], &self.name, configuration)
    }

    /// Create a step and run `body` inside its scope
    ///
    /// The body's failure aborts the step and is returned unchanged.
    pub fn step<T, E, F>(&mut self, name: impl Into<String>, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut StepGuard<'_>) -> Result<T, E>,
        E: fmt::Display + fmt::Debug,
    {
        let id = self.new_step(name);
        let mut guard = self.open_step(id.index);
        let outcome = body(&mut guard);
        guard.exit(outcome)
    }

    /// Open the run scope
    ///
    /// Records the start time and attaches the file monitor.
    pub fn enter(&mut self) -> RunGuard<'_> {
        self.started_at = Some(Utc::now());
        info!(run = %self.name, id = %self.id, "run starting");

        if let Some(monitor) = self.monitor.as_mut() {
            monitor.attach(&self.name);
        }

        RunGuard {
            run: self,
            clock: Instant::now(),
            finished: false,
        }
    }

    /// Run `body` inside the run scope and return the final status
    ///
    /// This is the recovery boundary: a failure escaping `body` aborts the
    /// run but is not propagated. The report is always written.
    pub fn execute<F>(&mut self, body: F) -> RunStatus
    where
        F: FnOnce(&mut RunContext) -> anyhow::Result<()>,
    {
        let mut guard = self.enter();
        let outcome = body(&mut *guard);
        guard.exit(outcome)
    }

    /// Write the report block to the run's output
    pub fn report(&mut self) -> io::Result<()> {
        let rendered = self.render_report();
        self.output.write_all(rendered.as_bytes())?;
        self.output.flush()
    }

    /// Write the report block to `out`
    ///
    /// Safe at any time; steps whose scope has not exited show their
    /// current status instead of a report line.
    pub fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", BORDER)?;
        writeln!(out, "|")?;
        writeln!(out, "| REPORT - {}", self.name)?;
        writeln!(out, "|")?;
        writeln!(out, "| Status: {}", self.status)?;
        writeln!(out, "| Number of steps: {}", self.steps.len())?;
        for step in &self.steps {
            match step.report() {
                Some(line) => writeln!(out, "| {}", line)?,
                None => writeln!(out, "| {} - {}", step.name(), step.status())?,
            }
        }
        if let Some(monitor) = &self.monitor {
            writeln!(out, "|")?;
            monitor.report(out)?;
        }
        writeln!(out, "{}", BORDER)
    }

    pub fn render_report(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = self.write_report(&mut buf) {
            warn!(run = %self.name, error = %e, "report rendering incomplete");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serializable snapshot of the run and its steps
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_run(self)
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("steps", &self.steps)
            .field("skipped_step_names", &self.skipped_step_names)
            .field(
                "configuration",
                &self.configuration.as_ref().map(|c| c.describe()),
            )
            .field("monitor", &self.monitor.is_some())
            .finish()
    }
}

/// Open scope of a run
///
/// Dereferences to the `RunContext` so steps can be created inside the
/// scope. Dropping the guard without `exit` aborts the run.
pub struct RunGuard<'a> {
    run: &'a mut RunContext,
    clock: Instant,
    finished: bool,
}

impl RunGuard<'_> {
    /// Close the run scope with the outcome of its work
    ///
    /// Failures are logged and turned into `RunStatus::Aborted`; they are
    /// not propagated. The report is written in both cases.
    pub fn exit<T, E>(mut self, outcome: Result<T, E>) -> RunStatus
    where
        E: fmt::Display + fmt::Debug,
    {
        if let Err(e) = &outcome {
            error!(
                run = %self.run.name,
                id = %self.run.id,
                error = %e,
                details = ?e,
                "run aborted"
            );
        }
        self.finalize(outcome.is_err())
    }

    fn finalize(&mut self, aborted: bool) -> RunStatus {
        self.finished = true;

        let run = &mut *self.run;
        run.status = if aborted {
            RunStatus::Aborted
        } else {
            RunStatus::Completed
        };
        run.ended_at = Some(Utc::now());

        let elapsed = self.clock.elapsed();
        info!(
            run = %run.name,
            id = %run.id,
            status = %run.status,
            steps = run.steps.len(),
            "run finished in {}.{:06} seconds",
            elapsed.as_secs(),
            elapsed.subsec_micros()
        );

        if let Err(e) = run.report() {
            error!(run = %run.name, error = %e, "failed to write run report");
        }
        run.status
    }
}

impl Deref for RunGuard<'_> {
    type Target = RunContext;

    fn deref(&self) -> &RunContext {
        self.run
    }
}

impl DerefMut for RunGuard<'_> {
    fn deref_mut(&mut self) -> &mut RunContext {
        self.run
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            error!(run = %self.run.name, "run scope unwound by a panic");
        } else {
            warn!(run = %self.run.name, "run scope closed without an outcome");
        }
        self.finalize(true);
    }
}
