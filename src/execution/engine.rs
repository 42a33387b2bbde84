//! Pipeline execution engine - runs a pipeline file through a run context

use crate::{
    configuration::{MapConfiguration, YamlConfiguration},
    core::{ExecutionError, PipelineConfig, RunContext, RunStatus, StepConfig, StepStatus},
    monitor::FileAudit,
    runner::{Runner, ScriptRunner, ScriptSettings},
};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        run_id: Uuid,
        run_name: String,
        steps: usize,
    },
    StepStarted {
        step: String,
        skipped: bool,
    },
    StepFinished {
        step: String,
        status: StepStatus,
        report: Option<String>,
    },
    RunFinished {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Box<dyn Fn(&ExecutionEvent)>;

/// Overrides applied when preparing a run from a pipeline file
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Parameter file used instead of the one named by the pipeline
    pub parameters: Option<PathBuf>,

    /// `SECTION:key=value` pairs taking precedence over the parameter file
    pub overrides: Vec<(String, String)>,

    /// Step names skipped in addition to the pipeline's skip list
    pub skip: Vec<String>,
}

/// Build the run context for a pipeline: parameters, skip list and file audit
pub fn prepare_run(pipeline: &PipelineConfig, options: &RunOptions) -> Result<RunContext> {
    let mut run = RunContext::new(&pipeline.name);

    let parameters = match &options.parameters {
        Some(path) => Some(YamlConfiguration::from_file(path)?),
        None => pipeline.load_parameters()?,
    };

    match (parameters, options.overrides.is_empty()) {
        (Some(parameters), true) => run.set_configuration(Box::new(parameters)),
        (Some(parameters), false) => run.set_configuration(Box::new(
            options
                .overrides
                .iter()
                .cloned()
                .collect::<MapConfiguration>()
                .with_fallback(Box::new(parameters)),
        )),
        (None, false) => run.set_configuration(Box::new(
            options.overrides.iter().cloned().collect::<MapConfiguration>(),
        )),
        (None, true) => debug!(run = %pipeline.name, "no parameter configuration"),
    }

    let skip: Vec<String> = pipeline
        .skip
        .iter()
        .chain(options.skip.iter())
        .cloned()
        .collect();
    run.skip_steps(skip);

    if !pipeline.monitor.is_empty() {
        run.set_monitor(Box::new(FileAudit::new(pipeline.monitor.iter().cloned())));
    }

    Ok(run)
}

/// Main pipeline execution engine
///
/// Steps run strictly in declaration order; the first failing step aborts
/// the run and later steps are never created.
pub struct ExecutionEngine {
    settings: ScriptSettings,
    event_handlers: Vec<EventHandler>,
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionEngine {
    pub fn new() -> Self {
        Self::with_settings(ScriptSettings::default())
    }

    pub fn with_settings(settings: ScriptSettings) -> Self {
        Self {
            settings,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&ExecutionEvent) + 'static,
    {
        self.event_handlers.push(Box::new(handler));
    }

    fn emit_event(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Execute the pipeline's steps inside the run scope
    ///
    /// Never fails: a step failure aborts the run and shows up in the
    /// returned status and the report.
    pub fn execute(&self, pipeline: &PipelineConfig, run: &mut RunContext) -> RunStatus {
        info!(
            run = %run.name(),
            steps = pipeline.steps.len(),
            "Starting pipeline execution: {}",
            pipeline.name
        );
        self.emit_event(ExecutionEvent::RunStarted {
            run_id: run.id(),
            run_name: run.name().to_string(),
            steps: pipeline.steps.len(),
        });

        let status = run.execute(|run| {
            for step in &pipeline.steps {
                self.run_step(run, step)?;
            }
            Ok(())
        });

        self.emit_event(ExecutionEvent::RunFinished {
            run_id: run.id(),
            status,
        });
        status
    }

    fn run_step(&self, run: &mut RunContext, config: &StepConfig) -> Result<(), ExecutionError> {
        self.emit_event(ExecutionEvent::StepStarted {
            step: config.name.clone(),
            skipped: run.skipped_step_names().contains(&config.name),
        });

        let result = run.step(&config.name, |step| -> Result<(), ExecutionError> {
            if !step.is_enabled() {
                debug!(step = %config.name, "step skipped, nothing to do");
                return Ok(());
            }

            for input in &config.inputs {
                step.assert_input_exists(input)?;
            }

            if let Some(script) = &config.script {
                let mut runner = step
                    .delegate(|context| ScriptRunner::with_settings(context, self.settings.clone()));
                let required = config.required_params();
                runner.scope(|runner| runner.call(script, &required))?;
            }

            Ok(())
        });

        if let Some(step) = run.steps().last() {
            self.emit_event(ExecutionEvent::StepFinished {
                step: step.name().to_string(),
                status: step.status(),
                report: step.report().map(str::to_string),
            });
        }

        result
    }
}
