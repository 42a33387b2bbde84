//! Subprocess delegation from inside a step

pub mod script;
pub mod settings;

pub use script::ScriptRunner;
pub use settings::ScriptSettings;

use crate::configuration::{ConfigError, ConfigurationProvider};
use crate::core::error::{ErrorKind, ExecutionError};
use std::fmt;
use tracing::{debug, error};

/// Execution context handed to a runner by `StepGuard::delegate`
///
/// Gives the runner read access to the run's configuration and the name of
/// the step its failures are attributed to. It borrows from the open step
/// scope and cannot outlive it.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    run_name: &'a str,
    step_name: &'a str,
    configuration: Option<&'a dyn ConfigurationProvider>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        run_name: &'a str,
        step_name: &'a str,
        configuration: Option<&'a dyn ConfigurationProvider>,
    ) -> Self {
        Self {
            run_name,
            step_name,
            configuration,
        }
    }

    pub fn run_name(&self) -> &'a str {
        self.run_name
    }

    pub fn step_name(&self) -> &'a str {
        self.step_name
    }

    pub fn configuration(&self) -> Option<&'a dyn ConfigurationProvider> {
        self.configuration
    }

    /// Resolve a required parameter
    ///
    /// Fails with "Missing parameter" when the key is absent or no
    /// configuration is attached to the run.
    pub fn resolve(&self, key: &str) -> Result<String, ExecutionError> {
        self.resolve_optional(key)?
            .ok_or_else(|| self.fail(ErrorKind::MissingParameter(key.to_string())))
    }

    /// Resolve a parameter that may legitimately be absent
    pub fn resolve_optional(&self, key: &str) -> Result<Option<String>, ExecutionError> {
        let Some(configuration) = self.configuration else {
            return Ok(None);
        };

        match configuration.resolve(key) {
            Ok(value) => {
                debug!(step = %self.step_name, key, "parameter resolved");
                Ok(Some(value))
            }
            Err(ConfigError::Missing(_)) => Ok(None),
            Err(e) => Err(self.fail(ErrorKind::Configuration(e.to_string()))),
        }
    }

    /// Attribute a failure to this step
    pub fn fail(&self, kind: ErrorKind) -> ExecutionError {
        ExecutionError::new(self.step_name, kind)
    }
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("run_name", &self.run_name)
            .field("step_name", &self.step_name)
            .field(
                "configuration",
                &self.configuration.map(|c| c.describe()),
            )
            .finish()
    }
}

/// Contract for objects a step delegates external work to
pub trait Runner<'a> {
    /// The step context this runner was built from
    fn context(&self) -> &StepContext<'a>;

    /// Resolve `required` against the configuration, then run `target`
    fn call(&mut self, target: &str, required: &[&str]) -> Result<(), ExecutionError>;

    /// The `key=value` arguments `call` would pass, without running anything
    fn get_parameters_as_map(&self, required: &[&str]) -> Result<Vec<String>, ExecutionError>;

    /// Run `body` inside the runner's scope
    ///
    /// A failure is logged with step attribution and returned unchanged.
    fn scope<T, F>(&mut self, body: F) -> Result<T, ExecutionError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, ExecutionError>,
    {
        let context = *self.context();
        debug!(run = %context.run_name(), step = %context.step_name(), "runner scope entered");

        let result = body(self);
        if let Err(e) = &result {
            error!(
                run = %context.run_name(),
                step = %context.step_name(),
                error = %e,
                details = ?e,
                "runner failed"
            );
        }
        result
    }
}
