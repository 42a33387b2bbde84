//! Script interpreter runner - calls an interpreter as a subprocess

use super::settings::{ScriptSettings, CODE_ROOT_KEY, DEFAULT_INTERPRETER, INTERPRETER_KEY};
use super::{Runner, StepContext};
use crate::core::error::{ErrorKind, ExecutionError};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Number of trailing stderr lines kept in a process failure
const STDERR_TAIL_LINES: usize = 10;

/// Runs scripts through an interpreter with parameters taken from the run's
/// configuration
///
/// `call("echo.r", &["PERIOD:start"])` executes
/// `<interpreter> <code_root>/echo.r pathToCode=<code_root> PERIOD:start=<value>`
/// and blocks until the process exits.
#[derive(Debug)]
pub struct ScriptRunner<'a> {
    context: StepContext<'a>,
    settings: ScriptSettings,
    stdout: Option<String>,
}

impl<'a> ScriptRunner<'a> {
    /// Create a runner that takes all its settings from the configuration
    pub fn new(context: StepContext<'a>) -> Self {
        Self::with_settings(context, ScriptSettings::default())
    }

    pub fn with_settings(context: StepContext<'a>, settings: ScriptSettings) -> Self {
        Self {
            context,
            settings,
            stdout: None,
        }
    }

    /// Stdout of the last successful `call`
    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    /// Effective interpreter name or path
    pub fn interpreter(&self) -> Result<String, ExecutionError> {
        if let Some(interpreter) = &self.settings.interpreter {
            return Ok(interpreter.clone());
        }
        Ok(self
            .context
            .resolve_optional(INTERPRETER_KEY)?
            .unwrap_or_else(|| DEFAULT_INTERPRETER.to_string()))
    }

    /// Effective code root, as configured (not normalized)
    ///
    /// Falls back to the key named by the path parameter (`pathToCode` by
    /// default) when `SCRIPT:code_root` is not set.
    pub fn code_root(&self) -> Result<String, ExecutionError> {
        if let Some(code_root) = &self.settings.code_root {
            return Ok(code_root.clone());
        }
        if let Some(code_root) = self.context.resolve_optional(CODE_ROOT_KEY)? {
            return Ok(code_root);
        }
        self.context
            .resolve_optional(&self.settings.path_parameter)?
            .ok_or_else(|| {
                self.context
                    .fail(ErrorKind::MissingParameter(CODE_ROOT_KEY.to_string()))
            })
    }

    fn parameters(&self, code_root: &str, required: &[&str]) -> Result<Vec<String>, ExecutionError> {
        let mut params = Vec::with_capacity(required.len() + 1);
        params.push(format!("{}={}", self.settings.path_parameter, code_root));

        for key in required {
            let value = self.context.resolve(key)?;
            params.push(format!("{}={}", key, value));
        }

        Ok(params)
    }
}

impl<'a> Runner<'a> for ScriptRunner<'a> {
    fn context(&self) -> &StepContext<'a> {
        &self.context
    }

    fn get_parameters_as_map(&self, required: &[&str]) -> Result<Vec<String>, ExecutionError> {
        let code_root = self.code_root()?;
        self.parameters(&code_root, required)
    }

    /// Execute a script through the interpreter
    ///
    /// # Errors
    /// Returns `ExecutionError` if:
    /// - the code root is not a directory
    /// - the interpreter cannot be found
    /// - a required parameter cannot be resolved
    /// - the script does not exist under the code root
    /// - the process cannot be spawned or exits with a non-zero status
    ///
    /// Checks run in that order.
    fn call(&mut self, target: &str, required: &[&str]) -> Result<(), ExecutionError> {
        let code_root = self.code_root()?;
        let root = Path::new(&code_root);
        if !root.is_dir() {
            return Err(self
                .context
                .fail(ErrorKind::ScriptRootNotFound(code_root.clone())));
        }

        let interpreter = self.interpreter()?;
        let program = locate_program(&interpreter)
            .ok_or_else(|| self.context.fail(ErrorKind::InterpreterNotFound(interpreter.clone())))?;

        let params = self.parameters(&code_root, required)?;

        let script = root.join(target);
        if !script.is_file() {
            return Err(self
                .context
                .fail(ErrorKind::ScriptNotFound(script.display().to_string())));
        }

        info!(
            step = %self.context.step_name(),
            interpreter = %program.display(),
            script = %script.display(),
            "running script"
        );
        debug!(step = %self.context.step_name(), ?params, "script parameters");

        let output = Command::new(&program)
            .arg(&script)
            .args(&params)
            .output()
            .map_err(|source| {
                self.context.fail(ErrorKind::Spawn {
                    target: target.to_string(),
                    source,
                })
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            debug!(step = %self.context.step_name(), "{}", line);
        }

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(
                step = %self.context.step_name(),
                "{} exited with code {}: {}",
                target,
                code,
                stderr.trim()
            );
            return Err(self.context.fail(ErrorKind::ProcessFailed {
                target: target.to_string(),
                code,
                stderr: tail(&stderr, STDERR_TAIL_LINES),
            }));
        }

        for line in stderr.lines() {
            debug!(step = %self.context.step_name(), stderr = true, "{}", line);
        }
        debug!(
            step = %self.context.step_name(),
            "{} returned {} bytes of output",
            target,
            stdout.len()
        );
        self.stdout = Some(stdout);

        Ok(())
    }
}

/// Find an executable by path, or by name on `PATH`
pub fn locate_program(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let mut names = vec![name.to_string()];
    if cfg!(windows) && !name.ends_with(".exe") {
        names.push(format!("{}.exe", name));
    }

    let search_path = env::var_os("PATH")?;
    env::split_paths(&search_path)
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .find(|path| path.is_file())
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.trim().lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
