//! Script runner settings

/// Configuration section holding the runner keys
pub const SECTION: &str = "SCRIPT";

/// Key naming the interpreter executable (`SCRIPT:interpreter`)
pub const INTERPRETER_KEY: &str = "SCRIPT:interpreter";

/// Key naming the directory scripts live in (`SCRIPT:code_root`)
pub const CODE_ROOT_KEY: &str = "SCRIPT:code_root";

pub const DEFAULT_INTERPRETER: &str = "Rscript";

/// Name of the implicit first parameter passed to every script
pub const DEFAULT_PATH_PARAMETER: &str = "pathToCode";

/// Settings for the script runner
///
/// Values set here take precedence over the run's configuration.
#[derive(Debug, Clone)]
pub struct ScriptSettings {
    /// Interpreter executable, a bare name looked up on `PATH` or a path.
    ///
    /// Falls back to `SCRIPT:interpreter`, then to `Rscript`.
    pub interpreter: Option<String>,

    /// Directory that script targets are relative to.
    ///
    /// Falls back to `SCRIPT:code_root`, which is then required.
    pub code_root: Option<String>,

    /// Name of the implicit code-root parameter
    pub path_parameter: String,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            interpreter: None,
            code_root: None,
            path_parameter: DEFAULT_PATH_PARAMETER.to_string(),
        }
    }
}

impl ScriptSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }

    pub fn with_code_root(mut self, code_root: impl Into<String>) -> Self {
        self.code_root = Some(code_root.into());
        self
    }

    pub fn with_path_parameter(mut self, name: impl Into<String>) -> Self {
        self.path_parameter = name.into();
        self
    }
}
