//! Pipeline file configuration from YAML

use crate::configuration::YamlConfiguration;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Top-level pipeline file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Run name, shown in the report
    pub name: String,

    /// Parameter configuration file, relative to the pipeline file
    #[serde(default)]
    pub parameters: Option<PathBuf>,

    /// Step names to skip
    #[serde(default)]
    pub skip: Vec<String>,

    /// Glob patterns audited for changes during the run
    #[serde(default)]
    pub monitor: Vec<String>,

    /// Steps, in execution order
    #[serde(default)]
    pub steps: Vec<StepConfig>,

    /// Directory of the pipeline file, when loaded from disk
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Step as declared in the pipeline file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,

    /// Script to run, relative to the code root
    #[serde(default)]
    pub script: Option<String>,

    /// Configuration keys passed to the script
    #[serde(default)]
    pub params: Vec<String>,

    /// Files or glob patterns that must exist before the step runs
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl StepConfig {
    pub fn required_params(&self) -> Vec<&str> {
        self.params.iter().map(String::as_str).collect()
    }
}

impl PipelineConfig {
    /// Load a pipeline file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline file {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid pipeline file {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse a pipeline from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name is empty");
        }

        let mut seen = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.name.trim().is_empty() {
                anyhow::bail!("Step #{} has an empty name", index + 1);
            }
            if !seen.insert(step.name.as_str()) {
                anyhow::bail!("Duplicate step name: {}", step.name);
            }
        }

        for name in &self.skip {
            if !seen.contains(name.as_str()) {
                anyhow::bail!("Skip list references non-existent step '{}'", name);
            }
        }

        Ok(())
    }

    pub fn step(&self, name: &str) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Parameter file path, resolved against the pipeline file's directory
    pub fn parameters_path(&self) -> Option<PathBuf> {
        let parameters = self.parameters.as_ref()?;
        match &self.base_dir {
            Some(base) if parameters.is_relative() => Some(base.join(parameters)),
            _ => Some(parameters.clone()),
        }
    }

    /// Load the parameter configuration, if the pipeline names one
    pub fn load_parameters(&self) -> Result<Option<YamlConfiguration>> {
        match self.parameters_path() {
            Some(path) => Ok(Some(YamlConfiguration::from_file(&path)?)),
            None => Ok(None),
        }
    }
}
