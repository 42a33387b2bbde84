//! CLI command definitions

use crate::execution::RunOptions;
use clap::Args;
use std::path::PathBuf;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Parameter file, replacing the one named by the pipeline
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Parameter overrides (SECTION:key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,

    /// Step to skip, in addition to the pipeline's skip list
    #[arg(long)]
    pub skip: Vec<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            parameters: self.params.clone(),
            overrides: self.param.clone(),
            skip: self.skip.clone(),
        }
    }
}

/// Validate a pipeline file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the parameters one step passes to its script
#[derive(Debug, Args, Clone)]
pub struct ParamsCommand {
    /// Path to pipeline YAML file
    #[arg(short, long)]
    pub file: String,

    /// Step name
    #[arg(long)]
    pub step: String,

    /// Parameter file, replacing the one named by the pipeline
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Parameter overrides (SECTION:key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub param: Vec<(String, String)>,
}

impl ParamsCommand {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            parameters: self.params.clone(),
            overrides: self.param.clone(),
            skip: Vec::new(),
        }
    }
}

/// Parse key=value pairs
///
/// Only the first `=` separates; `SECTION:key` names keep their colon.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}
