use anyhow::{Context, Result};
use batchstep::cli::commands::{ParamsCommand, RunCommand, ValidateCommand};
use batchstep::cli::output::*;
use batchstep::cli::{Cli, Command};
use batchstep::core::{PipelineConfig, RunStatus};
use batchstep::execution::{prepare_run, ExecutionEngine};
use batchstep::logging::init_logging;
use batchstep::runner::{Runner, ScriptRunner, StepContext};
use tracing::warn;

fn main() -> Result<()> {
    let cli = Cli::from_args();

    init_logging(cli.verbose)?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd)?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::Params(cmd) => show_params(cmd)?,
    }

    Ok(())
}

fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;

    if !cmd.json {
        println!("{} Loaded pipeline: {}", INFO, style(&config.name).bold());
        for (key, value) in &cmd.param {
            println!(
                "{} Parameter override: {} = {}",
                INFO,
                style(key).cyan(),
                style(value).dim()
            );
        }
    }
    for name in &cmd.skip {
        if config.step(name).is_none() {
            warn!(step = %name, "skip entry names no step in {}", config.name);
        }
    }

    let mut run = prepare_run(&config, &cmd.run_options())?;
    let mut engine = ExecutionEngine::new();

    if cmd.json {
        // keep stdout for the JSON document
        run = run.with_output(std::io::stderr());
    } else {
        engine.add_event_handler(|event| println!("{}", format_execution_event(event)));
        println!();
    }

    let status = engine.execute(&config, &mut run);
    let summary = run.summary();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\n{}", format_run_summary(&summary));
    }

    if status == RunStatus::Aborted {
        std::process::exit(1);
    }

    Ok(())
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Pipeline file is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Steps: {}", style(config.steps.len()).cyan());
            println!("  Skipped: {}", style(config.skip.len()).cyan());
            if let Some(path) = config.parameters_path() {
                println!("  Parameters: {}", style(path.display()).dim());
            }

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

fn show_params(cmd: &ParamsCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    let step = config
        .step(&cmd.step)
        .with_context(|| format!("No step named {} in {}", cmd.step, config.name))?;

    if step.script.is_none() {
        println!("{} Step {} runs no script", WARN, style(&step.name).bold());
    }

    let run = prepare_run(&config, &cmd.run_options())?;
    let runner = ScriptRunner::new(StepContext::new(run.name(), &step.name, run.configuration()));
    let params = runner.get_parameters_as_map(&step.required_params())?;

    println!("{} Parameters for {}:", INFO, style(&step.name).bold());
    for param in &params {
        println!("  {}", param);
    }

    Ok(())
}
