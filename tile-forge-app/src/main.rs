// tile-forge-app/src/main.rs

use crate::config::{AppConfig, Cli};
use crate::error::AppError;
use crate::progress::{LogProgressReporter, ProgressReporter};
use crate::setup::execution::run_generation;
use crate::{logging, output};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::{Arc, Mutex};
use wfc_rules::loader::load_from_file;

/// Parses the command line and runs the application.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli)?;
    logging::init_logger(&config);
    run(&config)
}

/// Loads the rules named in `config`, generates a world and writes it out.
pub fn run(config: &AppConfig) -> Result<()> {
    log::info!("Tile Forge App Starting");
    log::debug!("Loaded Config: {:?}", config);

    log::info!("Loading rules from: {:?}", config.rule_file);
    let rules = load_from_file(&config.rule_file)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to load rules from {:?}", config.rule_file))?;
    log::info!("Rules loaded: {} tiles", rules.tile_count());

    let reporter: Option<Arc<Mutex<dyn ProgressReporter>>> =
        config.report_progress_interval.map(|interval| {
            Arc::new(Mutex::new(LogProgressReporter::new(
                interval,
                config.progress_log_level,
            ))) as Arc<Mutex<dyn ProgressReporter>>
        });

    let outcome = run_generation(config, &rules, reporter)?;
    log::info!(
        "World finished in {} steps (seed {}, {} attempt(s))",
        outcome.steps,
        outcome.seed,
        outcome.attempts
    );

    output::save_grid(
        &outcome.grid,
        &rules,
        config.output_format,
        config.output_path.as_deref(),
    )?;

    log::info!("Tile Forge App Finished.");
    Ok(())
}
