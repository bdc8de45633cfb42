//! Runs generation attempts until one produces a consistent world.

use crate::{config::AppConfig, error::AppError, progress::ProgressReporter};
use log::{info, warn};
use std::{
    sync::{Arc, Mutex},
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use wfc_core::{
    runner::{self, ProgressCallback, WfcConfig},
    Distribution, ProgressInfo, ResolvedGrid, VariantTileset, WfcError, World, WorldStatus,
};
use wfc_rules::RuleSet;

/// A finished world and how it was found.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub grid: ResolvedGrid,
    /// Seed of the attempt that succeeded.
    pub seed: u64,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    pub steps: u64,
}

/// Seed used when none is configured. Logged so the run can be repeated.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos() as u64)
}

/// Seed of attempt `attempt` (zero-based) for a run starting at `base`.
pub const fn attempt_seed(base: u64, attempt: u32) -> u64 {
    base.wrapping_add(attempt as u64)
}

fn progress_callback(reporter: &Arc<Mutex<dyn ProgressReporter>>) -> ProgressCallback {
    let reporter = Arc::clone(reporter);
    Box::new(move |info: ProgressInfo| {
        let mut guard = reporter.lock().map_err(|_| WfcError::Interrupted)?;
        guard.report(&info).map_err(|e| {
            log::error!("Progress reporter failed: {}", e);
            WfcError::Interrupted
        })
    })
}

/// Builds worlds from `rules` until one finishes or the retries run out.
///
/// Attempt `n` uses seed `base + n`, where `base` is the configured seed or
/// a clock-derived one.
pub fn run_generation(
    config: &AppConfig,
    rules: &RuleSet,
    reporter: Option<Arc<Mutex<dyn ProgressReporter>>>,
) -> Result<GenerationOutcome, AppError> {
    let base_seed = config.seed.unwrap_or_else(|| {
        let seed = clock_seed();
        info!("No seed configured, using {}", seed);
        seed
    });
    let tileset: Arc<VariantTileset> = Arc::new(rules.tileset.clone());
    let distribution: Arc<Distribution> = Arc::new(rules.distribution.clone());
    let attempts = config.retries.saturating_add(1);

    for attempt in 0..attempts {
        let seed = attempt_seed(base_seed, attempt);
        let mut world = World::builder(Arc::clone(&tileset))
            .distribution(Arc::clone(&distribution))
            .size(config.width, config.height)
            .seed(seed)
            .boundary_mode(config.boundary_mode)
            .heuristic(config.heuristic)
            .build()?;

        let mut builder = WfcConfig::builder();
        if let Some(limit) = config.max_steps {
            builder = builder.max_iterations(limit);
        }
        if let Some(reporter) = &reporter {
            builder = builder.progress_callback(progress_callback(reporter));
        }
        let wfc_config = builder.build();

        let start = Instant::now();
        let status = match runner::run(&mut world, &wfc_config) {
            Ok(status) => status,
            Err(e) => {
                if let Some(reporter) = &reporter {
                    if let Ok(mut guard) = reporter.lock() {
                        guard.fail(&e)?;
                    }
                }
                return Err(e.into());
            }
        };

        match status {
            WorldStatus::Done => {
                let grid = world.resolved().ok_or_else(|| {
                    AppError::Output("Finished world has unresolved cells".to_string())
                })?;
                if let Some(reporter) = &reporter {
                    if let Ok(mut guard) = reporter.lock() {
                        guard.finish(&ProgressInfo {
                            collapsed_cells: world.collapsed_count(),
                            total_cells: world.cell_count(),
                            elapsed_time: start.elapsed(),
                            iterations: world.steps(),
                            status,
                        })?;
                    }
                }
                info!(
                    "Generated {}x{} world with seed {} after {} attempt(s)",
                    config.width,
                    config.height,
                    seed,
                    attempt + 1
                );
                return Ok(GenerationOutcome {
                    grid,
                    seed,
                    attempts: attempt + 1,
                    steps: world.steps(),
                });
            }
            WorldStatus::Failed if attempt + 1 < attempts => {
                let next_seed = attempt_seed(base_seed, attempt + 1);
                match &reporter {
                    Some(reporter) => {
                        if let Ok(mut guard) = reporter.lock() {
                            guard.retry(attempt, next_seed)?;
                        }
                    }
                    None => warn!(
                        "Attempt {} with seed {} hit a contradiction, retrying with seed {}",
                        attempt, seed, next_seed
                    ),
                }
            }
            WorldStatus::Failed => {
                warn!("Attempt {} with seed {} hit a contradiction", attempt, seed);
            }
            WorldStatus::Running => {
                return Err(AppError::Output(
                    "Run returned while the world was still running".to_string(),
                ));
            }
        }
    }

    Err(AppError::Contradiction {
        attempts,
        seed: base_seed,
    })
}
