use crate::world::{World, WorldStatus};
use crate::{ProgressInfo, WfcError};
use log::{debug, info, warn};
use std::time::Instant;

/// Alias for the progress callback function type.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) -> Result<(), WfcError> + Send + Sync>;

/// Configuration options for the WFC runner.
#[derive(Default)]
pub struct WfcConfig {
    /// Cap on `step` calls; `None` runs until the world is terminal.
    pub max_iterations: Option<u64>,
    pub progress_callback: Option<ProgressCallback>,
}

impl WfcConfig {
    /// Creates a new builder for `WfcConfig`.
    pub fn builder() -> WfcConfigBuilder {
        WfcConfigBuilder::default()
    }
}

impl std::fmt::Debug for WfcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WfcConfig")
            .field("max_iterations", &self.max_iterations)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

/// Builder for `WfcConfig`.
#[derive(Default)]
pub struct WfcConfigBuilder {
    max_iterations: Option<u64>,
    progress_callback: Option<ProgressCallback>,
}

impl WfcConfigBuilder {
    /// Sets the maximum number of steps allowed.
    pub fn max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    /// Sets the progress callback function, invoked after every step.
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Builds the `WfcConfig` instance.
    pub fn build(self) -> WfcConfig {
        WfcConfig {
            max_iterations: self.max_iterations,
            progress_callback: self.progress_callback,
        }
    }
}

/// Drives `world` to a terminal status.
///
/// A contradiction is not an error: the world simply ends `Failed` and that
/// status is returned. Callers that want another attempt build a new world
/// with a different seed.
///
/// # Errors
///
/// * [`WfcError::MaxIterationsReached`] if the world is still running after
///   `max_iterations` steps. The world is left as is and may be stepped further.
/// * Any error returned by the progress callback, which aborts the run.
pub fn run(world: &mut World, config: &WfcConfig) -> Result<WorldStatus, WfcError> {
    info!(
        "Starting WFC run on {}x{} world (seed {})...",
        world.width(),
        world.height(),
        world.seed()
    );
    let start_time = Instant::now();
    let total_cells = world.cell_count();

    loop {
        let status = world.status();
        if status != WorldStatus::Running {
            match status {
                WorldStatus::Done => info!(
                    "WFC run finished in {:?} after {} steps.",
                    start_time.elapsed(),
                    world.steps()
                ),
                _ => warn!(
                    "WFC run failed after {} steps ({}/{} cells collapsed).",
                    world.steps(),
                    world.collapsed_count(),
                    total_cells
                ),
            }
            return Ok(status);
        }

        if let Some(limit) = config.max_iterations {
            if world.steps() >= limit {
                warn!("Maximum iterations ({}) reached with world still running.", limit);
                return Err(WfcError::MaxIterationsReached(limit));
            }
        }

        let status = world.step();
        if let Some(ref callback) = config.progress_callback {
            callback(ProgressInfo {
                collapsed_cells: world.collapsed_count(),
                total_cells,
                elapsed_time: start_time.elapsed(),
                iterations: world.steps(),
                status,
            })?;
        }
        debug!("Step {} -> {:?}", world.steps(), status);
    }
}
