//! Logging setup for the application.

use crate::config::{AppConfig, GlobalLogLevel, ProgressLogLevel};
use env_logger::{Builder, Env};
use log::LevelFilter;

impl From<ProgressLogLevel> for LevelFilter {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

impl From<GlobalLogLevel> for LevelFilter {
    fn from(level: GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

/// Builds a logger for the configured levels.
///
/// The global level applies to every module except `progress`, which gets
/// its own level. Directives in `RUST_LOG` are parsed last and win.
pub fn logger_builder(config: &AppConfig) -> Builder {
    let mut builder = Builder::new();
    builder.filter_level(config.global_log_level.into());
    builder.filter_module("tile_forge_app::progress", config.progress_log_level.into());
    builder.parse_env(Env::default());
    builder
}

/// Initializes the global logger. Later calls are ignored.
pub fn init_logger(config: &AppConfig) {
    if logger_builder(config).try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        config.global_log_level,
        config.progress_log_level
    );
}
