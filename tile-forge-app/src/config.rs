//! Command-line arguments and layered settings.
//!
//! Settings are resolved from, lowest priority first: built-in defaults, a
//! TOML file, `TILE_FORGE_*` environment variables, and finally any flags
//! given on the command line.

use crate::error::AppError;
use clap::{Parser, ValueEnum};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use wfc_core::{BoundaryMode, EntropyHeuristic};

/// Config file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "tile-forge.toml";

/// Prefix of environment variables that override the config file.
pub const ENV_PREFIX: &str = "TILE_FORGE_";

/// How the finished grid is written.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Space-separated tile ids, one line per row, top row first.
    #[default]
    Text,
    /// One record per cell with its tile name and render tag.
    Csv,
    /// The resolved grid as pretty-printed JSON.
    Json,
}

/// Log level for progress reports.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
}

/// Log level for everything outside progress reporting.
#[derive(ValueEnum, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GlobalLogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Command-line arguments for Tile Forge.
///
/// Every setting is optional here so that only flags actually given
/// override the lower layers.
#[derive(Parser, Serialize, Debug, Default)]
#[command(name = "tile-forge", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML settings file.
    #[arg(short, long, value_name = "FILE", env = "TILE_FORGE_CONFIG")]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Path to the rule file (`.ron` or `.json`) defining tiles and edges.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_file: Option<PathBuf>,

    /// Width of the generated world.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,

    /// Height of the generated world.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<usize>,

    /// Seed for the first attempt. Retries use seed + attempt.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// How cells on the border see their neighbours.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundary_mode: Option<BoundaryMode>,

    /// How the next cell to collapse is chosen.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heuristic: Option<EntropyHeuristic>,

    /// Give up on an attempt after this many steps.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,

    /// Extra attempts with a fresh seed after a contradiction.
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Report progress updates every specified interval (e.g., "1s", "500ms").
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "humantime_opt::serialize"
    )]
    pub report_progress_interval: Option<Duration>,

    /// Write the grid here instead of standard output.
    #[arg(short, long, value_name = "FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Format of the written grid.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<OutputFormat>,

    /// Log level for progress reports.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_log_level: Option<ProgressLogLevel>,

    /// Log level for everything else.
    #[arg(long, value_enum)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_log_level: Option<GlobalLogLevel>,
}

/// Fully resolved settings for one run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub rule_file: PathBuf,
    #[serde(default = "default_dimension")]
    pub width: usize,
    #[serde(default = "default_dimension")]
    pub height: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub boundary_mode: BoundaryMode,
    #[serde(default)]
    pub heuristic: EntropyHeuristic,
    #[serde(default)]
    pub max_steps: Option<u64>,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default, with = "humantime_opt")]
    pub report_progress_interval: Option<Duration>,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub progress_log_level: ProgressLogLevel,
    #[serde(default)]
    pub global_log_level: GlobalLogLevel,
}

const fn default_dimension() -> usize {
    16
}

const fn default_retries() -> u32 {
    10
}

impl AppConfig {
    /// Resolves settings for `cli` from the config file, the environment
    /// and the command line.
    pub fn load(cli: &Cli) -> Result<Self, AppError> {
        let config_file = match &cli.config {
            Some(path) if !path.exists() => {
                return Err(AppError::Config(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            Some(path) => path.clone(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };
        Self::from_figment(Self::figment(&config_file, cli))
    }

    /// Layers the providers without extracting, so callers can inspect them.
    pub fn figment(config_file: &Path, cli: &Cli) -> Figment {
        Figment::new()
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(cli))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, AppError> {
        let config: Self = figment
            .extract()
            .map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.width == 0 || self.height == 0 {
            return Err(AppError::Config(format!(
                "World dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.report_progress_interval == Some(Duration::ZERO) {
            return Err(AppError::Config(
                "Progress interval must be longer than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reads and writes optional durations as humantime strings ("1s", "250ms").
mod humantime_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&humantime::format_duration(*duration).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tile-forge").chain(args.iter().copied())).unwrap()
    }

    fn resolve(jail: &Jail, cli: &Cli) -> Result<AppConfig, figment::Error> {
        let file = jail.directory().join(DEFAULT_CONFIG_FILE);
        AppConfig::from_figment(AppConfig::figment(&file, cli)).map_err(|e| figment::Error::from(e.to_string()))
    }

    #[test]
    fn test_basic_args() {
        let args = cli(&["--rule-file", "rules.ron", "--width", "20", "--output-path", "out.txt"]);
        assert_eq!(args.rule_file, Some(PathBuf::from("rules.ron")));
        assert_eq!(args.width, Some(20));
        assert_eq!(args.height, None);
        assert_eq!(args.output_path, Some(PathBuf::from("out.txt")));
        assert_eq!(args.report_progress_interval, None);
    }

    #[test]
    fn test_progress_interval() {
        let args = cli(&["--rule-file", "r.ron", "--report-progress-interval", "2s"]);
        assert_eq!(args.report_progress_interval, Some(Duration::from_secs(2)));
        assert!(Cli::try_parse_from(["tile-forge", "--report-progress-interval", "soon"]).is_err());
    }

    #[test]
    fn test_enum_flags() {
        let args = cli(&[
            "--boundary-mode",
            "periodic",
            "--heuristic",
            "shannon",
            "--output-format",
            "csv",
        ]);
        assert_eq!(args.boundary_mode, Some(BoundaryMode::Periodic));
        assert_eq!(args.heuristic, Some(EntropyHeuristic::Shannon));
        assert_eq!(args.output_format, Some(OutputFormat::Csv));
        assert!(Cli::try_parse_from(["tile-forge", "--output-format", "png"]).is_err());
    }

    #[test]
    fn test_defaults_fill_unset_fields() {
        Jail::expect_with(|jail| {
            let config = resolve(jail, &cli(&["--rule-file", "r.ron"]))?;
            assert_eq!(config.rule_file, PathBuf::from("r.ron"));
            assert_eq!((config.width, config.height), (16, 16));
            assert_eq!(config.retries, 10);
            assert_eq!(config.seed, None);
            assert_eq!(config.boundary_mode, BoundaryMode::Clamped);
            assert_eq!(config.heuristic, EntropyHeuristic::WeightedCount);
            assert_eq!(config.output_format, OutputFormat::Text);
            Ok(())
        });
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                rule_file = "from_file.ron"
                width = 5
                height = 6
                seed = 1
                boundary_mode = "periodic"
                report_progress_interval = "250ms"
                "#,
            )?;
            jail.set_env("TILE_FORGE_HEIGHT", "7");
            jail.set_env("TILE_FORGE_SEED", "2");

            let config = resolve(jail, &cli(&["--seed", "3"]))?;
            assert_eq!(config.rule_file, PathBuf::from("from_file.ron"));
            assert_eq!(config.width, 5);
            assert_eq!(config.height, 7);
            assert_eq!(config.seed, Some(3));
            assert_eq!(config.boundary_mode, BoundaryMode::Periodic);
            assert_eq!(config.report_progress_interval, Some(Duration::from_millis(250)));
            Ok(())
        });
    }

    #[test]
    fn test_missing_rule_file_is_an_error() {
        Jail::expect_with(|jail| {
            assert!(resolve(jail, &cli(&["--width", "4"])).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_zero_dimension_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TILE_FORGE_WIDTH", "0");
            let err = resolve(jail, &cli(&["--rule-file", "r.ron"])).unwrap_err();
            assert!(err.to_string().contains("positive"));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let args = cli(&["--config", "/definitely/not/here.toml", "--rule-file", "r.ron"]);
        assert!(matches!(AppConfig::load(&args), Err(AppError::Config(_))));
    }
}
