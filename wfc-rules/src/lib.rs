//! Loads tileset definitions (tiles, edges, weights and render variants)
//! from rule files into `wfc-core` types.

use thiserror::Error;
use wfc_core::{DistributionError, TileSetError};

pub mod formats;
pub mod loader;
pub mod types;

pub use loader::load_from_file;
pub use types::{EdgeSpec, RuleFile, RuleSet, TileDefinition, VariantDefinition};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse rules format (e.g., RON/JSON): {0}")]
    ParseError(String),
    #[error("Invalid rule data: {0}")]
    InvalidData(String),
    #[error("Unsupported rule file format: {0}")]
    UnsupportedFormat(String),
    #[error("TileSet error: {0}")]
    TileSet(#[from] TileSetError),
}

impl From<DistributionError> for LoadError {
    fn from(error: DistributionError) -> Self {
        Self::InvalidData(error.to_string())
    }
}
