//! Core library for an edge-label Wave Function Collapse engine.
//! Builds 2D tile worlds in which every pair of adjacent cells shares an
//! edge label, resolving ambiguity by weighted random choice.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Handle-based engine surface over arenas.
pub mod api;
/// Fixed-capacity generational slot pool.
pub mod arena;
/// Spatially varying selection weights.
pub mod area;
/// Selection weights and weighted sampling.
pub mod distribution;
/// Entropy heuristics and lowest-entropy cell selection.
pub mod entropy;
/// Bitset helpers.
pub mod field;
/// Generic 2D grid.
pub mod grid;
/// Constraint propagation.
pub mod propagator;
/// The run loop with step caps and progress reporting.
pub mod runner;
/// Growable container with a FIFO cursor.
pub mod sequence;
/// Per-cell candidate sets.
pub mod superposition;
/// Tile identifiers, sides, edges and render tags.
pub mod tile;
/// The edge-compatibility tile table.
pub mod tileset;
/// Render variants layered over a tileset.
pub mod variants;
/// The world grid and its collapse loop.
pub mod world;

pub use crate::api::{Engine, HandleKind, Owned};
pub use crate::arena::{Arena, ArenaError, Handle};
pub use crate::area::DistributionArea;
pub use crate::distribution::{Distribution, DistributionBlend, DistributionError};
pub use crate::entropy::EntropyHeuristic;
pub use crate::field::TileField;
pub use crate::grid::Grid;
pub use crate::propagator::PropagationError;
pub use crate::runner::{run, WfcConfig};
pub use crate::sequence::Sequence;
pub use crate::superposition::{CellState, Superposition};
pub use crate::tile::{EdgeLabel, Edges, RenderTag, Side, TileId};
pub use crate::tileset::{TileSet, TileSetError, TilesetHeader};
pub use crate::variants::{VariantTileset, Variants};
pub use crate::world::{ResolvedGrid, TileBinding, World, WorldBuilder, WorldStatus};

/// Errors that can occur while building or driving a world.
///
/// Contradiction is deliberately absent: it is a [`WorldStatus`], not an
/// error.
#[derive(Error, Debug)]
pub enum WfcError {
    /// A tileset capacity or liveness error.
    #[error("TileSet error: {0}")]
    TileSet(#[from] TileSetError),
    /// A weight or sampling error.
    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),
    /// An arena ran out of slots.
    #[error("Arena error: {0}")]
    Arena(#[from] ArenaError),
    /// An error surfaced by propagation outside a world step.
    #[error("Propagation error: {0}")]
    Propagation(#[from] PropagationError),
    /// `collapse_to` was asked for a tile outside the candidate set.
    #[error("Tile {tile} is not a candidate for this cell")]
    NotACandidate { tile: usize },
    /// A freed (or never issued) handle was used for anything but `free`.
    #[error("Stale {kind} handle: {handle}")]
    StaleHandle { kind: HandleKind, handle: Handle },
    /// Tiles must be added with consecutive ids.
    #[error("Expected tile id {expected}, got {got}")]
    TileIdMismatch { expected: usize, got: usize },
    /// Worlds need a positive width and height.
    #[error("Invalid world dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A region must be non-empty and lie inside the world.
    #[error("Region {width}x{height} at ({x}, {y}) does not fit the world")]
    InvalidRegion {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    /// The tileset defines no tiles.
    #[error("Tileset has no tiles")]
    EmptyTileSet,
    /// The step cap was reached while the world was still running.
    #[error("Maximum iterations ({0}) reached")]
    MaxIterationsReached(u64),
    /// The run was stopped from outside (e.g. by a progress callback).
    #[error("WFC run interrupted")]
    Interrupted,
}

/// Information about the current state of a run, passed to progress callbacks.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProgressInfo {
    /// The number of cells holding exactly one tile.
    pub collapsed_cells: usize,
    /// The total number of cells in the grid.
    pub total_cells: usize,
    /// Time elapsed since the run started.
    pub elapsed_time: Duration,
    /// The number of steps completed so far.
    pub iterations: u64,
    /// World status after the latest step.
    pub status: WorldStatus,
}

/// Defines different boundary handling strategies for the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum BoundaryMode {
    /// Grid boundaries act as hard walls; cells past the edge are ignored.
    #[default]
    Clamped,
    /// Edges wrap around (toroidal topology).
    Periodic,
}
