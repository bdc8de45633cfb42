use crate::field::{self, TileField};
use crate::grid::Grid;
use crate::sequence::Sequence;
use crate::superposition::Superposition;
use crate::tile::Side;
use crate::tileset::TileSet;
use crate::BoundaryMode;
use log::trace;
use thiserror::Error;

/// Errors that can occur during the constraint propagation phase.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PropagationError {
    /// A cell's candidate set became empty; no tile satisfies its neighbours.
    /// Contains the (x, y) coordinates of the contradictory cell.
    #[error("Contradiction detected during propagation at ({0}, {1})")]
    Contradiction(usize, usize),
}

/// Breadth-first arc-consistency propagation over a 4-connected grid.
///
/// The queue and the scratch fields are allocated once per world and reused
/// by every step.
#[derive(Debug, Clone)]
pub struct Propagator {
    boundary_mode: BoundaryMode,
    queue: Sequence<usize>,
    labels: TileField,
    allowed: TileField,
}

impl Propagator {
    pub fn new(tileset: &TileSet, cell_count: usize, boundary_mode: BoundaryMode) -> Self {
        Self {
            boundary_mode,
            queue: Sequence::with_capacity(cell_count),
            labels: field::empty_field(tileset.edge_limit()),
            allowed: field::empty_field(tileset.tile_limit()),
        }
    }

    pub const fn boundary_mode(&self) -> BoundaryMode {
        self.boundary_mode
    }

    /// Propagates constraints outward from `updated` cells (row-major
    /// indices), restricting every neighbour to the tiles compatible with at
    /// least one candidate of the cell it was reached from.
    ///
    /// Cells are visited in enqueue order. A neighbour is re-enqueued only
    /// when its set actually shrank.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError::Contradiction`] for the first cell whose set
    /// becomes empty. Propagation stops there; the rest of the queue is
    /// discarded.
    pub fn propagate(
        &mut self,
        cells: &mut Grid<Superposition>,
        tileset: &TileSet,
        updated: impl IntoIterator<Item = usize>,
    ) -> Result<(), PropagationError> {
        self.queue.clear();
        for index in updated {
            self.queue.push(index);
        }

        while let Some(source) = self.queue.pop_front() {
            for side in Side::ALL {
                let Some(target) = cells.neighbour(source, side, self.boundary_mode) else {
                    continue;
                };
                tileset.allowed_neighbours_into(
                    cells.data[source].candidates(),
                    side,
                    &mut self.labels,
                    &mut self.allowed,
                );
                let neighbour = &mut cells.data[target];
                if !neighbour.restrict(&self.allowed) {
                    continue;
                }
                if neighbour.is_contradicted() {
                    let (x, y) = cells.coords(target);
                    trace!("Cell ({}, {}) emptied from {:?} side of cell {}", x, y, side, source);
                    self.queue.clear();
                    return Err(PropagationError::Contradiction(x, y));
                }
                trace!(
                    "Restricted cell {} to {} candidates",
                    target,
                    neighbour.count()
                );
                self.queue.push(target);
            }
        }
        Ok(())
    }
}
