use crate::distribution::{Distribution, DistributionBlend};
use crate::entropy::EntropyHeuristic;
use crate::field::{self, TileField};
use crate::tile::TileId;
use crate::WfcError;

/// Resolution state of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    /// More than one candidate remains.
    Open,
    /// Exactly one candidate remains.
    Collapsed,
    /// No candidate remains.
    Contradicted,
}

/// The set of tile ids still possible for one grid cell.
///
/// The set only ever shrinks. Entropy is cached and recomputed on the first
/// query after a mutation; the cache assumes every query for a given cell
/// passes the same weights and heuristic, which the world guarantees.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    candidates: TileField,
    entropy: Option<f32>,
}

impl Superposition {
    /// A superposition holding exactly `candidates`.
    pub const fn new(candidates: TileField) -> Self {
        Self {
            candidates,
            entropy: None,
        }
    }

    pub const fn candidates(&self) -> &TileField {
        &self.candidates
    }

    pub fn count(&self) -> usize {
        self.candidates.count_ones()
    }

    pub fn contains(&self, tile: TileId) -> bool {
        self.candidates.get(tile.0).is_some_and(|bit| *bit)
    }

    /// Intersects the candidates with `allowed`; returns whether anything was
    /// removed. An empty result leaves the cell contradicted.
    pub fn restrict(&mut self, allowed: &TileField) -> bool {
        let changed = field::intersect_into(&mut self.candidates, allowed);
        if changed {
            self.entropy = None;
        }
        changed
    }

    /// Commits the cell to `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`WfcError::NotACandidate`] if `tile` is not in the current
    /// set; the cell is left untouched.
    pub fn collapse_to(&mut self, tile: TileId) -> Result<(), WfcError> {
        if !self.contains(tile) {
            return Err(WfcError::NotACandidate { tile: tile.0 });
        }
        field::clear(&mut self.candidates);
        self.candidates.set(tile.0, true);
        self.entropy = None;
        Ok(())
    }

    /// Cached entropy of the remaining candidates.
    pub fn entropy(&mut self, distribution: Option<&Distribution>, heuristic: EntropyHeuristic) -> f32 {
        self.entropy_with(distribution.map(DistributionBlend::single), heuristic)
    }

    /// Cached entropy under the weights in force at this cell.
    pub fn entropy_with(&mut self, weights: Option<DistributionBlend<'_>>, heuristic: EntropyHeuristic) -> f32 {
        if let Some(cached) = self.entropy {
            return cached;
        }
        let value = heuristic.measure_blend(&self.candidates, weights);
        self.entropy = Some(value);
        value
    }

    pub fn is_collapsed(&self) -> bool {
        self.count() == 1
    }

    pub fn is_contradicted(&self) -> bool {
        self.candidates.not_any()
    }

    pub fn state(&self) -> CellState {
        match self.count() {
            0 => CellState::Contradicted,
            1 => CellState::Collapsed,
            _ => CellState::Open,
        }
    }

    /// The single remaining tile, if collapsed.
    pub fn collapsed_tile(&self) -> Option<TileId> {
        if self.is_collapsed() {
            self.candidates.first_one().map(TileId)
        } else {
            None
        }
    }
}
