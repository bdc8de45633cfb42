use crate::distribution::{Distribution, DistributionBlend};
use crate::grid::Grid;
use crate::superposition::{CellState, Superposition};
use bitvec::prelude::{BitSlice, Lsb0};
use float_ord::FloatOrd;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a cell's uncertainty is scored when picking the next cell to collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum EntropyHeuristic {
    /// Sum of candidate weights, or the candidate count without weights.
    #[default]
    WeightedCount,
    /// Shannon entropy of the candidate weights:
    /// `H = ln(Σw) - Σ(w·ln w) / Σw`.
    Shannon,
}

impl EntropyHeuristic {
    pub fn measure(self, candidates: &BitSlice<usize, Lsb0>, distribution: Option<&Distribution>) -> f32 {
        self.measure_blend(candidates, distribution.map(DistributionBlend::single))
    }

    /// Scores `candidates` under the weights in force at one location.
    pub fn measure_blend(self, candidates: &BitSlice<usize, Lsb0>, weights: Option<DistributionBlend<'_>>) -> f32 {
        match (self, weights) {
            (Self::WeightedCount, Some(blend)) => blend.total_weight(candidates),
            (Self::WeightedCount, None) => candidates.count_ones() as f32,
            (Self::Shannon, Some(blend)) => blend.shannon_entropy(candidates),
            (Self::Shannon, None) => {
                let count = candidates.count_ones();
                if count == 0 {
                    0.0
                } else {
                    (count as f32).ln()
                }
            }
        }
    }
}

/// Finds the open cell with the lowest entropy.
///
/// Ties go to the lowest row-major index. Returns `None` when no cell is
/// open. Entropies are computed through each cell's cache.
pub fn select_lowest_entropy_cell(
    cells: &mut Grid<Superposition>,
    distribution: Option<&Distribution>,
    heuristic: EntropyHeuristic,
) -> Option<usize> {
    select_lowest_entropy_cell_with(cells, heuristic, |_| {
        distribution.map(DistributionBlend::single)
    })
}

/// Like [`select_lowest_entropy_cell`], with the weights of each cell looked
/// up by row-major index.
pub fn select_lowest_entropy_cell_with<'a>(
    cells: &mut Grid<Superposition>,
    heuristic: EntropyHeuristic,
    weights_at: impl Fn(usize) -> Option<DistributionBlend<'a>>,
) -> Option<usize> {
    cells
        .data
        .iter_mut()
        .enumerate()
        .filter(|(_, cell)| cell.state() == CellState::Open)
        .map(|(index, cell)| {
            let entropy = cell.entropy_with(weights_at(index), heuristic);
            (index, FloatOrd(entropy))
        })
        // min_by_key keeps the first of equal minima, i.e. the lowest index.
        .min_by_key(|&(_, entropy)| entropy)
        .map(|(index, _)| index)
}
