use crate::field::{self, TileField};
use crate::tile::TileId;
use bitvec::prelude::{BitSlice, Lsb0};
use log::trace;
use rand::Rng;
use thiserror::Error;

/// Errors raised by weighted sampling and weight configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The candidate set was empty or carried zero total weight.
    #[error("No valid candidate to sample from")]
    NoValidCandidate,
    /// Weights must be finite and non-negative.
    #[error("Invalid weight for tile {tile}: {weight}")]
    InvalidWeight { tile: usize, weight: f32 },
    /// The tile id is outside the distribution's range.
    #[error("Tile {tile} is outside the distribution (limit {limit})")]
    TileOutOfRange { tile: usize, limit: usize },
    /// A variant list must contain at least one render tag.
    #[error("Variant list is empty")]
    EmptyVariants,
    /// A distribution area needs a positive region size and exactly one
    /// distribution per region.
    #[error("Invalid distribution area: {0}")]
    InvalidArea(String),
}

/// Selection weights per tile id.
///
/// Unset tiles weigh 0 and are never drawn, even while they remain valid
/// candidates in a cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    weights: Vec<f32>,
    /// Tiles with a strictly positive weight.
    weighted_tiles: TileField,
}

impl Distribution {
    /// Creates an all-zero distribution over `tile_limit` ids (rounded up to
    /// a multiple of 8 to match tileset storage).
    pub fn new(tile_limit: usize) -> Self {
        let limit = tile_limit.div_ceil(8) * 8;
        Self {
            weights: vec![0.0; limit],
            weighted_tiles: field::empty_field(limit),
        }
    }

    /// Builds a distribution with `weights[i]` assigned to tile `i`.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::InvalidWeight`] for a negative or
    /// non-finite weight.
    pub fn from_weights(weights: &[f32]) -> Result<Self, DistributionError> {
        let mut distribution = Self::new(weights.len());
        for (tile, &weight) in weights.iter().enumerate() {
            distribution.set_weight(TileId(tile), weight)?;
        }
        Ok(distribution)
    }

    pub fn tile_limit(&self) -> usize {
        self.weights.len()
    }

    /// Sets the selection weight of `tile`.
    ///
    /// # Errors
    ///
    /// Fails for out-of-range tiles and negative or non-finite weights.
    pub fn set_weight(&mut self, tile: TileId, weight: f32) -> Result<(), DistributionError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(DistributionError::InvalidWeight {
                tile: tile.0,
                weight,
            });
        }
        let limit = self.weights.len();
        let slot = self
            .weights
            .get_mut(tile.0)
            .ok_or(DistributionError::TileOutOfRange { tile: tile.0, limit })?;
        *slot = weight;
        self.weighted_tiles.set(tile.0, weight > 0.0);
        Ok(())
    }

    /// Weight of `tile`; 0 for unset or out-of-range tiles.
    pub fn weight(&self, tile: TileId) -> f32 {
        self.weights.get(tile.0).copied().unwrap_or(0.0)
    }

    /// Tiles that can ever be drawn.
    pub const fn weighted_tiles(&self) -> &TileField {
        &self.weighted_tiles
    }

    /// Sum of weights over the candidate set.
    pub fn total_weight(&self, candidates: &BitSlice<usize, Lsb0>) -> f32 {
        DistributionBlend::single(self).total_weight(candidates)
    }

    /// Shannon entropy of the candidate set under these weights:
    /// `ln(Σw) - Σ(w·ln w) / Σw`. Zero-weight candidates contribute nothing.
    pub fn shannon_entropy(&self, candidates: &BitSlice<usize, Lsb0>) -> f32 {
        DistributionBlend::single(self).shannon_entropy(candidates)
    }

    /// Draws a tile from `candidates` proportionally to weight.
    ///
    /// The draw is uniform in `[0, total)`; the result is the first candidate,
    /// in ascending id order, whose cumulative weight exceeds it.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::NoValidCandidate`] if the set is empty or
    /// its total weight is 0.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        candidates: &BitSlice<usize, Lsb0>,
        rng: &mut R,
    ) -> Result<TileId, DistributionError> {
        DistributionBlend::single(self).sample(candidates, rng)
    }

    /// Draws a tile from `candidates` with equal probability, ignoring weights.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::NoValidCandidate`] if the set is empty.
    pub fn sample_uniform<R: Rng + ?Sized>(
        candidates: &BitSlice<usize, Lsb0>,
        rng: &mut R,
    ) -> Result<TileId, DistributionError> {
        let count = candidates.count_ones();
        if count == 0 {
            return Err(DistributionError::NoValidCandidate);
        }
        let pick = rng.gen_range(0..count);
        field::nth_one(candidates, pick)
            .map(TileId)
            .ok_or(DistributionError::NoValidCandidate)
    }
}

/// Most distributions that can overlap at one location.
pub const MAX_BLEND: usize = 4;

/// The weights in force at one location: a single [`Distribution`], or the
/// overlapping members of a [`DistributionArea`](crate::area::DistributionArea)
/// whose weights add up per tile.
///
/// Sums are accumulated in `f64`, so any mix of valid `f32` weights yields a
/// finite total.
#[derive(Debug, Clone, Copy)]
pub struct DistributionBlend<'a> {
    members: [Option<&'a Distribution>; MAX_BLEND],
}

impl<'a> DistributionBlend<'a> {
    pub const fn single(distribution: &'a Distribution) -> Self {
        Self {
            members: [Some(distribution), None, None, None],
        }
    }

    /// Blends up to [`MAX_BLEND`] distributions; extra members are ignored.
    pub fn from_members(members: impl IntoIterator<Item = &'a Distribution>) -> Self {
        let mut blend = Self {
            members: [None; MAX_BLEND],
        };
        for (slot, member) in blend.members.iter_mut().zip(members) {
            *slot = Some(member);
        }
        blend
    }

    pub fn members(&self) -> impl Iterator<Item = &'a Distribution> + '_ {
        self.members.iter().flatten().copied()
    }

    /// Combined weight of `tile` across every member.
    pub fn weight(&self, tile: TileId) -> f64 {
        self.members()
            .map(|member| f64::from(member.weight(tile)))
            .sum()
    }

    fn total(&self, candidates: &BitSlice<usize, Lsb0>) -> f64 {
        candidates
            .iter_ones()
            .map(|tile| self.weight(TileId(tile)))
            .sum()
    }

    /// Sum of blended weights over the candidate set, saturating at
    /// `f32::MAX`.
    pub fn total_weight(&self, candidates: &BitSlice<usize, Lsb0>) -> f32 {
        self.total(candidates).min(f64::from(f32::MAX)) as f32
    }

    /// Shannon entropy of the candidate set under the blended weights.
    pub fn shannon_entropy(&self, candidates: &BitSlice<usize, Lsb0>) -> f32 {
        let mut sum_of_weights = 0.0f64;
        let mut sum_of_weight_log_weight = 0.0f64;
        for tile in candidates.iter_ones() {
            let weight = self.weight(TileId(tile));
            if weight > 0.0 {
                sum_of_weights += weight;
                sum_of_weight_log_weight += weight * weight.ln();
            }
        }
        if sum_of_weights <= 0.0 {
            return 0.0;
        }
        (sum_of_weights.ln() - sum_of_weight_log_weight / sum_of_weights).max(0.0) as f32
    }

    /// Weighted draw over `candidates`; see [`Distribution::sample`].
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::NoValidCandidate`] if the set is empty or
    /// carries no usable weight.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        candidates: &BitSlice<usize, Lsb0>,
        rng: &mut R,
    ) -> Result<TileId, DistributionError> {
        let total = self.total(candidates);
        if !total.is_finite() || total <= 0.0 {
            return Err(DistributionError::NoValidCandidate);
        }
        let roll = rng.gen_range(0.0..total);
        let mut cumulative = 0.0f64;
        let mut last_weighted = None;
        for tile in candidates.iter_ones() {
            let weight = self.weight(TileId(tile));
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_weighted = Some(TileId(tile));
            if cumulative > roll {
                trace!("Sampled tile {} (roll {:.4} of {:.4})", tile, roll, total);
                return Ok(TileId(tile));
            }
        }
        // Rounding can leave the final cumulative sum a hair below the roll.
        last_weighted.ok_or(DistributionError::NoValidCandidate)
    }
}
