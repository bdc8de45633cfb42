//! Spatially varying selection weights.
//!
//! A [`DistributionArea`] lays distributions out on a coarse lattice of
//! `region_size`-cell regions. Distribution `(u, v)` is centred on cell
//! `(u·region_size, v·region_size)` and reaches three quarters of a region
//! in each direction, so every location sees one to four distributions.
//! Where footprints overlap, their weights add.

use crate::distribution::{Distribution, DistributionBlend, DistributionError};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DistributionArea {
    region_size: usize,
    columns: usize,
    rows: usize,
    distributions: Vec<Arc<Distribution>>,
}

impl DistributionArea {
    /// Builds an area from `columns × rows` distributions in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`DistributionError::InvalidArea`] for a zero region size or
    /// lattice dimension, or when the distribution count does not match.
    pub fn new(
        region_size: usize,
        columns: usize,
        rows: usize,
        distributions: Vec<Arc<Distribution>>,
    ) -> Result<Self, DistributionError> {
        if region_size == 0 || columns == 0 || rows == 0 {
            return Err(DistributionError::InvalidArea(format!(
                "region size {region_size} over a {columns}x{rows} lattice"
            )));
        }
        if distributions.len() != columns * rows {
            return Err(DistributionError::InvalidArea(format!(
                "expected {} distributions for a {columns}x{rows} lattice, got {}",
                columns * rows,
                distributions.len()
            )));
        }
        Ok(Self {
            region_size,
            columns,
            rows,
            distributions,
        })
    }

    /// One distribution covering every location.
    pub fn single(distribution: Arc<Distribution>) -> Self {
        Self {
            region_size: usize::MAX,
            columns: 1,
            rows: 1,
            distributions: vec![distribution],
        }
    }

    pub const fn region_size(&self) -> usize {
        self.region_size
    }

    pub const fn columns(&self) -> usize {
        self.columns
    }

    pub const fn rows(&self) -> usize {
        self.rows
    }

    pub fn distribution(&self, u: usize, v: usize) -> Option<&Distribution> {
        if u >= self.columns || v >= self.rows {
            return None;
        }
        self.distributions.get(v * self.columns + u).map(Arc::as_ref)
    }

    /// Lattice indices whose footprint covers `coordinate` along one axis,
    /// clipped to `[0, len)`.
    fn span(&self, coordinate: usize, len: usize) -> std::ops::Range<usize> {
        let quarter = coordinate.saturating_mul(4) / self.region_size;
        let start = (quarter.saturating_add(1) / 4).min(len - 1);
        let end = (quarter.saturating_add(7) / 4).clamp(start + 1, len);
        start..end
    }

    /// The blend of distributions in force at cell `(x, y)`.
    pub fn select(&self, x: usize, y: usize) -> DistributionBlend<'_> {
        let columns = self.span(x, self.columns);
        let rows = self.span(y, self.rows);
        DistributionBlend::from_members(
            rows.flat_map(|v| columns.clone().map(move |u| (u, v)))
                .filter_map(|(u, v)| self.distribution(u, v)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileId;

    fn weighted(tile: usize) -> Arc<Distribution> {
        let mut weights = vec![0.0; 4];
        weights[tile] = 1.0;
        Arc::new(Distribution::from_weights(&weights).unwrap())
    }

    #[test]
    fn rejects_malformed_lattices() {
        assert!(matches!(
            DistributionArea::new(0, 1, 1, vec![weighted(0)]),
            Err(DistributionError::InvalidArea(_))
        ));
        assert!(matches!(
            DistributionArea::new(4, 2, 1, vec![weighted(0)]),
            Err(DistributionError::InvalidArea(_))
        ));
    }

    #[test]
    fn footprints_overlap_between_regions() {
        let area = DistributionArea::new(4, 2, 1, vec![weighted(0), weighted(1)]).unwrap();
        let members = |x| area.select(x, 0).members().count();
        assert_eq!(members(0), 1);
        assert_eq!(members(1), 2);
        assert_eq!(members(2), 2);
        assert_eq!(members(3), 1);
        // Past the last region the lattice is clipped, never empty.
        assert_eq!(members(40), 1);

        assert!(area.select(0, 0).weight(TileId(0)) > 0.0);
        assert_eq!(area.select(0, 0).weight(TileId(1)), 0.0);
        assert_eq!(area.select(3, 0).weight(TileId(0)), 0.0);
        assert!(area.select(3, 0).weight(TileId(1)) > 0.0);
    }

    #[test]
    fn two_by_two_lattice_blends_four() {
        let area = DistributionArea::new(
            4,
            2,
            2,
            vec![weighted(0), weighted(1), weighted(2), weighted(3)],
        )
        .unwrap();
        let blend = area.select(1, 1);
        assert_eq!(blend.members().count(), 4);
        assert!((0..4).all(|tile| blend.weight(TileId(tile)) > 0.0));
    }

    #[test]
    fn single_area_covers_everything() {
        let area = DistributionArea::single(weighted(2));
        for (x, y) in [(0, 0), (17, 3), (usize::MAX, 1)] {
            let blend = area.select(x, y);
            assert_eq!(blend.members().count(), 1);
            assert!(blend.weight(TileId(2)) > 0.0);
        }
    }
}
