//! Render variants: tiles that share one adjacency profile but render in
//! several ways.
//!
//! A [`VariantTileset`] wraps a base [`TileSet`] and keeps a parallel map from
//! tile id to [`Variants`]. Adjacency only ever sees the base tile; the
//! variant is drawn after collapse and affects the render tag alone.

use crate::distribution::{Distribution, DistributionError};
use crate::field;
use crate::tile::{Edges, RenderTag, TileId};
use crate::tileset::{TileSet, TileSetError};
use rand::Rng;
use std::collections::HashMap;

/// Weighted render tags for one variant tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Variants {
    tags: Vec<RenderTag>,
    distribution: Distribution,
}

impl Variants {
    /// Builds a variant list from `(render tag, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Fails for an empty list or an invalid weight.
    pub fn new(entries: &[(RenderTag, f32)]) -> Result<Self, DistributionError> {
        if entries.is_empty() {
            return Err(DistributionError::EmptyVariants);
        }
        let weights: Vec<f32> = entries.iter().map(|&(_, w)| w).collect();
        Ok(Self {
            tags: entries.iter().map(|&(tag, _)| tag).collect(),
            distribution: Distribution::from_weights(&weights)?,
        })
    }

    pub fn tags(&self) -> &[RenderTag] {
        &self.tags
    }

    pub const fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    /// Draws a render tag. Falls back to the first tag when every weight is
    /// zero; variant choice never fails a collapse. `None` only for an empty
    /// list, which [`Variants::new`] refuses to build.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<RenderTag> {
        let all = field::prefix_field(self.distribution.tile_limit(), self.tags.len());
        self.distribution
            .sample(&all, rng)
            .ok()
            .and_then(|variant| self.tags.get(variant.0).copied())
            .or_else(|| self.tags.first().copied())
    }
}

/// A tileset whose tiles may each carry a set of render variants.
#[derive(Debug, Clone)]
pub struct VariantTileset {
    base: TileSet,
    variants: HashMap<TileId, Variants>,
}

impl VariantTileset {
    pub fn new(edge_limit: usize, tile_limit: usize) -> Self {
        Self::from_tileset(TileSet::new(edge_limit, tile_limit))
    }

    /// Wraps an existing tileset; none of its tiles has variants yet.
    pub fn from_tileset(base: TileSet) -> Self {
        Self {
            base,
            variants: HashMap::new(),
        }
    }

    pub const fn tileset(&self) -> &TileSet {
        &self.base
    }

    /// Adds a plain tile.
    ///
    /// # Errors
    ///
    /// Propagates the base tileset's capacity errors.
    pub fn add_tile(&mut self, render_tag: RenderTag, edges: Edges) -> Result<TileId, TileSetError> {
        self.base.add_tile(render_tag, edges)
    }

    /// Adds a tile whose render tag is drawn from `variants` on collapse.
    /// The base tile record carries render tag 0.
    ///
    /// # Errors
    ///
    /// Propagates the base tileset's capacity errors.
    pub fn add_variant_tile(&mut self, variants: Variants, edges: Edges) -> Result<TileId, TileSetError> {
        let tile = self.base.add_tile(RenderTag::default(), edges)?;
        self.variants.insert(tile, variants);
        Ok(tile)
    }

    pub fn variants(&self, tile: TileId) -> Option<&Variants> {
        self.variants.get(&tile)
    }

    pub fn is_variant_tile(&self, tile: TileId) -> bool {
        self.variants.contains_key(&tile)
    }

    /// Render tag for a collapsed `tile`: a sampled variant for variant
    /// tiles, the stored tag otherwise.
    pub fn resolve_render_tag<R: Rng + ?Sized>(&self, tile: TileId, rng: &mut R) -> Option<RenderTag> {
        match self.variants.get(&tile) {
            Some(variants) => variants.sample(rng),
            None => self.base.render_tag(tile),
        }
    }

    pub fn into_tileset(self) -> TileSet {
        self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn variant_tile_shares_base_record() {
        let mut tileset = VariantTileset::new(8, 8);
        let plain = tileset
            .add_tile(RenderTag::new(1, 0), Edges::uniform(0))
            .unwrap();
        let variants = Variants::new(&[(RenderTag::new(5, 0), 1.0), (RenderTag::new(6, 2), 1.0)]).unwrap();
        let flowers = tileset
            .add_variant_tile(variants, Edges::axis_symmetric(0, 1))
            .unwrap();

        assert_eq!(flowers, TileId(1));
        assert!(tileset.is_variant_tile(flowers));
        assert!(!tileset.is_variant_tile(plain));
        assert_eq!(tileset.tileset().render_tag(flowers), Some(RenderTag(0)));
        assert_eq!(tileset.tileset().edges(flowers), Some(Edges::new(0, 1, 0, 1)));

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let tag = tileset.resolve_render_tag(flowers, &mut rng).unwrap();
        assert!(tag == RenderTag::new(5, 0) || tag == RenderTag::new(6, 2));
        assert_eq!(
            tileset.resolve_render_tag(plain, &mut rng),
            Some(RenderTag::new(1, 0))
        );
    }

    #[test]
    fn weightless_variants_fall_back_to_first_tag() {
        let variants = Variants::new(&[(RenderTag(11), 0.0), (RenderTag(12), 0.0)]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(variants.sample(&mut rng), Some(RenderTag(11)));
        assert_eq!(Variants::new(&[]), Err(DistributionError::EmptyVariants));
    }
}
