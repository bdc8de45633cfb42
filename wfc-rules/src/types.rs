//! Rule file structures and their conversion to core types.

use crate::LoadError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wfc_core::{Distribution, EdgeLabel, Edges, RenderTag, TileId, VariantTileset, Variants};

const fn default_weight() -> f32 {
    1.0
}

/// How a tile's four edge labels are written in a rule file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSpec {
    /// The same label on every side.
    Uniform(EdgeLabel),
    /// One label for left/right, one for top/bottom.
    Axis {
        horizontal: EdgeLabel,
        vertical: EdgeLabel,
    },
    /// Every side spelled out.
    Sides {
        right: EdgeLabel,
        top: EdgeLabel,
        left: EdgeLabel,
        bottom: EdgeLabel,
    },
}

impl EdgeSpec {
    pub const fn to_edges(self) -> Edges {
        match self {
            Self::Uniform(edge) => Edges::uniform(edge),
            Self::Axis {
                horizontal,
                vertical,
            } => Edges::axis_symmetric(horizontal, vertical),
            Self::Sides {
                right,
                top,
                left,
                bottom,
            } => Edges::new(right, top, left, bottom),
        }
    }
}

/// One render variant of a tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantDefinition {
    pub texture: u16,
    #[serde(default)]
    pub transformation: u16,
    #[serde(default = "default_weight")]
    pub weight: f32,
}

/// One tile entry of a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Unique name, used in logs and output legends.
    pub name: String,
    #[serde(default)]
    pub texture: u16,
    #[serde(default)]
    pub transformation: u16,
    pub edges: EdgeSpec,
    /// Selection weight. A weight of 0 keeps the tile valid but never drawn.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Render variants sharing this tile's edges. When present, the tile's
    /// own texture is ignored.
    #[serde(default)]
    pub variants: Vec<VariantDefinition>,
}

/// The top-level structure of a rule file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleFile {
    /// Exclusive upper bound for edge labels. 0 (the default) sizes the
    /// table to the widest label used.
    #[serde(default)]
    pub edge_limit: usize,
    /// Capacity of the tile table. 0 (the default) sizes it to the tiles
    /// defined.
    #[serde(default)]
    pub tile_limit: usize,
    pub tiles: Vec<TileDefinition>,
}

/// A loaded, validated rule set ready to build worlds from.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub tileset: VariantTileset,
    pub distribution: Distribution,
    /// Tile names indexed by tile id.
    pub names: Vec<String>,
}

impl RuleSet {
    pub fn tile_id(&self, name: &str) -> Option<TileId> {
        self.names.iter().position(|n| n == name).map(TileId)
    }

    pub fn name(&self, tile: TileId) -> Option<&str> {
        self.names.get(tile.0).map(String::as_str)
    }

    pub fn tile_count(&self) -> usize {
        self.names.len()
    }
}

impl RuleFile {
    /// Validates the definitions and builds the core tileset and weights.
    ///
    /// # Errors
    ///
    /// * `LoadError::InvalidData` for an empty tile list, duplicate names or
    ///   invalid weights.
    /// * `LoadError::TileSet` when tiles or labels exceed the limits.
    pub fn into_rule_set(self) -> Result<RuleSet, LoadError> {
        if self.tiles.is_empty() {
            return Err(LoadError::InvalidData("No tiles defined.".to_owned()));
        }
        let mut seen = HashMap::new();
        for (index, tile) in self.tiles.iter().enumerate() {
            if seen.insert(tile.name.as_str(), index).is_some() {
                return Err(LoadError::InvalidData(format!(
                    "Duplicate tile name: {}",
                    tile.name
                )));
            }
        }

        let widest = self
            .tiles
            .iter()
            .map(|tile| tile.edges.to_edges().max_label())
            .max()
            .unwrap_or(0);
        let edge_limit = if self.edge_limit == 0 {
            widest as usize + 1
        } else {
            self.edge_limit
        };
        let tile_limit = if self.tile_limit == 0 {
            self.tiles.len()
        } else {
            self.tile_limit
        };
        debug!(
            "Building rule set: {} tiles, edge limit {}, tile limit {}",
            self.tiles.len(),
            edge_limit,
            tile_limit
        );

        let mut tileset = VariantTileset::new(edge_limit, tile_limit);
        let mut distribution = Distribution::new(tileset.tileset().tile_limit());
        let mut names = Vec::with_capacity(self.tiles.len());
        for tile in self.tiles {
            let edges = tile.edges.to_edges();
            let id = if tile.variants.is_empty() {
                tileset.add_tile(RenderTag::new(tile.texture, tile.transformation), edges)?
            } else {
                let entries: Vec<(RenderTag, f32)> = tile
                    .variants
                    .iter()
                    .map(|v| (RenderTag::new(v.texture, v.transformation), v.weight))
                    .collect();
                let variants = Variants::new(&entries).map_err(|e| {
                    LoadError::InvalidData(format!("Variants of tile {}: {e}", tile.name))
                })?;
                tileset.add_variant_tile(variants, edges)?
            };
            distribution.set_weight(id, tile.weight).map_err(|e| {
                LoadError::InvalidData(format!("Tile {}: {e}", tile.name))
            })?;
            names.push(tile.name);
        }

        Ok(RuleSet {
            tileset,
            distribution,
            names,
        })
    }
}
