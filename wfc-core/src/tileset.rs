use crate::field::{self, TileField};
use crate::sequence::Sequence;
use crate::tile::{EdgeLabel, Edges, RenderTag, Side, TileId};
use bitvec::field::BitField;
use bitvec::prelude::{BitSlice, BitVec, Lsb0};
use log::{debug, trace};
use thiserror::Error;

/// Errors that can occur while building a [`TileSet`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TileSetError {
    /// The tile table is full.
    #[error("Tileset has hit tile limit ({limit})")]
    TileLimitExceeded { limit: usize },
    /// An edge label does not fit the configured edge limit.
    #[error("Tileset has hit edge limit: label {edge} >= {limit}")]
    EdgeLimitExceeded { edge: EdgeLabel, limit: usize },
    /// The tileset storage has already been released.
    #[error("Tileset storage has been freed")]
    Freed,
}

/// Storage header: byte widths of the edge-label and tile-id bitsets.
///
/// Laid out as two consecutive 32-bit fields; the public limits are these
/// values times eight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilesetHeader {
    pub edge_field_size: u32,
    pub tile_field_size: u32,
}

impl TilesetHeader {
    pub const fn edge_limit(self) -> usize {
        self.edge_field_size as usize * 8
    }

    pub const fn tile_limit(self) -> usize {
        self.tile_field_size as usize * 8
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&self.edge_field_size.to_le_bytes());
        bytes[4..].copy_from_slice(&self.tile_field_size.to_le_bytes());
        bytes
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        let [a, b, c, d, e, f, g, h] = bytes;
        Self {
            edge_field_size: u32::from_le_bytes([a, b, c, d]),
            tile_field_size: u32::from_le_bytes([e, f, g, h]),
        }
    }
}

/// Rounds a limit up to the next multiple of 8.
const fn round_to_byte(limit: usize) -> usize {
    limit.div_ceil(8) * 8
}

/// Bits needed to store any label below `edge_limit`.
const fn label_width(edge_limit: usize) -> usize {
    if edge_limit <= 2 {
        1
    } else {
        (usize::BITS - (edge_limit - 1).leading_zeros()) as usize
    }
}

/// The tile table: four edge labels and a render tag per tile id.
///
/// Edge labels are bit-packed, `label_width` bits each, in right/top/left/
/// bottom order per tile. Alongside the table the tileset maintains, for
/// every side and label, the bitset of tiles exposing that label on that
/// side; neighbour constraints are unions of those bitsets.
#[derive(Debug, Clone)]
pub struct TileSet {
    edge_limit: usize,
    tile_limit: usize,
    label_width: usize,
    edges: BitVec<u32, Lsb0>,
    render_tags: Sequence<RenderTag>,
    /// Indexing: `side * edge_limit + label`.
    tiles_by_edge: Vec<TileField>,
    freed: bool,
}

impl TileSet {
    /// Creates an empty tileset. Both limits are rounded up to a multiple of 8.
    pub fn new(edge_limit: usize, tile_limit: usize) -> Self {
        let edge_limit = round_to_byte(edge_limit);
        let tile_limit = round_to_byte(tile_limit);
        let label_width = label_width(edge_limit);
        debug!(
            "Creating tileset: edge limit {}, tile limit {}, {} bits per label",
            edge_limit, tile_limit, label_width
        );
        Self {
            edge_limit,
            tile_limit,
            label_width,
            edges: BitVec::repeat(false, tile_limit * 4 * label_width),
            render_tags: Sequence::with_capacity(tile_limit),
            tiles_by_edge: (0..4 * edge_limit)
                .map(|_| field::empty_field(tile_limit))
                .collect(),
            freed: false,
        }
    }

    /// Creates a tileset from byte widths, as stored in [`TilesetHeader`].
    pub fn from_field_sizes(edge_field_size: u32, tile_field_size: u32) -> Self {
        Self::new(edge_field_size as usize * 8, tile_field_size as usize * 8)
    }

    pub const fn header(&self) -> TilesetHeader {
        TilesetHeader {
            edge_field_size: (self.edge_limit / 8) as u32,
            tile_field_size: (self.tile_limit / 8) as u32,
        }
    }

    pub const fn edge_limit(&self) -> usize {
        self.edge_limit
    }

    pub const fn tile_limit(&self) -> usize {
        self.tile_limit
    }

    pub fn tile_count(&self) -> usize {
        self.render_tags.len()
    }

    pub const fn is_freed(&self) -> bool {
        self.freed
    }

    /// Adds a tile and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`TileSetError::TileLimitExceeded`] when the table is full and
    /// [`TileSetError::EdgeLimitExceeded`] when any label is `>= edge_limit`.
    /// The tileset is unchanged on error.
    pub fn add_tile(&mut self, render_tag: RenderTag, edges: Edges) -> Result<TileId, TileSetError> {
        if self.freed {
            return Err(TileSetError::Freed);
        }
        let tile = self.tile_count();
        if tile >= self.tile_limit {
            return Err(TileSetError::TileLimitExceeded {
                limit: self.tile_limit,
            });
        }
        let widest = edges.max_label();
        if widest as usize >= self.edge_limit {
            return Err(TileSetError::EdgeLimitExceeded {
                edge: widest,
                limit: self.edge_limit,
            });
        }

        for side in Side::ALL {
            let label = edges.get(side);
            let start = (tile * 4 + side.index()) * self.label_width;
            self.edges[start..start + self.label_width].store_le(label);
            self.tiles_by_edge[side.index() * self.edge_limit + label as usize].set(tile, true);
        }
        self.render_tags.push(render_tag);
        trace!("Added tile {} with edges {:?}, tag {:#x}", tile, edges, render_tag.raw());
        Ok(TileId(tile))
    }

    /// Label `tile` exposes on `side`, or `None` for an unknown tile.
    pub fn edge(&self, tile: TileId, side: Side) -> Option<EdgeLabel> {
        if self.freed || tile.0 >= self.tile_count() {
            return None;
        }
        let start = (tile.0 * 4 + side.index()) * self.label_width;
        Some(self.edges[start..start + self.label_width].load_le::<EdgeLabel>())
    }

    pub fn edges(&self, tile: TileId) -> Option<Edges> {
        Some(Edges::new(
            self.edge(tile, Side::Right)?,
            self.edge(tile, Side::Top)?,
            self.edge(tile, Side::Left)?,
            self.edge(tile, Side::Bottom)?,
        ))
    }

    pub fn render_tag(&self, tile: TileId) -> Option<RenderTag> {
        if self.freed {
            return None;
        }
        self.render_tags.get(tile.0).copied()
    }

    /// Whether `tile_a` placed with its `side_a` against `tile_b`'s `side_b`
    /// is a valid adjacency: the sides must face each other and carry equal
    /// labels.
    pub fn compatible(&self, tile_a: TileId, side_a: Side, tile_b: TileId, side_b: Side) -> bool {
        if side_a.opposite() != side_b {
            return false;
        }
        match (self.edge(tile_a, side_a), self.edge(tile_b, side_b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Every defined tile id, as a field of `tile_limit` bits.
    pub fn all_tiles(&self) -> TileField {
        field::prefix_field(self.tile_limit, self.tile_count())
    }

    /// Writes into `out` the set of labels the `candidates` expose on `side`.
    ///
    /// `out` is resized to `edge_limit` bits.
    pub fn edge_field_into(&self, candidates: &BitSlice<usize, Lsb0>, side: Side, out: &mut TileField) {
        out.resize(self.edge_limit, false);
        field::clear(out);
        for tile in candidates.iter_ones() {
            if let Some(label) = self.edge(TileId(tile), side) {
                out.set(label as usize, true);
            }
        }
    }

    pub fn edge_field(&self, candidates: &BitSlice<usize, Lsb0>, side: Side) -> TileField {
        let mut out = field::empty_field(self.edge_limit);
        self.edge_field_into(candidates, side, &mut out);
        out
    }

    /// Writes into `out` the tiles that may sit across `side` from a cell
    /// holding `candidates`: every tile whose opposite edge matches a label
    /// exposed by at least one candidate.
    ///
    /// `labels` is scratch space for the intermediate edge field.
    pub fn allowed_neighbours_into(
        &self,
        candidates: &BitSlice<usize, Lsb0>,
        side: Side,
        labels: &mut TileField,
        out: &mut TileField,
    ) {
        self.edge_field_into(candidates, side, labels);
        out.resize(self.tile_limit, false);
        field::clear(out);
        let facing = side.opposite().index() * self.edge_limit;
        for label in labels.iter_ones() {
            field::union_into(out, &self.tiles_by_edge[facing + label]);
        }
    }

    pub fn allowed_neighbours(&self, candidates: &BitSlice<usize, Lsb0>, side: Side) -> TileField {
        let mut labels = field::empty_field(self.edge_limit);
        let mut out = field::empty_field(self.tile_limit);
        self.allowed_neighbours_into(candidates, side, &mut labels, &mut out);
        out
    }

    /// Iterates `(id, edges, render tag)` for every tile.
    pub fn iter(&self) -> impl Iterator<Item = (TileId, Edges, RenderTag)> + '_ {
        (0..self.tile_count()).filter_map(move |idx| {
            let tile = TileId(idx);
            Some((tile, self.edges(tile)?, self.render_tag(tile)?))
        })
    }

    /// Releases the tile table. Only the first call has an effect.
    pub fn free(&mut self) {
        if self.freed {
            return;
        }
        self.freed = true;
        self.edges = BitVec::new();
        self.render_tags = Sequence::new();
        self.tiles_by_edge = Vec::new();
        debug!("Tileset freed");
    }
}
