#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a unique identifier for a tile.
///
/// Ids are assigned densely from 0 in the order tiles are added to a
/// [`TileSet`](crate::TileSet) and double as bit indices in a
/// [`Superposition`](crate::Superposition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileId(pub usize);

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An edge label. Two touching edges are compatible iff their labels are equal.
pub type EdgeLabel = u32;

/// One side of a square tile.
///
/// The discriminants are the storage order of edge labels in a tile record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Right = 0,
    Top = 1,
    Left = 2,
    Bottom = 3,
}

impl Side {
    /// All sides in storage order.
    pub const ALL: [Self; 4] = [Self::Right, Self::Top, Self::Left, Self::Bottom];

    /// The side a neighbour exposes back across the shared boundary.
    pub const fn opposite(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Top => Self::Bottom,
            Self::Left => Self::Right,
            Self::Bottom => Self::Top,
        }
    }

    /// Grid offset `(dx, dy)` of the neighbour across this side.
    ///
    /// `Top` points towards increasing `y`.
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Self::Right => (1, 0),
            Self::Top => (0, 1),
            Self::Left => (-1, 0),
            Self::Bottom => (0, -1),
        }
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// The four edge labels of a tile, in right/top/left/bottom order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edges {
    pub right: EdgeLabel,
    pub top: EdgeLabel,
    pub left: EdgeLabel,
    pub bottom: EdgeLabel,
}

impl Edges {
    pub const fn new(right: EdgeLabel, top: EdgeLabel, left: EdgeLabel, bottom: EdgeLabel) -> Self {
        Self {
            right,
            top,
            left,
            bottom,
        }
    }

    /// A fully symmetric tile: every side carries `edge`.
    pub const fn uniform(edge: EdgeLabel) -> Self {
        Self::new(edge, edge, edge, edge)
    }

    /// `horizontal` governs right and left, `vertical` governs top and bottom.
    pub const fn axis_symmetric(horizontal: EdgeLabel, vertical: EdgeLabel) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    pub const fn get(&self, side: Side) -> EdgeLabel {
        match side {
            Side::Right => self.right,
            Side::Top => self.top,
            Side::Left => self.left,
            Side::Bottom => self.bottom,
        }
    }

    pub const fn as_array(&self) -> [EdgeLabel; 4] {
        [self.right, self.top, self.left, self.bottom]
    }

    /// Largest label on any side.
    pub fn max_label(&self) -> EdgeLabel {
        self.as_array().into_iter().max().unwrap_or(0)
    }
}

/// Opaque per-tile render data.
///
/// Packs a transformation code in the high 16 bits and a texture/content id
/// in the low 16 bits. The engine never interprets it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderTag(pub u32);

impl RenderTag {
    pub const fn new(texture_id: u16, transformation: u16) -> Self {
        Self(((transformation as u32) << 16) | texture_id as u32)
    }

    pub const fn texture_id(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub const fn transformation(self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}
