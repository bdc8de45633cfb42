//! The world: a grid of superpositions driven to a consistent tiling one
//! collapse at a time.

use crate::area::DistributionArea;
use crate::distribution::{Distribution, DistributionBlend};
use crate::entropy::{select_lowest_entropy_cell_with, EntropyHeuristic};
use crate::grid::Grid;
use crate::propagator::{PropagationError, Propagator};
use crate::superposition::{CellState, Superposition};
use crate::tile::{RenderTag, Side, TileId};
use crate::tileset::{TileSet, TileSetError};
use crate::variants::VariantTileset;
use crate::{BoundaryMode, WfcError};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle of a [`World`]. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WorldStatus {
    /// At least one cell is still open.
    Running,
    /// Every cell is collapsed and all adjacencies are compatible.
    Done,
    /// A contradiction (or a failed draw) ended generation.
    Failed,
}

/// The tile model a world is bound to.
#[derive(Debug, Clone)]
pub enum TileBinding {
    Plain(Arc<TileSet>),
    Variants(Arc<VariantTileset>),
}

impl TileBinding {
    pub fn tileset(&self) -> &TileSet {
        match self {
            Self::Plain(tileset) => tileset,
            Self::Variants(variants) => variants.tileset(),
        }
    }
}

impl From<Arc<TileSet>> for TileBinding {
    fn from(tileset: Arc<TileSet>) -> Self {
        Self::Plain(tileset)
    }
}

impl From<Arc<VariantTileset>> for TileBinding {
    fn from(variants: Arc<VariantTileset>) -> Self {
        Self::Variants(variants)
    }
}

/// Tile ids and render tags of a finished world, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedGrid {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<TileId>,
    pub render_tags: Vec<RenderTag>,
}

impl ResolvedGrid {
    pub fn tile(&self, x: usize, y: usize) -> Option<TileId> {
        (x < self.width && y < self.height)
            .then(|| self.tiles[y * self.width + x])
    }

    pub fn render_tag(&self, x: usize, y: usize) -> Option<RenderTag> {
        (x < self.width && y < self.height)
            .then(|| self.render_tags[y * self.width + x])
    }

    /// Tile ids grouped by row, `y = 0` first.
    pub fn rows(&self) -> std::slice::Chunks<'_, TileId> {
        self.tiles.chunks(self.width)
    }

    /// Pretty-printed JSON of the whole grid.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error, which only occurs on I/O-free
    /// formatting failures.
    #[cfg(feature = "serde")]
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Builder for [`World`].
#[derive(Debug, Clone)]
pub struct WorldBuilder {
    binding: TileBinding,
    distribution: Option<Arc<Distribution>>,
    area: Option<Arc<DistributionArea>>,
    width: usize,
    height: usize,
    seed: u64,
    boundary_mode: BoundaryMode,
    heuristic: EntropyHeuristic,
}

impl WorldBuilder {
    pub fn new(binding: impl Into<TileBinding>) -> Self {
        Self {
            binding: binding.into(),
            distribution: None,
            area: None,
            width: 1,
            height: 1,
            seed: 0,
            boundary_mode: BoundaryMode::default(),
            heuristic: EntropyHeuristic::default(),
        }
    }

    /// Sets the selection weights. Without one, draws are uniform.
    pub fn distribution(mut self, distribution: Arc<Distribution>) -> Self {
        self.distribution = Some(distribution);
        self
    }

    /// Sets weights that vary across the grid. Takes precedence over
    /// [`distribution`](Self::distribution).
    pub fn distribution_area(mut self, area: Arc<DistributionArea>) -> Self {
        self.area = Some(area);
        self
    }

    pub fn size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn boundary_mode(mut self, mode: BoundaryMode) -> Self {
        self.boundary_mode = mode;
        self
    }

    pub fn heuristic(mut self, heuristic: EntropyHeuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Builds the world and runs the initial consistency pass.
    ///
    /// # Errors
    ///
    /// * [`WfcError::InvalidDimensions`] for a zero width or height.
    /// * [`WfcError::TileSet`] if the tileset has been freed.
    /// * [`WfcError::EmptyTileSet`] if the tileset defines no tiles.
    pub fn build(self) -> Result<World, WfcError> {
        World::from_builder(self)
    }
}

/// A `width × height` grid of [`Superposition`]s bound to one tileset and an
/// optional [`Distribution`].
///
/// Every cell starts with all defined tiles. Each [`step`](Self::step)
/// collapses the open cell of lowest entropy (ties go to the lowest row-major
/// index), then propagates breadth-first. There is no backtracking: a
/// contradiction makes the world `Failed` for good.
#[derive(Debug, Clone)]
pub struct World {
    binding: TileBinding,
    distribution: Option<Arc<Distribution>>,
    area: Option<Arc<DistributionArea>>,
    cells: Grid<Superposition>,
    propagator: Propagator,
    heuristic: EntropyHeuristic,
    rng: ChaCha8Rng,
    seed: u64,
    status: WorldStatus,
    steps: u64,
}

impl World {
    /// Creates a world with clamped boundaries and the default heuristic.
    ///
    /// # Errors
    ///
    /// See [`WorldBuilder::build`].
    pub fn new(
        tileset: Arc<TileSet>,
        distribution: Option<Arc<Distribution>>,
        width: usize,
        height: usize,
        seed: u64,
    ) -> Result<Self, WfcError> {
        let mut builder = Self::builder(tileset).size(width, height).seed(seed);
        if let Some(distribution) = distribution {
            builder = builder.distribution(distribution);
        }
        builder.build()
    }

    pub fn builder(binding: impl Into<TileBinding>) -> WorldBuilder {
        WorldBuilder::new(binding)
    }

    fn from_builder(builder: WorldBuilder) -> Result<Self, WfcError> {
        let WorldBuilder {
            binding,
            distribution,
            area,
            width,
            height,
            seed,
            boundary_mode,
            heuristic,
        } = builder;

        if width == 0 || height == 0 {
            return Err(WfcError::InvalidDimensions { width, height });
        }
        let tileset = binding.tileset();
        if tileset.is_freed() {
            return Err(TileSetError::Freed.into());
        }
        if tileset.tile_count() == 0 {
            return Err(WfcError::EmptyTileSet);
        }

        let cells = Grid::filled(width, height, Superposition::new(tileset.all_tiles()));
        let propagator = Propagator::new(tileset, cells.len(), boundary_mode);
        info!(
            "Creating {}x{} world over {} tiles (seed {}, {:?} boundary, {:?} heuristic)",
            width,
            height,
            tileset.tile_count(),
            seed,
            boundary_mode,
            heuristic
        );

        let mut world = Self {
            binding,
            distribution,
            area,
            cells,
            propagator,
            heuristic,
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            status: WorldStatus::Running,
            steps: 0,
        };
        world.settle_initial_constraints();
        Ok(world)
    }

    /// Prunes tiles that have no compatible partner towards some neighbour
    /// before the first collapse.
    fn settle_initial_constraints(&mut self) {
        let all_cells = 0..self.cells.len();
        match self
            .propagator
            .propagate(&mut self.cells, self.binding.tileset(), all_cells)
        {
            Ok(()) => self.status = self.open_status(),
            Err(PropagationError::Contradiction(x, y)) => {
                warn!("Consistency pass found a contradiction at ({}, {})", x, y);
                self.status = WorldStatus::Failed;
            }
        }
    }

    fn open_status(&self) -> WorldStatus {
        if self.cells.iter().any(|cell| cell.state() == CellState::Open) {
            WorldStatus::Running
        } else {
            WorldStatus::Done
        }
    }

    /// Performs one collapse-and-propagate cycle.
    ///
    /// Terminal worlds are left untouched and simply report their status.
    pub fn step(&mut self) -> WorldStatus {
        if self.status != WorldStatus::Running {
            return self.status;
        }
        self.steps += 1;

        let width = self.cells.width;
        let area = self.area.as_deref();
        let distribution = self.distribution.as_deref();
        let Some(index) = select_lowest_entropy_cell_with(&mut self.cells, self.heuristic, |index| {
            weights_at(area, distribution, index % width, index / width)
        }) else {
            self.status = WorldStatus::Done;
            return self.status;
        };

        let (x, y) = self.cells.coords(index);
        let candidates = self.cells.data[index].candidates();
        let drawn = match weights_at(area, distribution, x, y) {
            Some(weights) => weights.sample(candidates, &mut self.rng),
            None => Distribution::sample_uniform(candidates, &mut self.rng),
        };
        let tile = match drawn {
            Ok(tile) => tile,
            Err(e) => {
                warn!("Step {}: no tile could be drawn at ({}, {}): {}", self.steps, x, y, e);
                self.status = WorldStatus::Failed;
                return self.status;
            }
        };
        if let Err(e) = self.cells.data[index].collapse_to(tile) {
            warn!("Step {}: {}", self.steps, e);
            self.status = WorldStatus::Failed;
            return self.status;
        }
        debug!("Step {}: collapsed ({}, {}) to tile {}", self.steps, x, y, tile);

        if let Err(PropagationError::Contradiction(cx, cy)) =
            self.propagator
                .propagate(&mut self.cells, self.binding.tileset(), [index])
        {
            warn!("Step {}: contradiction at ({}, {})", self.steps, cx, cy);
            self.status = WorldStatus::Failed;
            return self.status;
        }

        self.status = self.open_status();
        if self.status == WorldStatus::Done {
            info!("World resolved after {} steps", self.steps);
        }
        self.status
    }

    pub const fn status(&self) -> WorldStatus {
        self.status
    }

    /// Number of `step` calls that did work.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    pub const fn width(&self) -> usize {
        self.cells.width
    }

    pub const fn height(&self) -> usize {
        self.cells.height
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub const fn boundary_mode(&self) -> BoundaryMode {
        self.propagator.boundary_mode()
    }

    pub const fn heuristic(&self) -> EntropyHeuristic {
        self.heuristic
    }

    pub fn tileset(&self) -> &TileSet {
        self.binding.tileset()
    }

    pub const fn binding(&self) -> &TileBinding {
        &self.binding
    }

    pub fn distribution(&self) -> Option<&Distribution> {
        self.distribution.as_deref()
    }

    pub fn distribution_area(&self) -> Option<&DistributionArea> {
        self.area.as_deref()
    }

    /// Reopens the `width × height` rectangle at `(x, y)` so it can be
    /// generated again.
    ///
    /// Every cell inside the rectangle gets all defined tiles back; cells
    /// outside keep their state. A consistency pass over the whole grid then
    /// narrows the reopened cells to what their surroundings allow, so the
    /// region's border is seeded from the tiles already placed around it.
    /// This is the restart path for a `Failed` world: the result is `Failed`
    /// again only if the pass still finds a contradiction.
    ///
    /// # Errors
    ///
    /// Returns [`WfcError::InvalidRegion`] for an empty rectangle or one that
    /// extends past the grid. The world is untouched in that case.
    pub fn reset_region(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<WorldStatus, WfcError> {
        let fits = width > 0
            && height > 0
            && x.checked_add(width).is_some_and(|end| end <= self.cells.width)
            && y.checked_add(height).is_some_and(|end| end <= self.cells.height);
        if !fits {
            return Err(WfcError::InvalidRegion {
                x,
                y,
                width,
                height,
            });
        }

        let reopened = Superposition::new(self.binding.tileset().all_tiles());
        for row in y..y + height {
            for column in x..x + width {
                if let Some(cell) = self.cells.get_mut(column, row) {
                    *cell = reopened.clone();
                }
            }
        }
        info!(
            "Reset {}x{} region at ({}, {}) after {} steps",
            width, height, x, y, self.steps
        );

        self.status = WorldStatus::Running;
        self.settle_initial_constraints();
        if self.status == WorldStatus::Running
            && self.cells.iter().any(Superposition::is_contradicted)
        {
            warn!("Contradiction outside the reset region remains");
            self.status = WorldStatus::Failed;
        }
        Ok(self.status)
    }

    /// Candidate set of a cell, regardless of world status.
    pub fn cell(&self, x: usize, y: usize) -> Option<&Superposition> {
        self.cells.get(x, y)
    }

    pub fn collapsed_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_collapsed()).count()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// The tile a cell resolved to. `None` while the cell is open, outside
    /// the grid, or once the world has failed.
    pub fn read_cell(&self, x: usize, y: usize) -> Option<TileId> {
        if self.status == WorldStatus::Failed {
            return None;
        }
        self.cells.get(x, y)?.collapsed_tile()
    }

    /// Render tag for a resolved cell.
    ///
    /// Variant tiles draw from their own weights. Each cell uses a dedicated
    /// stream of the world's seed, so reads are repeatable and do not disturb
    /// the collapse sequence.
    pub fn read_render_tag(&self, x: usize, y: usize) -> Option<RenderTag> {
        let tile = self.read_cell(x, y)?;
        match &self.binding {
            TileBinding::Plain(tileset) => tileset.render_tag(tile),
            TileBinding::Variants(variants) => {
                let index = self.cells.index(x, y)?;
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                rng.set_stream(index as u64 + 1);
                variants.resolve_render_tag(tile, &mut rng)
            }
        }
    }

    /// The finished tiling. Only available once the world is `Done`.
    pub fn resolved(&self) -> Option<ResolvedGrid> {
        if self.status != WorldStatus::Done {
            return None;
        }
        let (width, height) = (self.width(), self.height());
        let mut tiles = Vec::with_capacity(self.cells.len());
        let mut render_tags = Vec::with_capacity(self.cells.len());
        for y in 0..height {
            for x in 0..width {
                tiles.push(self.read_cell(x, y)?);
                render_tags.push(self.read_render_tag(x, y)?);
            }
        }
        Some(ResolvedGrid {
            width,
            height,
            tiles,
            render_tags,
        })
    }

    /// Checks every adjacent pair of collapsed cells against the tileset.
    /// Returns the first offending `(x, y, side)`, if any.
    pub fn first_incompatibility(&self) -> Option<(usize, usize, Side)> {
        let tileset = self.tileset();
        for index in 0..self.cells.len() {
            let (x, y) = self.cells.coords(index);
            let Some(tile) = self.cells.data[index].collapsed_tile() else {
                continue;
            };
            for side in [Side::Right, Side::Top] {
                let Some(other) = self.cells.neighbour(index, side, self.boundary_mode()) else {
                    continue;
                };
                let Some(neighbour) = self.cells.data[other].collapsed_tile() else {
                    continue;
                };
                if !tileset.compatible(tile, side, neighbour, side.opposite()) {
                    return Some((x, y, side));
                }
            }
        }
        None
    }
}

/// Weights in force at `(x, y)`: the area's blend when one is bound, the
/// single distribution otherwise, `None` for uniform draws.
fn weights_at<'a>(
    area: Option<&'a DistributionArea>,
    distribution: Option<&'a Distribution>,
    x: usize,
    y: usize,
) -> Option<DistributionBlend<'a>> {
    match (area, distribution) {
        (Some(area), _) => Some(area.select(x, y)),
        (None, Some(distribution)) => Some(DistributionBlend::single(distribution)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Edges;

    fn two_tiles() -> Arc<TileSet> {
        let mut tileset = TileSet::new(2, 2);
        tileset.add_tile(RenderTag::new(0, 0), Edges::uniform(0)).unwrap();
        tileset.add_tile(RenderTag::new(1, 0), Edges::uniform(1)).unwrap();
        Arc::new(tileset)
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(matches!(
            World::new(two_tiles(), None, 0, 3, 1),
            Err(WfcError::InvalidDimensions { width: 0, height: 3 })
        ));
        let empty = Arc::new(TileSet::new(8, 8));
        assert!(matches!(
            World::new(empty, None, 2, 2, 1),
            Err(WfcError::EmptyTileSet)
        ));
        let mut freed = TileSet::new(8, 8);
        freed.add_tile(RenderTag::default(), Edges::uniform(0)).unwrap();
        freed.free();
        assert!(matches!(
            World::new(Arc::new(freed), None, 2, 2, 1),
            Err(WfcError::TileSet(TileSetError::Freed))
        ));
    }

    #[test]
    fn first_step_collapses_and_propagates() {
        let mut world = World::new(two_tiles(), None, 2, 1, 3).unwrap();
        assert_eq!(world.status(), WorldStatus::Running);
        assert_eq!(world.read_cell(0, 0), None);

        assert_eq!(world.step(), WorldStatus::Done);
        let left = world.read_cell(0, 0).unwrap();
        assert_eq!(world.read_cell(1, 0), Some(left));
        assert_eq!(world.steps(), 1);
        assert_eq!(world.collapsed_count(), 2);
    }

    #[test]
    fn unpairable_tile_is_pruned_up_front() {
        let mut tileset = TileSet::new(8, 8);
        tileset.add_tile(RenderTag::default(), Edges::uniform(0)).unwrap();
        // Right edge 1 has no partner with left edge 1.
        tileset.add_tile(RenderTag::default(), Edges::new(1, 0, 0, 0)).unwrap();
        let mut world = World::new(Arc::new(tileset), None, 3, 1, 0).unwrap();
        assert_eq!(world.read_cell(0, 0), Some(TileId(0)));
        assert_eq!(world.read_cell(1, 0), Some(TileId(0)));
        // The last column has no right neighbour, so both tiles still fit.
        assert_eq!(world.cell(2, 0).unwrap().count(), 2);
        assert_eq!(world.status(), WorldStatus::Running);

        assert_eq!(world.step(), WorldStatus::Done);
        assert_eq!(world.first_incompatibility(), None);
    }

    #[test]
    fn impossible_world_starts_failed() {
        let mut tileset = TileSet::new(8, 8);
        tileset.add_tile(RenderTag::default(), Edges::new(1, 0, 2, 0)).unwrap();
        let mut world = World::new(Arc::new(tileset), None, 2, 1, 0).unwrap();
        assert_eq!(world.status(), WorldStatus::Failed);
        assert_eq!(world.step(), WorldStatus::Failed);
        assert_eq!(world.steps(), 0);
        assert_eq!(world.read_cell(0, 0), None);
        assert!(world.resolved().is_none());
    }

    #[test]
    fn resolved_grid_reports_tags() {
        let mut world = World::new(two_tiles(), None, 3, 2, 9).unwrap();
        while world.step() == WorldStatus::Running {}
        let resolved = world.resolved().unwrap();
        assert_eq!(resolved.rows().count(), 2);
        let tile = resolved.tile(0, 0).unwrap();
        assert!(resolved.tiles.iter().all(|&t| t == tile));
        assert_eq!(resolved.render_tag(2, 1), Some(RenderTag::new(tile.0 as u16, 0)));
        assert_eq!(resolved.tile(3, 0), None);
        assert_eq!(world.first_incompatibility(), None);
    }

    // Two interchangeable tiles: any arrangement is consistent.
    fn free_tiles() -> Arc<TileSet> {
        let mut tileset = TileSet::new(8, 8);
        tileset.add_tile(RenderTag::new(0, 0), Edges::uniform(0)).unwrap();
        tileset.add_tile(RenderTag::new(1, 0), Edges::uniform(0)).unwrap();
        Arc::new(tileset)
    }

    #[test]
    fn huge_weights_do_not_break_a_step() {
        let distribution = Arc::new(Distribution::from_weights(&[3.0e38, 3.0e38]).unwrap());
        let mut world = World::new(free_tiles(), Some(distribution), 2, 1, 4).unwrap();
        assert_eq!(world.step(), WorldStatus::Running);
        assert_eq!(world.step(), WorldStatus::Done);
        assert!(world.resolved().is_some());
    }

    #[test]
    fn area_weights_follow_location() {
        let only = |tile: usize| {
            let mut weights = [0.0; 2];
            weights[tile] = 1.0;
            Arc::new(Distribution::from_weights(&weights).unwrap())
        };
        let area = DistributionArea::new(4, 2, 1, vec![only(0), only(1)]).unwrap();
        for seed in 0..8 {
            let mut world = World::builder(free_tiles())
                .distribution_area(Arc::new(area.clone()))
                .size(8, 2)
                .seed(seed)
                .build()
                .unwrap();
            while world.step() == WorldStatus::Running {}
            assert_eq!(world.status(), WorldStatus::Done);
            for y in 0..2 {
                assert_eq!(world.read_cell(0, y), Some(TileId(0)));
                for x in 3..8 {
                    assert_eq!(world.read_cell(x, y), Some(TileId(1)));
                }
            }
        }
    }

    #[test]
    fn reset_region_regenerates_only_the_rectangle() {
        let mut world = World::new(free_tiles(), None, 5, 4, 12).unwrap();
        while world.step() == WorldStatus::Running {}
        let before = world.resolved().unwrap();

        assert_eq!(world.reset_region(1, 1, 3, 2).unwrap(), WorldStatus::Running);
        assert!(world.resolved().is_none());
        for y in 0..4 {
            for x in 0..5 {
                let inside = (1..4).contains(&x) && (1..3).contains(&y);
                assert_eq!(world.read_cell(x, y).is_none(), inside, "cell ({x}, {y})");
            }
        }

        while world.step() == WorldStatus::Running {}
        let after = world.resolved().unwrap();
        assert_eq!(after.tile(0, 0), before.tile(0, 0));
        assert_eq!(after.tile(4, 3), before.tile(4, 3));
        assert_eq!(world.first_incompatibility(), None);
    }

    #[test]
    fn reset_region_is_seeded_from_surrounding_tiles() {
        let mut world = World::new(two_tiles(), None, 3, 3, 5).unwrap();
        while world.step() == WorldStatus::Running {}
        let placed = world.read_cell(0, 0).unwrap();

        // The neighbours leave a single option for the centre.
        assert_eq!(world.reset_region(1, 1, 1, 1).unwrap(), WorldStatus::Done);
        assert_eq!(world.read_cell(1, 1), Some(placed));
    }

    #[test]
    fn reset_region_rejects_bad_rectangles() {
        let mut world = World::new(two_tiles(), None, 3, 3, 5).unwrap();
        for (x, y, w, h) in [(0, 0, 0, 1), (2, 0, 2, 1), (0, 3, 1, 1), (usize::MAX, 0, 2, 1)] {
            assert!(matches!(
                world.reset_region(x, y, w, h),
                Err(WfcError::InvalidRegion { .. })
            ));
        }
        assert_eq!(world.status(), WorldStatus::Running);
    }

    #[test]
    fn reset_cannot_rescue_an_unsatisfiable_tileset() {
        let mut tileset = TileSet::new(8, 8);
        tileset.add_tile(RenderTag::default(), Edges::new(1, 0, 2, 0)).unwrap();
        let mut world = World::new(Arc::new(tileset), None, 2, 1, 0).unwrap();
        assert_eq!(world.status(), WorldStatus::Failed);
        assert_eq!(world.reset_region(0, 0, 2, 1).unwrap(), WorldStatus::Failed);
        assert_eq!(world.step(), WorldStatus::Failed);
    }
}
