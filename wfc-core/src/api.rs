//! Handle-based engine surface.
//!
//! Every object lives in an [`Arena`] and is addressed by a generational
//! [`Handle`]. Explicit `*_free` calls are the primary release path and are
//! idempotent; [`Owned`] adds a drop-time safety net for handles the caller
//! forgets to free.

use crate::arena::{Arena, Handle};
use crate::distribution::Distribution;
use crate::tile::{EdgeLabel, Edges, RenderTag, TileId};
use crate::tileset::TileSet;
use crate::world::{World, WorldStatus};
use crate::WfcError;
use log::{debug, info};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Default number of slots per object kind.
pub const DEFAULT_CAPACITY: usize = 256;

/// The kind of object a [`Handle`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Tileset,
    Distribution,
    World,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tileset => "tileset",
            Self::Distribution => "distribution",
            Self::World => "world",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct WorldEntry {
    world: World,
    tileset: Handle,
    distribution: Option<Handle>,
}

/// Registry of tilesets, distributions and worlds.
///
/// Tilesets and distributions are shared read-only with the worlds built
/// from them. Adding tiles to a tileset that a world already uses copies the
/// table first, so existing worlds keep the tiles they were created with.
#[derive(Debug)]
pub struct Engine {
    tilesets: Arena<Arc<TileSet>>,
    distributions: Arena<Arc<Distribution>>,
    worlds: Arena<WorldEntry>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine holding at most `capacity` objects of each kind.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tilesets: Arena::with_capacity(capacity),
            distributions: Arena::with_capacity(capacity),
            worlds: Arena::with_capacity(capacity),
        }
    }

    /// Wraps the engine for use with [`Owned`] guards.
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Creates an empty tileset. Sizes are in bytes: the limits are eight
    /// times the given values.
    ///
    /// # Errors
    ///
    /// Returns [`WfcError::Arena`] when no tileset slot is free.
    pub fn tileset_create(&mut self, edge_field_size: u32, tile_field_size: u32) -> Result<Handle, WfcError> {
        let tileset = TileSet::from_field_sizes(edge_field_size, tile_field_size);
        let handle = self.tilesets.insert(Arc::new(tileset))?;
        debug!("Created tileset {}", handle);
        Ok(handle)
    }

    /// Appends a tile. `tile_id` must equal the tileset's current tile count.
    ///
    /// # Errors
    ///
    /// * [`WfcError::StaleHandle`] if the tileset was freed.
    /// * [`WfcError::TileIdMismatch`] if `tile_id` is not the next id.
    /// * [`WfcError::TileSet`] for capacity errors; the tileset is unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn tileset_add_tile(
        &mut self,
        tileset: Handle,
        tile_id: usize,
        render_tag: u32,
        right: EdgeLabel,
        top: EdgeLabel,
        left: EdgeLabel,
        bottom: EdgeLabel,
    ) -> Result<(), WfcError> {
        let shared = self
            .tilesets
            .get_mut(tileset)
            .ok_or(WfcError::StaleHandle {
                kind: HandleKind::Tileset,
                handle: tileset,
            })?;
        let expected = shared.tile_count();
        if tile_id != expected {
            return Err(WfcError::TileIdMismatch {
                expected,
                got: tile_id,
            });
        }
        Arc::make_mut(shared).add_tile(RenderTag(render_tag), Edges::new(right, top, left, bottom))?;
        Ok(())
    }

    pub fn tileset(&self, handle: Handle) -> Option<&TileSet> {
        self.tilesets.get(handle).map(AsRef::as_ref)
    }

    /// Releases a tileset. Freeing a stale handle does nothing.
    pub fn tileset_free(&mut self, handle: Handle) {
        if let Some(shared) = self.tilesets.remove(handle) {
            // Worlds still holding the table keep it alive until they go.
            if let Ok(mut tileset) = Arc::try_unwrap(shared) {
                tileset.free();
            }
            debug!("Freed tileset {}", handle);
        }
    }

    /// Creates an all-zero distribution over `tile_limit` ids.
    ///
    /// # Errors
    ///
    /// Returns [`WfcError::Arena`] when no distribution slot is free.
    pub fn distribution_create(&mut self, tile_limit: usize) -> Result<Handle, WfcError> {
        let handle = self
            .distributions
            .insert(Arc::new(Distribution::new(tile_limit)))?;
        debug!("Created distribution {}", handle);
        Ok(handle)
    }

    /// # Errors
    ///
    /// * [`WfcError::StaleHandle`] if the distribution was freed.
    /// * [`WfcError::Distribution`] for an invalid weight or tile id.
    pub fn distribution_set_weight(&mut self, handle: Handle, tile: TileId, weight: f32) -> Result<(), WfcError> {
        let shared = self
            .distributions
            .get_mut(handle)
            .ok_or(WfcError::StaleHandle {
                kind: HandleKind::Distribution,
                handle,
            })?;
        Arc::make_mut(shared).set_weight(tile, weight)?;
        Ok(())
    }

    pub fn distribution(&self, handle: Handle) -> Option<&Distribution> {
        self.distributions.get(handle).map(AsRef::as_ref)
    }

    pub fn distribution_free(&mut self, handle: Handle) {
        if self.distributions.remove(handle).is_some() {
            debug!("Freed distribution {}", handle);
        }
    }

    /// Creates a world over a tileset and an optional distribution.
    ///
    /// # Errors
    ///
    /// * [`WfcError::StaleHandle`] if either handle was freed.
    /// * Anything [`World::new`] rejects.
    /// * [`WfcError::Arena`] when no world slot is free.
    pub fn world_create(
        &mut self,
        tileset: Handle,
        distribution: Option<Handle>,
        width: usize,
        height: usize,
        seed: u64,
    ) -> Result<Handle, WfcError> {
        let shared_tileset = Arc::clone(self.tilesets.get(tileset).ok_or(WfcError::StaleHandle {
            kind: HandleKind::Tileset,
            handle: tileset,
        })?);
        let shared_distribution = distribution
            .map(|handle| {
                self.distributions
                    .get(handle)
                    .map(Arc::clone)
                    .ok_or(WfcError::StaleHandle {
                        kind: HandleKind::Distribution,
                        handle,
                    })
            })
            .transpose()?;

        let world = World::new(shared_tileset, shared_distribution, width, height, seed)?;
        let handle = self.worlds.insert(WorldEntry {
            world,
            tileset,
            distribution,
        })?;
        info!("Created world {} ({}x{}, seed {})", handle, width, height, seed);
        Ok(handle)
    }

    /// Advances a world by one step.
    ///
    /// # Errors
    ///
    /// Returns [`WfcError::StaleHandle`] if the world, or the tileset or
    /// distribution it was built from, has been freed.
    pub fn world_step(&mut self, handle: Handle) -> Result<WorldStatus, WfcError> {
        Ok(self.live_world_mut(handle)?.step())
    }

    /// Reopens a rectangle of a world for another generation pass; see
    /// [`World::reset_region`].
    ///
    /// # Errors
    ///
    /// As [`world_step`](Self::world_step), plus
    /// [`WfcError::InvalidRegion`].
    pub fn world_reset_region(
        &mut self,
        handle: Handle,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<WorldStatus, WfcError> {
        self.live_world_mut(handle)?.reset_region(x, y, width, height)
    }

    fn live_world_mut(&mut self, handle: Handle) -> Result<&mut World, WfcError> {
        let entry = self.worlds.get_mut(handle).ok_or(WfcError::StaleHandle {
            kind: HandleKind::World,
            handle,
        })?;
        if !self.tilesets.contains(entry.tileset) {
            return Err(WfcError::StaleHandle {
                kind: HandleKind::Tileset,
                handle: entry.tileset,
            });
        }
        if let Some(distribution) = entry.distribution {
            if !self.distributions.contains(distribution) {
                return Err(WfcError::StaleHandle {
                    kind: HandleKind::Distribution,
                    handle: distribution,
                });
            }
        }
        Ok(&mut entry.world)
    }

    /// Resolved tile at `(x, y)`; `None` until the cell has collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`WfcError::StaleHandle`] if the world was freed.
    pub fn world_read_cell(&self, handle: Handle, x: usize, y: usize) -> Result<Option<TileId>, WfcError> {
        self.world(handle)
            .map(|world| world.read_cell(x, y))
            .ok_or(WfcError::StaleHandle {
                kind: HandleKind::World,
                handle,
            })
    }

    pub fn world(&self, handle: Handle) -> Option<&World> {
        self.worlds.get(handle).map(|entry| &entry.world)
    }

    pub fn world_free(&mut self, handle: Handle) {
        if self.worlds.remove(handle).is_some() {
            debug!("Freed world {}", handle);
        }
    }

    /// Whether `handle` still refers to a live object of `kind`.
    pub fn is_live(&self, kind: HandleKind, handle: Handle) -> bool {
        match kind {
            HandleKind::Tileset => self.tilesets.contains(handle),
            HandleKind::Distribution => self.distributions.contains(handle),
            HandleKind::World => self.worlds.contains(handle),
        }
    }

    /// Frees `handle` through the release path matching `kind`.
    pub fn free(&mut self, kind: HandleKind, handle: Handle) {
        match kind {
            HandleKind::Tileset => self.tileset_free(handle),
            HandleKind::Distribution => self.distribution_free(handle),
            HandleKind::World => self.world_free(handle),
        }
    }

    /// Number of live objects of `kind`.
    pub const fn live(&self, kind: HandleKind) -> usize {
        match kind {
            HandleKind::Tileset => self.tilesets.len(),
            HandleKind::Distribution => self.distributions.len(),
            HandleKind::World => self.worlds.len(),
        }
    }
}

/// Owning guard for one engine handle.
///
/// Dropping the guard frees the handle unless it was already freed
/// explicitly (or its slot was reused). The guard holds only a weak
/// reference, so it never keeps the engine alive.
#[derive(Debug)]
pub struct Owned {
    engine: Weak<RefCell<Engine>>,
    kind: HandleKind,
    handle: Handle,
}

impl Owned {
    pub fn new(engine: &Rc<RefCell<Engine>>, kind: HandleKind, handle: Handle) -> Self {
        Self {
            engine: Rc::downgrade(engine),
            kind,
            handle,
        }
    }

    pub const fn handle(&self) -> Handle {
        self.handle
    }

    pub const fn kind(&self) -> HandleKind {
        self.kind
    }
}

impl Drop for Owned {
    fn drop(&mut self) {
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        // A guard dropped while the engine is mutably borrowed leaves the
        // handle to the explicit path.
        let Ok(mut engine) = engine.try_borrow_mut() else {
            return;
        };
        if engine.is_live(self.kind, self.handle) {
            debug!("Reclaiming unreleased {} {}", self.kind, self.handle);
            engine.free(self.kind, self.handle);
        }
    }
}
