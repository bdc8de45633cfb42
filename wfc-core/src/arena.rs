//! Fixed-capacity generational slot pool.
//!
//! Backs the handle API: tilesets, distributions and worlds live in arenas
//! and are addressed by [`Handle`]s. A removed slot bumps its generation, so
//! stale handles resolve to `None` and a second removal is a harmless no-op.

use std::fmt;
use thiserror::Error;

/// Errors raised by [`Arena`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Every slot is occupied (or retired).
    #[error("Arena is full (capacity {0})")]
    Full(usize),
}

/// Slot index plus the generation it was issued at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Handle {
    slot: u32,
    generation: u32,
}

impl Handle {
    /// Packs the handle into a single integer: slot in the upper 32 bits,
    /// generation in the lower 32.
    pub const fn to_raw(self) -> u64 {
        ((self.slot as u64) << 32) | self.generation as u64
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self {
            slot: (raw >> 32) as u32,
            generation: raw as u32,
        }
    }

    pub const fn slot(self) -> u32 {
        self.slot
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(slot={}, gen={})", self.slot, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    data: Option<T>,
}

/// A pool of at most `capacity` live values addressed by [`Handle`].
///
/// Slot storage is reserved up front and freed slots are recycled through a
/// free list. A slot whose generation counter wraps is retired instead of
/// recycled, so a handle from its first epoch can never resolve again.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    capacity: usize,
    live: usize,
}

impl<T> Arena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            capacity,
            live: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live values.
    pub const fn len(&self) -> usize {
        self.live
    }

    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Stores `value` and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::Full`] when no free or fresh slot remains.
    pub fn insert(&mut self, value: T) -> Result<Handle, ArenaError> {
        if let Some(slot_idx) = self.free_list.pop() {
            let slot = &mut self.slots[slot_idx as usize];
            slot.data = Some(value);
            self.live += 1;
            return Ok(Handle {
                slot: slot_idx,
                generation: slot.generation,
            });
        }
        if self.slots.len() >= self.capacity {
            return Err(ArenaError::Full(self.capacity));
        }
        let slot_idx = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            data: Some(value),
        });
        self.live += 1;
        Ok(Handle {
            slot: slot_idx,
            generation: 0,
        })
    }

    fn slot(&self, handle: Handle) -> Option<&Slot<T>> {
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    /// Whether `handle` still refers to a live value.
    pub fn contains(&self, handle: Handle) -> bool {
        self.slot(handle).is_some_and(|slot| slot.data.is_some())
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slot(handle)?.data.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)?
            .data
            .as_mut()
    }

    /// Takes the value out of its slot. Returns `None` for stale handles, so
    /// removing twice is safe.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self
            .slots
            .get_mut(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let value = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation != 0 {
            self.free_list.push(handle.slot);
        }
        self.live -= 1;
        Some(value)
    }

    /// Iterates live values together with their handles, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.data.as_ref().map(|value| {
                (
                    Handle {
                        slot: idx as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}
