//! Word-level helpers for the bitsets used throughout the engine.
//!
//! All fields are `BitVec<usize, Lsb0>` with zeroed dead bits, so two fields
//! of the same length can be combined one storage word at a time.

use bitvec::prelude::{BitSlice, BitVec, Lsb0};

/// A bitset indexed by tile id (or edge label).
pub type TileField = BitVec<usize, Lsb0>;

/// An all-zero field of `len` bits.
pub fn empty_field(len: usize) -> TileField {
    BitVec::repeat(false, len)
}

/// A field of `len` bits with the first `count` set.
pub fn prefix_field(len: usize, count: usize) -> TileField {
    let mut field = empty_field(len);
    field[..count.min(len)].fill(true);
    field
}

/// `dst |= src`. Both fields must have the same length.
pub fn union_into(dst: &mut TileField, src: &TileField) {
    debug_assert_eq!(dst.len(), src.len(), "field length mismatch");
    for (d, s) in dst.as_raw_mut_slice().iter_mut().zip(src.as_raw_slice()) {
        *d |= *s;
    }
}

/// `dst &= src`, returning whether any bit of `dst` was cleared.
pub fn intersect_into(dst: &mut TileField, src: &TileField) -> bool {
    debug_assert_eq!(dst.len(), src.len(), "field length mismatch");
    let mut changed = false;
    for (d, s) in dst.as_raw_mut_slice().iter_mut().zip(src.as_raw_slice()) {
        let next = *d & *s;
        changed |= next != *d;
        *d = next;
    }
    changed
}

/// Clears every bit, keeping the length.
pub fn clear(field: &mut TileField) {
    field.as_raw_mut_slice().fill(0);
}

/// Index of the `n`-th set bit, counting from zero in ascending order.
pub fn nth_one(field: &BitSlice<usize, Lsb0>, n: usize) -> Option<usize> {
    field.iter_ones().nth(n)
}
