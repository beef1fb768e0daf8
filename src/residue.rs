//! Value tuples and the residue deque.
//!
//! The residue is bounded by `2 * class_count + 1`; we size the backing
//! store for the worst case (`MAX_CLASS_COUNT`) and track the live
//! capacity separately, the way `evo_common::control_unit::state`'s
//! `CouplingConfig::slave_axes` bounds itself with `heapless::Vec<_, 8>`
//! rather than reallocating.

use crate::class::MAX_CLASS_COUNT;
use crate::error::{RfcError, Result};

/// Hard backing capacity for the residue / HCM stack (`2 * MAX_CLASS_COUNT + 1`).
pub const MAX_RESIDUE_CAP: usize = 2 * MAX_CLASS_COUNT as usize + 1;

/// A turning-point candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueTuple {
    /// Original sample value.
    pub value: f64,
    /// Quantized class index (meaningless when counting is disabled).
    pub class: u16,
    /// 1-based index in the input stream.
    pub pos: u64,
    /// 1-based index in the turning-point log; `0` = not yet logged.
    pub tp_pos: u32,
    /// `tp_pos` of the paired turning point when a cycle closes; `0` = none.
    pub adj_pos: u32,
    /// Cycle mean, populated on closure.
    pub average: f64,
    /// Per-tuple cumulative damage (damage spreading only).
    pub damage: f64,
}

impl ValueTuple {
    /// A fresh tuple with no turning-point log association yet.
    pub fn new(value: f64, class: u16, pos: u64) -> Self {
        Self {
            value,
            class,
            pos,
            tp_pos: 0,
            adj_pos: 0,
            average: 0.0,
            damage: 0.0,
        }
    }
}

/// Ordered residue of unclosed turning points, capacity-bounded per
/// The last element may be an interim (unconfirmed) point.
#[derive(Debug, Clone, Default)]
pub struct Residue {
    buf: Vec<ValueTuple>,
    cap: usize,
}

impl Residue {
    /// Create an empty residue with the given capacity bound
    /// (`ClassParam::residue_capacity`).
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap.min(MAX_RESIDUE_CAP)),
            cap: cap.min(MAX_RESIDUE_CAP),
        }
    }

    /// Resize the capacity bound in place (used by autoresize).
    pub fn set_capacity(&mut self, cap: usize) {
        self.cap = cap.min(MAX_RESIDUE_CAP);
    }

    /// Number of tuples currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a tuple, allowing exactly one transient overflow slot for an
    /// interim point.
    pub fn push(&mut self, tuple: ValueTuple) -> Result<()> {
        if self.buf.len() > self.cap {
            return Err(RfcError::Memory(format!(
                "residue exceeded capacity {} (+1 transient)",
                self.cap
            )));
        }
        self.buf.push(tuple);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<ValueTuple> {
        self.buf.pop()
    }

    pub fn remove(&mut self, idx: usize) -> ValueTuple {
        self.buf.remove(idx)
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn as_slice(&self) -> &[ValueTuple] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [ValueTuple] {
        &mut self.buf
    }

    pub fn last(&self) -> Option<&ValueTuple> {
        self.buf.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut ValueTuple> {
        self.buf.last_mut()
    }

    pub fn first(&self) -> Option<&ValueTuple> {
        self.buf.first()
    }

    pub fn get(&self, idx: usize) -> Option<&ValueTuple> {
        self.buf.get(idx)
    }

    /// Replace the entire residue content (used by `REPEATED` finalization
    /// and `tp_refeed`).
    pub fn replace_all(&mut self, tuples: Vec<ValueTuple>) {
        self.buf = tuples;
    }

    /// Take ownership of the contents, leaving the residue empty.
    pub fn take(&mut self) -> Vec<ValueTuple> {
        core::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_transient_overflow() {
        let mut r = Residue::with_capacity(2);
        r.push(ValueTuple::new(1.0, 0, 1)).unwrap();
        r.push(ValueTuple::new(2.0, 0, 2)).unwrap();
        // one transient slot beyond cap is allowed
        r.push(ValueTuple::new(3.0, 0, 3)).unwrap();
        assert_eq!(r.len(), 3);
        assert!(r.push(ValueTuple::new(4.0, 0, 4)).is_err());
    }

    #[test]
    fn replace_and_take_roundtrip() {
        let mut r = Residue::with_capacity(4);
        r.replace_all(vec![ValueTuple::new(1.0, 0, 1), ValueTuple::new(2.0, 1, 2)]);
        assert_eq!(r.len(), 2);
        let taken = r.take();
        assert_eq!(taken.len(), 2);
        assert!(r.is_empty());
    }
}
