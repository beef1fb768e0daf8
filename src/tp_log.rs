//! Turning-point log: an append-only, 1-indexed sequence of [`ValueTuple`]s,
//! optionally backed by an external store.

use crate::error::{RfcError, Result};
use crate::residue::ValueTuple;

/// Pluggable backend for the turning-point log: a default in-memory
/// implementation, with room for a host to supply its own, the same split
/// as a reader/writer abstraction over shared memory.
pub trait TpLogBackend {
    fn set(&mut self, pos: u32, tuple: ValueTuple) -> Result<()>;
    fn get(&self, pos: u32) -> Result<ValueTuple>;
    fn inc_damage(&mut self, pos: u32, delta: f64) -> Result<()>;
    fn len(&self) -> u32;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn truncate(&mut self, len: u32);
}

/// Default unbacked in-memory turning-point log.
#[derive(Debug, Clone, Default)]
pub struct VecTpLogBackend {
    entries: Vec<ValueTuple>,
}

impl VecTpLogBackend {
    /// Drop the oldest `count` entries, renumbering `tp_pos` unless
    /// `preserve_pos` is set. Returns the retained entries.
    fn prune_front(&mut self, count: u32, preserve_pos: bool) {
        let keep = self.entries.split_off(count as usize);
        self.entries = keep;
        if !preserve_pos {
            for (i, t) in self.entries.iter_mut().enumerate() {
                t.tp_pos = i as u32 + 1;
            }
        }
    }
}

impl TpLogBackend for VecTpLogBackend {
    fn set(&mut self, pos: u32, tuple: ValueTuple) -> Result<()> {
        let idx = pos as usize - 1;
        if idx == self.entries.len() {
            // Geometric growth: +60% + 1024.
            let target = (self.entries.len() as f64 * 1.6) as usize + 1024;
            self.entries
                .reserve(target.saturating_sub(self.entries.capacity()));
            self.entries.push(tuple);
        } else if idx < self.entries.len() {
            self.entries[idx] = tuple;
        } else {
            return Err(RfcError::TurningPoint(format!(
                "set at pos {pos} beyond log length {}",
                self.entries.len()
            )));
        }
        Ok(())
    }

    fn get(&self, pos: u32) -> Result<ValueTuple> {
        self.entries
            .get(pos as usize - 1)
            .copied()
            .ok_or_else(|| RfcError::TurningPoint(format!("no tuple at pos {pos}")))
    }

    fn inc_damage(&mut self, pos: u32, delta: f64) -> Result<()> {
        let tup = self
            .entries
            .get_mut(pos as usize - 1)
            .ok_or_else(|| RfcError::TurningPoint(format!("no tuple at pos {pos}")))?;
        tup.damage += delta;
        Ok(())
    }

    fn len(&self) -> u32 {
        self.entries.len() as u32
    }

    fn truncate(&mut self, len: u32) {
        self.entries.truncate(len as usize);
    }
}

/// Either the default in-memory backend (structural pruning available) or
/// a host-supplied external backend (pruning is the host's responsibility).
enum Backend {
    Default(VecTpLogBackend),
    External(Box<dyn TpLogBackend>),
}

impl Backend {
    fn inner(&self) -> &dyn TpLogBackend {
        match self {
            Backend::Default(b) => b,
            Backend::External(b) => b.as_ref(),
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TpLogBackend {
        match self {
            Backend::Default(b) => b,
            Backend::External(b) => b.as_mut(),
        }
    }
}

/// Auto-prune policy, matching the flag pair `TPPRUNE_PRESERVE_POS` /
/// `TPPRUNE_PRESERVE_RES`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneOptions {
    pub preserve_pos: bool,
    pub preserve_residue_refs: bool,
}

/// The turning-point log itself: a backend plus a lock flag (set during
/// finalization) and autoprune thresholds.
pub struct TurningPointLog {
    backend: Backend,
    locked: bool,
    autoprune: bool,
    threshold: u32,
    target_size: u32,
}

impl core::fmt::Debug for TurningPointLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TurningPointLog")
            .field("len", &self.backend.inner().len())
            .field("locked", &self.locked)
            .field("autoprune", &self.autoprune)
            .finish()
    }
}

impl Default for TurningPointLog {
    fn default() -> Self {
        Self::new()
    }
}

impl TurningPointLog {
    pub fn new() -> Self {
        Self {
            backend: Backend::Default(VecTpLogBackend::default()),
            locked: false,
            autoprune: false,
            threshold: u32::MAX,
            target_size: u32::MAX,
        }
    }

    /// Install an external backend (`tp_init` with host callbacks).
    pub fn with_backend(backend: Box<dyn TpLogBackend>) -> Self {
        Self {
            backend: Backend::External(backend),
            locked: false,
            autoprune: false,
            threshold: u32::MAX,
            target_size: u32::MAX,
        }
    }

    /// Enable automatic pruning once `len() > threshold`, keeping `target_size`.
    pub fn init_autoprune(&mut self, target_size: u32, threshold: u32) {
        self.autoprune = true;
        self.target_size = target_size;
        self.threshold = threshold;
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> u32 {
        self.backend.inner().len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.inner().is_empty()
    }

    /// Append a new turning point, returning its assigned 1-based `tp_pos`.
    pub fn append(&mut self, mut tuple: ValueTuple) -> Result<u32> {
        if self.locked {
            return Err(RfcError::TurningPoint(
                "turning-point log is locked during finalization".into(),
            ));
        }
        let pos = self.backend.inner().len() + 1;
        tuple.tp_pos = pos;
        self.backend.inner_mut().set(pos, tuple)?;
        Ok(pos)
    }

    pub fn get(&self, pos: u32) -> Result<ValueTuple> {
        self.backend.inner().get(pos)
    }

    pub fn set(&mut self, pos: u32, tuple: ValueTuple) -> Result<()> {
        if self.locked {
            return Err(RfcError::TurningPoint(
                "turning-point log is locked during finalization".into(),
            ));
        }
        self.backend.inner_mut().set(pos, tuple)
    }

    /// Damage increments are always permitted, even while locked.
    pub fn inc_damage(&mut self, pos: u32, delta: f64) -> Result<()> {
        self.backend.inner_mut().inc_damage(pos, delta)
    }

    pub fn clear(&mut self) {
        self.backend.inner_mut().truncate(0);
    }

    /// Prune to `target_size` entries if `len() > threshold`. Returns the
    /// number of entries discarded from the front, used by callers to shift
    /// residue back-references. Only the default backend supports
    /// structural pruning; an external backend is a no-op here.
    pub fn maybe_prune(&mut self, opts: PruneOptions) -> u32 {
        if !self.autoprune {
            return 0;
        }
        let Backend::Default(vecbe) = &mut self.backend else {
            return 0;
        };
        if vecbe.len() <= self.threshold {
            return 0;
        }
        let drop_count = vecbe.len() - self.target_size;
        vecbe.prune_front(drop_count, opts.preserve_pos);
        drop_count
    }
}
