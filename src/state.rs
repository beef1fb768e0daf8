//! Context lifecycle state machine.

/// Lifecycle state of a [`crate::context::RainflowContext`].
///
/// Only one state is active at any time. `Error` exits only via an
/// explicit `reset`/`deinit`; every other operation on an `Error`
/// context fails without mutating anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContextState {
    /// Constructed but not yet configured.
    Init0 = 0,
    /// Configured, no data fed yet.
    Init = 1,
    /// Mid-stream, no interim turning point pending.
    Busy = 2,
    /// Mid-stream, an interim (unconfirmed) turning point is pending.
    BusyInterim = 3,
    /// A `finalize` residue policy is running.
    Finalize = 4,
    /// Finalization complete; no further feeds accepted.
    Finished = 5,
    /// Unrecoverable error; sticky until reset.
    Error = 6,
}

impl ContextState {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Init0),
            1 => Some(Self::Init),
            2 => Some(Self::Busy),
            3 => Some(Self::BusyInterim),
            4 => Some(Self::Finalize),
            5 => Some(Self::Finished),
            6 => Some(Self::Error),
            _ => None,
        }
    }

    /// True while a context may still accept `feed` calls.
    #[inline]
    pub const fn can_feed(&self) -> bool {
        matches!(self, Self::Init | Self::Busy | Self::BusyInterim)
    }

    /// True if class/Wöhler parameters may be changed in this state.
    #[inline]
    pub const fn can_set_params(&self) -> bool {
        matches!(self, Self::Init)
    }
}

impl Default for ContextState {
    fn default() -> Self {
        Self::Init0
    }
}
