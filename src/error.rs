//! Error type for the rainflow engine.
//!
//! Mirrors the error categories reported by the context state machine. Once a context enters
//! [`crate::state::ContextState::Error`] every operation but `deinit`/`reset`
//! fails with the sticky error recorded at the time of the fault.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, RfcError>;

/// All error categories a [`crate::context::RainflowContext`] can raise.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RfcError {
    /// Bad class parameters, unsupported method combination, bad `at_init`
    /// curve, or setting class parameters while the state disallows it.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Allocator/capacity refusal; arrays remain at their previous valid state.
    #[error("capacity exceeded: {0}")]
    Memory(String),

    /// Sample outside the class range and `AUTORESIZE` is not enabled.
    #[error("sample {value} out of class range [{lo}, {hi})")]
    DataOutOfRange { value: f64, lo: f64, hi: f64 },

    /// A pre-quantized tuple disagrees with its value.
    #[error("inconsistent data: {0}")]
    DataInconsistent(String),

    /// Turning-point log invariant breached (bad `tp_pos`/`adj_pos`, locked log write).
    #[error("turning-point log error: {0}")]
    TurningPoint(String),

    /// Amplitude-transform curve or evaluation error.
    #[error("amplitude transform error: {0}")]
    AmplitudeTransform(String),

    /// Damage history error (capacity, or attribution past the array bound).
    #[error("damage history error: {0}")]
    DamageHistory(String),

    /// `feed`/`dh` called with a stream pointer inconsistent with prior feeds.
    #[error("damage history stream inconsistent with prior feed")]
    DamageHistoryBadStream,

    /// Damage lookup table is stale or was queried before being built.
    #[error("damage lookup table error: {0}")]
    Lut(String),

    /// Requested feature not compiled in (see Cargo features in SPEC_FULL.md).
    #[error("unsupported: {0}")]
    Unsupported(String),
}
