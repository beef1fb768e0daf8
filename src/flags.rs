//! Operation and debug bitflags.
//!
//! A plain `bitflags!` struct with a `Default` of `empty()` and small
//! derived helpers, rather than a loose collection of `bool` fields.

use bitflags::bitflags;

bitflags! {
    /// Operation flags controlling what the aggregator counts and what
    /// optional subsystems are active for a context.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CountFlags: u16 {
        /// Accumulate the rainflow from→to matrix.
        const COUNT_RFM      = 0x0001;
        /// Accumulate the range-pair histogram.
        const COUNT_RP       = 0x0002;
        /// Accumulate rising-slope level crossings.
        const COUNT_LC_UP    = 0x0004;
        /// Accumulate falling-slope level crossings.
        const COUNT_LC_DN    = 0x0008;
        /// Accumulate pseudo-damage.
        const COUNT_DAMAGE   = 0x0010;
        /// Distribute damage onto the damage-history array.
        const COUNT_DH       = 0x0020;
        /// Run the Miner-consequent (impaired Wöhler) update after each cycle.
        const COUNT_MK       = 0x0040;
        /// Force the first and last sample into the turning-point log.
        const ENFORCE_MARGIN = 0x0080;
        /// Auto-prune the turning-point log once it exceeds its threshold.
        const TPAUTOPRUNE    = 0x0100;
        /// Preserve absolute stream `pos` fields when pruning.
        const TPPRUNE_PRESERVE_POS = 0x0200;
        /// Never prune turning points still referenced by the residue.
        const TPPRUNE_PRESERVE_RES = 0x0400;
        /// Grow the class range instead of rejecting out-of-range samples.
        const AUTORESIZE     = 0x0800;

        /// Both level-crossing directions.
        const COUNT_LC = Self::COUNT_LC_UP.bits() | Self::COUNT_LC_DN.bits();

        /// Default mask: rainflow matrix + damage, with turning-point preservation.
        const COUNT_ALL = Self::COUNT_RFM.bits()
            | Self::COUNT_RP.bits()
            | Self::COUNT_LC.bits()
            | Self::COUNT_DAMAGE.bits()
            | Self::COUNT_DH.bits()
            | Self::COUNT_MK.bits()
            | Self::TPPRUNE_PRESERVE_RES.bits();
    }
}

impl Default for CountFlags {
    fn default() -> Self {
        Self::COUNT_RFM | Self::COUNT_DAMAGE | Self::TPPRUNE_PRESERVE_RES
    }
}

bitflags! {
    /// Debug-only bitflags; never consulted by counting logic.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugFlags: u8 {
        /// Log every turning point as it is confirmed.
        const LOG_TP      = 0x01;
        /// Log every closed cycle as it is detected.
        const LOG_CYCLES  = 0x02;
        /// Log finalizer policy dispatch.
        const LOG_FINALIZE = 0x04;
    }
}

impl Default for DebugFlags {
    fn default() -> Self {
        Self::empty()
    }
}
