//! Cycle detectors.
//!
//! Exactly one detector is active per context. The default path
//! (4-point / HCM / ASTM) is monomorphized on the [`DetectorKind`] enum
//! in [`Detector`]; a host supplying its own detector (`DELEGATED`) goes
//! through a boxed [`CycleDetector`] trait object instead — an enum for
//! the default path, a trait object for the custom one.

#[cfg(feature = "astm")]
mod astm;
mod four_point;
#[cfg(feature = "hcm")]
mod hcm;

#[cfg(feature = "astm")]
pub use astm::AstmDetector;
pub(crate) use four_point::closure_test;
pub use four_point::FourPointDetector;
#[cfg(feature = "hcm")]
pub use hcm::HcmDetector;

use crate::error::Result;
use crate::residue::{Residue, ValueTuple};

/// A closed hysteresis cycle emitted by a detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosedCycle {
    /// Turning point the cycle started from.
    pub from: ValueTuple,
    /// Turning point the cycle closed at.
    pub to: ValueTuple,
    /// The turning point after `to`, when available (used by the `_24`
    /// damage-spreading variants).
    pub next: Option<ValueTuple>,
    /// `true` for a half-cycle closure (ASTM), weighting damage/counts by
    /// `half_inc` instead of `full_inc`.
    pub is_half: bool,
}

/// Trait object surface for a custom (`DELEGATED`) detector.
pub trait CycleDetector {
    /// Consume one newly confirmed turning point, mutating `residue` and
    /// invoking `emit` for every cycle closed as a result.
    fn feed(
        &mut self,
        tuple: ValueTuple,
        residue: &mut Residue,
        emit: &mut dyn FnMut(ClosedCycle),
    ) -> Result<()>;
}

/// Detector selector.
pub enum Detector {
    /// No detector; turning points accumulate in the residue unclosed.
    None,
    FourPoint(FourPointDetector),
    #[cfg(feature = "hcm")]
    Hcm(HcmDetector),
    #[cfg(feature = "astm")]
    Astm(AstmDetector),
    Delegated(Box<dyn CycleDetector>),
}

impl core::fmt::Debug for Detector {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Detector::None => "None",
            Detector::FourPoint(_) => "FourPoint",
            #[cfg(feature = "hcm")]
            Detector::Hcm(_) => "Hcm",
            #[cfg(feature = "astm")]
            Detector::Astm(_) => "Astm",
            Detector::Delegated(_) => "Delegated",
        };
        write!(f, "Detector::{name}")
    }
}

impl Detector {
    /// Feed one newly confirmed turning point through the active detector.
    ///
    /// `eps` is the HCM inflection tolerance (`class_width / 100`),
    /// ignored by the other detectors.
    pub fn feed(
        &mut self,
        tuple: ValueTuple,
        residue: &mut Residue,
        eps: f64,
        emit: &mut dyn FnMut(ClosedCycle),
    ) -> Result<()> {
        match self {
            Detector::None => residue.push(tuple),
            Detector::FourPoint(d) => d.feed(tuple, residue, emit),
            #[cfg(feature = "hcm")]
            Detector::Hcm(d) => {
                d.feed(tuple, eps, emit);
                residue.replace_all(d.stack_snapshot());
                Ok(())
            }
            #[cfg(feature = "astm")]
            Detector::Astm(d) => d.feed(tuple, residue, emit),
            Detector::Delegated(d) => d.feed(tuple, residue, emit),
        }
    }

    /// A fresh instance of the same kind, holding none of the live
    /// detector's accumulated state. `None` for `Delegated`: a boxed
    /// custom detector can't be cloned, so a virtual re-feed has nothing
    /// safe to construct and is skipped for that kind.
    pub(crate) fn fresh_like(&self) -> Option<Detector> {
        match self {
            Detector::None => Some(Detector::None),
            Detector::FourPoint(_) => Some(Detector::FourPoint(FourPointDetector)),
            #[cfg(feature = "hcm")]
            Detector::Hcm(_) => Some(Detector::Hcm(HcmDetector::new())),
            #[cfg(feature = "astm")]
            Detector::Astm(_) => Some(Detector::Astm(AstmDetector)),
            Detector::Delegated(_) => None,
        }
    }
}
