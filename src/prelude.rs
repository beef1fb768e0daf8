//! Convenient re-exports: `use rainflow::prelude::*;` pulls in the types
//! most callers touch without listing individual module paths.

#[cfg(feature = "at")]
pub use crate::amplitude_transform::AmplitudeTransform;
pub use crate::class::ClassParam;
pub use crate::context::{DetectorKind, RainflowContext};
pub use crate::damage::DamageMethod;
pub use crate::error::{Result, RfcError};
pub use crate::filter::HysteresisMeasure;
pub use crate::finalizer::ResiduePolicy;
pub use crate::flags::{CountFlags, DebugFlags};
pub use crate::residue::ValueTuple;
#[cfg(feature = "ar")]
pub use crate::spreading::SpreadMethod;
pub use crate::state::ContextState;
pub use crate::wohler::WohlerCurve;

#[cfg(feature = "serde")]
pub use crate::config::{ConfigError, RfcConfig};
