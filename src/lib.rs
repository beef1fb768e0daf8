//! Streaming rainflow cycle-counting and fatigue-damage engine.
//!
//! Feeds a 1D load time series through a hysteresis turning-point filter,
//! closes hysteresis cycles with a pluggable detector (4-point by default;
//! HCM or ASTM 3-point behind their feature flags), and accumulates the
//! result into a rainflow matrix, range-pair and level-crossing histograms,
//! and a running Palmgren-Miner pseudo-damage sum. [`context::RainflowContext`]
//! is the entry point; [`prelude`] re-exports the common types.
//!
//! ```
//! use rainflow::prelude::*;
//!
//! let class = ClassParam::new(64, 1.0, 0.0).unwrap();
//! let wohler = WohlerCurve::elementary(1e3, 1e7, 5.0).unwrap();
//! let mut ctx = RainflowContext::init(
//!     class,
//!     wohler,
//!     0.5,
//!     HysteresisMeasure::Value,
//!     DetectorKind::FourPoint,
//! )
//! .unwrap();
//! for v in [2.0, 30.0, 5.0, 40.0, 10.0] {
//!     ctx.feed(v).unwrap();
//! }
//! ctx.finalize(ResiduePolicy::HalfCycles).unwrap();
//! println!("damage = {}", ctx.damage());
//! ```

pub mod aggregator;
#[cfg(feature = "at")]
pub mod amplitude_transform;
pub mod class;
#[cfg(feature = "serde")]
pub mod config;
pub mod context;
pub mod damage;
pub mod detector;
#[cfg(feature = "dh")]
pub mod dh;
pub mod error;
pub mod filter;
pub mod finalizer;
pub mod flags;
pub mod miner;
pub mod prelude;
pub mod residue;
#[cfg(feature = "ar")]
pub mod spreading;
pub mod state;
#[cfg(feature = "tp")]
pub mod tp_log;
pub mod wohler;
