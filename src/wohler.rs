//! Wöhler (S–N) fatigue curve model.
//!
//! Slopes are stored as negative numbers internally (`k`, `k2`); callers
//! supply magnitudes and the sign is normalized on construction.

use crate::error::{RfcError, Result};

/// Parametric bilinear Wöhler curve with a knee `(sx, nx)`, an optional
/// fatigue-strength floor `(sd, nd)`, and degradation exponents `q`, `q2`
/// used by the Miner-consequent update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WohlerCurve {
    /// Knee amplitude.
    pub sx: f64,
    /// Cycles to failure at the knee.
    pub nx: f64,
    /// Slope above the knee, stored negative, `|k| >= 1`.
    pub k: f64,
    /// Fatigue strength amplitude (cycles below this contribute no damage).
    pub sd: f64,
    /// Cycles to failure at the fatigue strength (`+inf` by default).
    pub nd: f64,
    /// Slope below the knee, stored negative, `|k2| >= 1`.
    pub k2: f64,
    /// Omission amplitude threshold.
    pub omission: f64,
    /// Degradation exponent for the upper slope (`|k| - 1` by default).
    pub q: f64,
    /// Degradation exponent for the lower slope (`|k2| - 1` by default).
    pub q2: f64,
}

impl Default for WohlerCurve {
    fn default() -> Self {
        Self {
            sx: 1e3,
            nx: 1e7,
            k: -5.0,
            sd: 0.0,
            nd: f64::INFINITY,
            k2: -5.0,
            omission: 0.0,
            q: 4.0,
            q2: 4.0,
        }
    }
}

impl WohlerCurve {
    fn normalize_slope(k: f64) -> Result<f64> {
        if !k.is_finite() || k.abs() < 1.0 {
            return Err(RfcError::InvalidArg(format!(
                "wohler slope magnitude must be >= 1, got {k}"
            )));
        }
        Ok(-k.abs())
    }

    /// Elementary curve: single slope `k` above the knee, no fatigue-strength
    /// floor (`sd = 0`, `nd = +inf`).
    pub fn elementary(sx: f64, nx: f64, k: f64) -> Result<Self> {
        let k = Self::normalize_slope(k)?;
        Ok(Self {
            sx,
            nx,
            k,
            sd: 0.0,
            nd: f64::INFINITY,
            k2: k,
            omission: 0.0,
            q: k.abs() - 1.0,
            q2: k.abs() - 1.0,
        })
    }

    /// Original curve: fatigue strength equals the knee (`sx == sd`, `nx == nd`).
    pub fn original(sd: f64, nd: f64, k: f64) -> Result<Self> {
        let k = Self::normalize_slope(k)?;
        Ok(Self {
            sx: sd,
            nx: nd,
            k,
            sd,
            nd,
            k2: k,
            omission: 0.0,
            q: k.abs() - 1.0,
            q2: k.abs() - 1.0,
        })
    }

    /// Modified curve: bilinear, with a fatigue-strength floor, two slopes.
    pub fn modified(sx: f64, nx: f64, k: f64, k2: f64) -> Result<Self> {
        let k = Self::normalize_slope(k)?;
        let k2 = Self::normalize_slope(k2)?;
        Ok(Self {
            sx,
            nx,
            k,
            sd: 0.0,
            nd: f64::INFINITY,
            k2,
            omission: 0.0,
            q: k.abs() - 1.0,
            q2: k2.abs() - 1.0,
        })
    }

    /// Construct from a fully specified struct, validating slopes.
    pub fn any(mut curve: Self) -> Result<Self> {
        curve.k = Self::normalize_slope(curve.k)?;
        curve.k2 = Self::normalize_slope(curve.k2)?;
        Ok(curve)
    }

    /// Cycles to failure at amplitude `sx` given slope `k` through `(nx_ref, sx_ref)`.
    pub fn calc_n(&self, sa: f64, sx_ref: f64, nx_ref: f64, k_abs: f64) -> f64 {
        nx_ref * (sx_ref / sa).powf(k_abs)
    }

    /// Knee amplitude solved from a reference point and slope.
    pub fn calc_sx(sa_ref: f64, n_ref: f64, nx: f64, k_abs: f64) -> f64 {
        sa_ref * (n_ref / nx).powf(1.0 / k_abs)
    }

    /// Fatigue-strength amplitude solved from the knee and lower slope.
    pub fn calc_sd(sx: f64, nx: f64, nd: f64, k2_abs: f64) -> f64 {
        sx * (nx / nd).powf(1.0 / k2_abs)
    }

    /// Lower slope solved from two points on the curve.
    pub fn calc_k2(sx: f64, nx: f64, sd: f64, nd: f64) -> f64 {
        (nd / nx).ln() / (sx / sd).ln()
    }

    /// Amplitude solved from a target life `n` on the upper branch.
    pub fn calc_sa(&self, n: f64) -> f64 {
        self.sx * (self.nx / n).powf(1.0 / self.k.abs())
    }

    /// Per-cycle damage for amplitude `sa`.
    ///
    /// `minimal` selects RFC_MINIMAL semantics: only the single upper-slope
    /// form is evaluated, ignoring omission and the fatigue-strength floor.
    pub fn damage(&self, sa: f64, minimal: bool) -> f64 {
        if sa <= 0.0 {
            return 0.0;
        }
        if minimal {
            return ((self.k.abs()) * (sa.ln() - self.sx.ln()) - self.nx.ln()).exp();
        }
        if sa <= self.omission {
            return 0.0;
        }
        if sa > self.sx {
            ((self.k.abs()) * (sa.ln() - self.sx.ln()) - self.nx.ln()).exp()
        } else if sa > self.sd {
            ((self.k2.abs()) * (sa.ln() - self.sx.ln()) - self.nx.ln()).exp()
        } else {
            0.0
        }
    }
}
