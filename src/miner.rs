//! Miner-consequent (impaired) Wöhler curve degradation.
//!
//! Each cycle's damage is evaluated against the *currently* impaired curve,
//! then folds into a shadow counter `d_con` that shrinks the knee and
//! fatigue-strength amplitudes for the next cycle. This is strictly
//! sequential — unlike [`crate::damage::DamageCalculator`]'s other methods,
//! which are pure functions of a class pair, consequent damage is a fold
//! over cycle order.

use crate::wohler::WohlerCurve;

/// Wraps a base (unimpaired) [`WohlerCurve`] with the running consequent
/// damage fraction `d_con`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinerConsequent {
    base: WohlerCurve,
    d_con: f64,
}

impl MinerConsequent {
    pub fn new(base: WohlerCurve) -> Self {
        Self { base, d_con: 0.0 }
    }

    pub fn base(&self) -> &WohlerCurve {
        &self.base
    }

    pub fn set_base(&mut self, base: WohlerCurve) {
        self.base = base;
    }

    pub fn d_con(&self) -> f64 {
        self.d_con
    }

    /// Reset the shadow counter, e.g. on `clear_counts`.
    pub fn reset(&mut self) {
        self.d_con = 0.0;
    }

    /// Knee and fatigue-strength amplitudes shrunk by the cumulative damage
    /// so far: `sx_imp = sx * (1 - d_con)^(1/q)`, `sd_imp = sd * (1 -
    /// d_con)^(1/q2)`. Slopes and life targets are unaffected.
    pub fn impaired_curve(&self) -> WohlerCurve {
        let shrink = (1.0 - self.d_con).max(0.0);
        let sx_factor = if self.base.q > 0.0 {
            shrink.powf(1.0 / self.base.q)
        } else {
            1.0
        };
        let sd_factor = if self.base.q2 > 0.0 {
            shrink.powf(1.0 / self.base.q2)
        } else {
            1.0
        };
        WohlerCurve {
            sx: self.base.sx * sx_factor,
            sd: self.base.sd * sd_factor,
            ..self.base
        }
    }

    /// Evaluate damage for one cycle against the currently impaired curve,
    /// then fold that damage into `d_con` for the next call.
    pub fn damage_and_degrade(&mut self, sa: f64, minimal: bool) -> f64 {
        let curve = self.impaired_curve();
        let d = curve.damage(sa, minimal);
        self.d_con = (self.d_con + d).min(1.0 - f64::EPSILON).max(0.0);
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_counter_matches_base_curve() {
        let base = WohlerCurve::modified(1e3, 1e7, 5.0, 8.0).unwrap();
        let mc = MinerConsequent::new(base);
        let imp = mc.impaired_curve();
        assert_eq!(imp.sx, base.sx);
        assert_eq!(imp.sd, base.sd);
    }

    #[test]
    fn accumulating_damage_shrinks_knee_amplitude() {
        let base = WohlerCurve::modified(1e3, 1e7, 5.0, 8.0).unwrap();
        let mut mc = MinerConsequent::new(base);
        let d1 = mc.damage_and_degrade(1500.0, false);
        assert!(d1 > 0.0);
        assert!(mc.d_con() > 0.0);
        let shrunk = mc.impaired_curve();
        assert!(shrunk.sx < base.sx);
    }

    #[test]
    fn reset_restores_unimpaired_curve() {
        let base = WohlerCurve::modified(1e3, 1e7, 5.0, 8.0).unwrap();
        let mut mc = MinerConsequent::new(base);
        mc.damage_and_degrade(1500.0, false);
        mc.reset();
        assert_eq!(mc.d_con(), 0.0);
        assert_eq!(mc.impaired_curve().sx, base.sx);
    }

    #[test]
    fn degradation_never_pushes_d_con_past_one() {
        let base = WohlerCurve::elementary(1.0, 10.0, 2.0).unwrap();
        let mut mc = MinerConsequent::new(base);
        for _ in 0..100 {
            mc.damage_and_degrade(1e6, false);
        }
        assert!(mc.d_con() < 1.0);
    }
}
