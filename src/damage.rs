//! Per-cycle damage model: amplitude/mean from a class pair, optional
//! amplitude transform, and a lazily rebuilt lookup table keyed by
//! `(from_class, to_class)`.

#[cfg(feature = "at")]
use crate::amplitude_transform::AmplitudeTransform;
use crate::class::ClassParam;
use crate::wohler::WohlerCurve;

/// Selects which Wöhler-curve variant `damage_from_rp`/`damage_from_rfm`
/// evaluate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageMethod {
    /// Whatever curve is currently installed on the context.
    Default,
    /// Force a single slope (`k`) everywhere, no fatigue-strength floor.
    Elementary,
    /// Bilinear curve, no Miner-consequent degradation.
    Modified,
    /// Miner-consequent (impaired) curve.
    Consequent,
}

/// Owns the class/Wöhler/AT configuration needed to turn a class pair or
/// amplitude into a pseudo-damage value, plus an optional LUT.
#[derive(Debug, Clone)]
pub struct DamageCalculator {
    class: ClassParam,
    wohler: WohlerCurve,
    #[cfg(feature = "at")]
    at: Option<AmplitudeTransform>,
    minimal: bool,
    lut: Option<Vec<f64>>,
}

impl DamageCalculator {
    pub fn new(class: ClassParam, wohler: WohlerCurve, minimal: bool) -> Self {
        Self {
            class,
            wohler,
            #[cfg(feature = "at")]
            at: None,
            minimal,
            lut: None,
        }
    }

    pub fn set_class(&mut self, class: ClassParam) {
        self.class = class;
        self.invalidate_lut();
    }

    pub fn set_wohler(&mut self, wohler: WohlerCurve) {
        self.wohler = wohler;
        self.invalidate_lut();
    }

    pub fn wohler(&self) -> &WohlerCurve {
        &self.wohler
    }

    #[cfg(feature = "at")]
    pub fn set_amplitude_transform(&mut self, at: Option<AmplitudeTransform>) {
        self.at = at;
        self.invalidate_lut();
    }

    /// Any mutation of class or Wöhler parameters invalidates the LUT
    ///: it is rebuilt lazily on next `damage_for_pair`.
    pub fn invalidate_lut(&mut self) {
        self.lut = None;
    }

    fn amplitude_mean(&self, from: u16, to: u16) -> (f64, f64) {
        (
            self.class.pair_amplitude(from, to),
            self.class.pair_mean(from, to),
        )
    }

    /// Per-cycle damage for amplitude `sa` directly (no class quantization).
    pub fn damage_for_amplitude(&self, sa: f64) -> f64 {
        self.wohler.damage(sa, self.minimal)
    }

    /// Alleviated amplitude for a closed class pair, honoring the amplitude
    /// transform when configured, without evaluating the
    /// Wöhler curve. Used directly by Miner-consequent, which evaluates
    /// against its own impaired curve rather than `self.wohler`.
    pub fn amplitude_for_pair(&self, from: u16, to: u16) -> f64 {
        #[cfg(feature = "at")]
        {
            let (sa, sm) = self.amplitude_mean(from, to);
            match &self.at {
                Some(at) => at.transform(sa, sm),
                None => sa,
            }
        }
        #[cfg(not(feature = "at"))]
        {
            self.amplitude_mean(from, to).0
        }
    }

    /// Per-cycle damage for a closed class pair, honoring the amplitude
    /// transform when configured.
    pub fn damage_for_pair(&self, from: u16, to: u16) -> f64 {
        let sa = self.amplitude_for_pair(from, to);
        self.damage_for_amplitude(sa)
    }

    /// Build (or rebuild) the damage LUT when `damage_fast` is enabled.
    #[cfg(feature = "damage_fast")]
    pub fn build_lut(&mut self) {
        let n = self.class.count() as usize;
        let mut lut = vec![0.0; n * n];
        for from in 0..n {
            for to in 0..n {
                lut[from * n + to] = self.damage_for_pair(from as u16, to as u16);
            }
        }
        self.lut = Some(lut);
    }

    /// Damage for a class pair, using the LUT when built, computing and
    /// caching on first access otherwise.
    #[cfg(feature = "damage_fast")]
    pub fn damage_for_pair_cached(&mut self, from: u16, to: u16) -> f64 {
        if self.lut.is_none() {
            self.build_lut();
        }
        let n = self.class.count() as usize;
        self.lut.as_ref().unwrap()[from as usize * n + to as usize]
    }

    /// `damage_from_rfm`: total damage implied by a rainflow matrix.
    pub fn damage_from_rfm(&self, rfm: &[u64], class_count: u16, full_inc: u32) -> f64 {
        let n = class_count as usize;
        let mut total = 0.0;
        for from in 0..n {
            for to in 0..n {
                let count = rfm[from * n + to];
                if count == 0 {
                    continue;
                }
                let d = self.damage_for_pair(from as u16, to as u16);
                total += d * (count as f64 / full_inc as f64);
            }
        }
        total
    }

    /// `damage_from_rp`: total damage implied by a range-pair histogram,
    /// dispatching the Wöhler-curve variant per `method`.
    pub fn damage_from_rp(&self, rp: &[u64], full_inc: u32, method: DamageMethod) -> f64 {
        let wl = match method {
            DamageMethod::Default | DamageMethod::Consequent => self.wohler,
            DamageMethod::Elementary => WohlerCurve {
                k2: self.wohler.k,
                sd: 0.0,
                nd: f64::INFINITY,
                q2: self.wohler.q,
                ..self.wohler
            },
            DamageMethod::Modified => WohlerCurve {
                sd: 0.0,
                nd: f64::INFINITY,
                ..self.wohler
            },
        };
        rp.iter()
            .enumerate()
            .map(|(delta, &count)| {
                if count == 0 {
                    return 0.0;
                }
                let sa = delta as f64 * self.class.width() / 2.0;
                wl.damage(sa, self.minimal) * (count as f64 / full_inc as f64)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> DamageCalculator {
        let class = ClassParam::new(6, 1.0, 0.0).unwrap();
        let wohler = WohlerCurve::elementary(1e3, 1e7, 5.0).unwrap();
        DamageCalculator::new(class, wohler, false)
    }

    #[test]
    fn damage_for_pair_matches_amplitude_form() {
        let c = calc();
        let (sa, _) = c.amplitude_mean(1, 5);
        let direct = c.damage_for_amplitude(sa);
        assert_eq!(c.damage_for_pair(1, 5), direct);
    }

    #[cfg(feature = "damage_fast")]
    #[test]
    fn cached_lut_matches_uncached() {
        let mut c = calc();
        let direct = c.damage_for_pair(1, 5);
        let cached = c.damage_for_pair_cached(1, 5);
        assert_eq!(direct, cached);
    }

    #[test]
    fn damage_from_rfm_matches_damage_from_rp_under_default() {
        let c = calc();
        let n = 6usize;
        let mut rfm = vec![0u64; n * n];
        rfm[1 * n + 5] = 2;
        rfm[0 * n + 3] = 2;
        let rp = c.damage_for_pair(0, 0); // sanity no-op to keep rp derivation local
        let _ = rp;
        let mut rp_hist = vec![0u64; n];
        rp_hist[4] += 2; // |1-5|=4
        rp_hist[3] += 2; // |0-3|=3
        let from_rfm = c.damage_from_rfm(&rfm, n as u16, 2);
        let from_rp = c.damage_from_rp(&rp_hist, 2, DamageMethod::Default);
        assert!((from_rfm - from_rp).abs() < 1e-9);
    }
}
