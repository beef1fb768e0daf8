//! Mean-stress amplitude transformation (Haigh diagram).

use crate::error::{RfcError, Result};

/// A reference curve point `(Sm_norm, alleviation)` where `Sm_norm = Sm/Sa`
/// and `alleviation` is the amplitude multiplier at that normalized mean.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CurvePoint {
    sm_norm: f64,
    alleviation: f64,
}

/// Amplitude transform configuration, either a user-supplied reference
/// curve or one synthesized from a mean-stress sensitivity `M`.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeTransform {
    curve: Vec<CurvePoint>,
    m: f64,
    sm_rig: f64,
    r_rig: f64,
    r_pinned: bool,
}

impl AmplitudeTransform {
    /// Build from an explicit reference curve (`Sa[]`, `Sm[]`), or synthesize
    /// one from `M` when `sa.is_empty()`.
    ///
    /// # Errors
    /// `RfcError::AmplitudeTransform` if an explicit curve violates
    /// monotonicity: `Sa[i] > 0`, `Sm[i] < Sm[i+1]`,
    /// `Sm[i]/Sa[i] < Sm[i+1]/Sa[i+1]`.
    pub fn new(
        sa: &[f64],
        sm: &[f64],
        m: f64,
        sm_rig: f64,
        r_rig: f64,
        r_pinned: bool,
        symmetric: bool,
    ) -> Result<Self> {
        if sa.len() != sm.len() {
            return Err(RfcError::AmplitudeTransform(
                "Sa and Sm arrays must have equal length".into(),
            ));
        }
        let curve = if sa.len() >= 2 {
            Self::validate_and_build(sa, sm)?
        } else {
            Self::synthesize(m, symmetric)
        };
        Ok(Self {
            curve,
            m,
            sm_rig,
            r_rig,
            r_pinned,
        })
    }

    fn validate_and_build(sa: &[f64], sm: &[f64]) -> Result<Vec<CurvePoint>> {
        for i in 0..sa.len() {
            if sa[i] <= 0.0 {
                return Err(RfcError::AmplitudeTransform(format!(
                    "Sa[{i}] must be > 0"
                )));
            }
        }
        for i in 0..sa.len() - 1 {
            if !(sm[i] < sm[i + 1]) {
                return Err(RfcError::AmplitudeTransform(format!(
                    "Sm must be strictly increasing at index {i}"
                )));
            }
            if !(sm[i] / sa[i] < sm[i + 1] / sa[i + 1]) {
                return Err(RfcError::AmplitudeTransform(format!(
                    "Sm/Sa must be strictly increasing at index {i}"
                )));
            }
        }
        Ok(sa
            .iter()
            .zip(sm.iter())
            .map(|(&a, &m)| CurvePoint {
                sm_norm: m / a,
                alleviation: 1.0,
            })
            .collect())
    }

    /// Synthesize a 3-point (asymmetric) or 5-point (symmetric) curve from
    /// `M` using the closed-form segment intersections.
    fn synthesize(m: f64, symmetric: bool) -> Vec<CurvePoint> {
        let sa_r_inf = if m < 1.0 { 1.0 / (1.0 - m) } else { f64::INFINITY };
        let sa_r0 = 1.0 / (1.0 + m);
        let sa_rhalf = sa_r0 * (1.0 + m / 3.0) / (1.0 + m);

        // Normalized means: R=-1 -> Sm_norm=0; R=0 -> Sm_norm=1; R=1/2 -> Sm_norm=3.
        let mut points = vec![
            CurvePoint {
                sm_norm: 0.0,
                alleviation: 1.0,
            },
            CurvePoint {
                sm_norm: 1.0,
                alleviation: sa_r0,
            },
            CurvePoint {
                sm_norm: 3.0,
                alleviation: sa_rhalf,
            },
        ];
        if symmetric {
            points.insert(
                0,
                CurvePoint {
                    sm_norm: -1.0,
                    alleviation: sa_r_inf,
                },
            );
            points.push(CurvePoint {
                sm_norm: 5.0,
                alleviation: sa_rhalf,
            });
        }
        points
    }

    /// Locate the alleviation factor at normalized mean `sm_norm` by finding
    /// the bracketing curve segment and interpolating along the ray of slope
    /// `1/sm_norm`.
    fn alleviation_at(&self, sm_norm: f64) -> f64 {
        if self.curve.is_empty() {
            return 1.0;
        }
        if sm_norm <= self.curve[0].sm_norm {
            return self.curve[0].alleviation;
        }
        let last = self.curve.len() - 1;
        if sm_norm >= self.curve[last].sm_norm {
            return self.curve[last].alleviation;
        }
        for w in self.curve.windows(2) {
            let (a, b) = (w[0], w[1]);
            if sm_norm >= a.sm_norm && sm_norm <= b.sm_norm {
                let span = b.sm_norm - a.sm_norm;
                if span.abs() < f64::EPSILON {
                    return a.alleviation;
                }
                let t = (sm_norm - a.sm_norm) / span;
                return a.alleviation + t * (b.alleviation - a.alleviation);
            }
        }
        self.curve[last].alleviation
    }

    /// Transform `(Sa, Sm)` into the alleviated amplitude `Sa'`.
    pub fn transform(&self, sa: f64, sm: f64) -> f64 {
        if sa <= 0.0 {
            return sa;
        }
        if self.curve.len() < 3 && self.m == 0.0 {
            return sa;
        }
        let base = self.alleviation_at(0.0);
        let target_norm = if self.r_pinned {
            (1.0 + self.r_rig) / (1.0 - self.r_rig)
        } else {
            self.sm_rig / sa
        };
        let target = self.alleviation_at(target_norm);
        sa * target / base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_no_curve_and_zero_m() {
        let at = AmplitudeTransform::new(&[], &[], 0.0, 0.0, 0.0, true, false).unwrap();
        assert_eq!(at.transform(100.0, 50.0), 100.0);
    }

    #[test]
    fn rejects_non_monotone_curve() {
        let sa = [100.0, 90.0];
        let sm = [0.0, 50.0];
        assert!(AmplitudeTransform::new(&sa, &sm, 0.0, 0.0, 0.0, true, false).is_err());
    }

    #[test]
    fn rejects_non_increasing_sm() {
        let sa = [100.0, 100.0];
        let sm = [50.0, 50.0];
        assert!(AmplitudeTransform::new(&sa, &sm, 0.0, 0.0, 0.0, true, false).is_err());
    }

    #[test]
    fn synthesized_curve_pinned_r0_matches_closed_form() {
        let m = 0.3;
        let at = AmplitudeTransform::new(&[], &[], m, 0.0, 0.0, true, false).unwrap();
        // R_pinned with R_rig = 0 -> Sm_norm target = 1.0, matching curve point 1 exactly.
        let sa = 200.0;
        let sm = sa; // R = 0 means Sm = Sa
        let transformed = at.transform(sa, sm);
        let expected = sa * (1.0 / (1.0 + m)) / 1.0;
        assert!((transformed - expected).abs() < 1e-9);
    }

    #[test]
    fn accepts_valid_explicit_curve() {
        let sa = [100.0, 80.0, 60.0];
        let sm = [0.0, 40.0, 90.0];
        assert!(AmplitudeTransform::new(&sa, &sm, 0.0, 0.0, 0.0, true, false).is_ok());
    }
}
