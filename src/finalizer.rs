//! Residue finalization policies.
//!
//! The pure, residue-shape-only policies (`HALFCYCLES`, `FULLCYCLES`,
//! `CLORMANN_SEEGER`, `RP_DIN45667`, and the seam-removal step of
//! `REPEATED`) are implemented here as functions over a tuple slice, the
//! way `evo_control_unit::safety::stop` dispatches a stop category to a
//! pure transition function. The policies that need the live
//! filter/detector/log (`REPEATED`'s re-feed, interim promotion, locking)
//! are orchestrated by [`crate::context::RainflowContext::finalize`],
//! which calls into this module for the shape-only part of each policy.

use crate::detector::closure_test;
use crate::residue::ValueTuple;

/// Residue-handling policy selected for `finalize(policy)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResiduePolicy {
    /// Promote the interim tuple; residue otherwise untouched.
    None,
    /// Alias of `None`.
    Ignore,
    /// Keep state; more feeds may follow.
    NoFinalize,
    /// Promote interim, then empty the residue without counting it.
    Discard,
    /// Count each adjacent residue pair once, weighted `half_inc`.
    HalfCycles,
    /// Count each adjacent residue pair once, weighted `full_inc`.
    FullCycles,
    /// Clormann/Seeger 4-window residue reduction.
    ClormannSeeger,
    /// DIN 45667 range-pair counting via matched-magnitude slopes.
    RpDin45667,
    /// Remove the seam cycle, then re-feed the remaining residue copy
    /// through the filter and detector.
    Repeated,
}

/// One cycle to be counted, produced by a shape-only finalization pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinalCycle {
    pub from: ValueTuple,
    pub to: ValueTuple,
    pub is_half: bool,
}

/// `HALFCYCLES` / `FULLCYCLES`: every adjacent pair in residue order.
pub fn adjacent_pairs(residue: &[ValueTuple], is_half: bool) -> Vec<FinalCycle> {
    residue
        .windows(2)
        .map(|w| FinalCycle {
            from: w[0],
            to: w[1],
            is_half,
        })
        .collect()
}

/// `CLORMANN_SEEGER`: scan `i, i+1, i+2, i+3`; if the two
/// inner slopes `B = residue[i+1]-residue[i]`, `C = residue[i+2]-residue[i+1]`
/// have opposite sign and `|D| >= |B| >= |C|` (`D = residue[i+3]-residue[i+2]`),
/// emit `(B,C)`'s endpoints as a full cycle and drop the two inner points.
pub fn clormann_seeger(residue: &[ValueTuple]) -> (Vec<FinalCycle>, Vec<ValueTuple>) {
    let mut buf: Vec<ValueTuple> = residue.to_vec();
    let mut cycles = Vec::new();
    let mut i = 0usize;
    while i + 3 < buf.len() {
        let b = buf[i + 1].value - buf[i].value;
        let c = buf[i + 2].value - buf[i + 1].value;
        let d = buf[i + 3].value - buf[i + 2].value;
        if b * c < 0.0 && d.abs() >= b.abs() && b.abs() >= c.abs() {
            cycles.push(FinalCycle {
                from: buf[i + 1],
                to: buf[i + 2],
                is_half: false,
            });
            buf.remove(i + 2);
            buf.remove(i + 1);
            // Re-examine from the same window start; don't advance i.
        } else {
            i += 1;
        }
    }
    (cycles, buf)
}

/// `RP_DIN45667`: build
/// `n-1` slopes, split into rising/falling groups sorted by `|slope|`
/// descending (ties broken by earlier `pos`), pair `rising[i]` with
/// `falling[i]`.
pub fn rp_din45667(residue: &[ValueTuple]) -> Vec<FinalCycle> {
    if residue.len() < 2 {
        return Vec::new();
    }
    #[derive(Clone, Copy)]
    struct Slope {
        from: ValueTuple,
        to: ValueTuple,
        magnitude: f64,
    }
    let mut rising = Vec::new();
    let mut falling = Vec::new();
    for w in residue.windows(2) {
        let delta = w[1].value - w[0].value;
        let slope = Slope {
            from: w[0],
            to: w[1],
            magnitude: delta.abs(),
        };
        if delta >= 0.0 {
            rising.push(slope);
        } else {
            falling.push(slope);
        }
    }
    let cmp = |a: &Slope, b: &Slope| {
        b.magnitude
            .partial_cmp(&a.magnitude)
            .unwrap_or(core::cmp::Ordering::Equal)
            .then(a.from.pos.cmp(&b.from.pos))
    };
    rising.sort_by(cmp);
    falling.sort_by(cmp);
    rising
        .into_iter()
        .zip(falling)
        .map(|(r, f)| FinalCycle {
            from: r.from,
            to: f.to,
            is_half: false,
        })
        .collect()
}

/// `REPEATED` seam removal: if the last four residue tuples satisfy the
/// same class-based 4-point closure test [`FourPointDetector`](crate::detector::FourPointDetector)
/// would apply, remove the two inner ones, matching what a fifth
/// wrap-around sample would have closed. Called in a loop by
/// [`crate::context::RainflowContext::finalize`] until no more seam
/// cycles close, then the de-seamed remainder is virtually re-fed through
/// a fresh filter/detector pair there to find cycles that only close once
/// the load history repeats.
pub fn remove_seam_cycle(residue: &[ValueTuple]) -> (Option<FinalCycle>, Vec<ValueTuple>) {
    if residue.len() < 4 {
        return (None, residue.to_vec());
    }
    let n = residue.len();
    let a = residue[n - 4];
    let b = residue[n - 3];
    let c = residue[n - 2];
    let d = residue[n - 1];
    if closure_test(&a, &b, &c, &d) {
        let mut buf = residue.to_vec();
        buf.remove(n - 2);
        buf.remove(n - 3);
        (
            Some(FinalCycle {
                from: b,
                to: c,
                is_half: false,
            }),
            buf,
        )
    } else {
        (None, residue.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tup(v: f64, pos: u64) -> ValueTuple {
        ValueTuple::new(v, v as u16, pos)
    }

    #[test]
    fn adjacent_pairs_counts_every_window() {
        let res = vec![tup(1.0, 1), tup(4.0, 2), tup(2.0, 3)];
        let cycles = adjacent_pairs(&res, true);
        assert_eq!(cycles.len(), 2);
        assert!(cycles.iter().all(|c| c.is_half));
    }

    #[test]
    fn clormann_seeger_closes_matching_window() {
        // slopes: +3 (1->4), -2 (4->2), +4 (2->6): b=3,c=-2,d=4.
        // b*c = -6 < 0, |d|=4>=|b|=3>=|c|=2 -> closes (4,2).
        let res = vec![tup(1.0, 1), tup(4.0, 2), tup(2.0, 3), tup(6.0, 4)];
        let (cycles, rest) = clormann_seeger(&res);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].from.value, 4.0);
        assert_eq!(cycles[0].to.value, 2.0);
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn rp_din45667_pairs_matched_magnitudes() {
        let res = vec![tup(0.0, 1), tup(5.0, 2), tup(1.0, 3), tup(4.0, 4)];
        // slopes: +5 (rising), -4 (falling), +3 (rising)
        let cycles = rp_din45667(&res);
        assert_eq!(cycles.len(), 1); // min(rising.len(), falling.len()) == 1
    }

    #[test]
    fn remove_seam_cycle_detects_four_point_closure() {
        let res = vec![tup(1.0, 1), tup(3.0, 2), tup(2.0, 3), tup(4.0, 4)];
        let (closed, rest) = remove_seam_cycle(&res);
        assert!(closed.is_some());
        assert_eq!(rest.len(), 2);
    }
}
