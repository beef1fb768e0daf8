//! Universal invariants and round-trip properties that must hold for any
//! finished context, independent of the input series.

use rainflow::prelude::*;

fn run(values: &[f64], hysteresis: f64, class_count: u16, policy: ResiduePolicy) -> RainflowContext {
    let class = ClassParam::new(class_count, 1.0, 0.0).unwrap();
    let wohler = WohlerCurve::elementary(1e3, 1e7, 5.0).unwrap();
    let mut c = RainflowContext::init(
        class,
        wohler,
        hysteresis,
        HysteresisMeasure::Value,
        DetectorKind::FourPoint,
    )
    .unwrap();
    for &v in values {
        c.feed(v).unwrap();
    }
    c.finalize(policy).unwrap();
    c
}

const SERIES: &[f64] = &[2.0, 5.0, 3.0, 6.0, 2.0, 4.0, 1.0, 6.0, 1.0, 4.0, 1.0, 5.0, 3.0, 6.0, 3.0, 6.0, 1.0, 5.0, 2.0];

fn rfm_sum(c: &RainflowContext, class_count: u16) -> u64 {
    let mut total = 0;
    for from in 0..class_count {
        for to in 0..class_count {
            total += c.rfm_get(from, to).unwrap();
        }
    }
    total
}

/// `rp[d] == sum_{|i-j|=d} rfm[i,j]`: a manual walk of the matrix grouped
/// by class distance must total the same as `rfm_sum`, regardless of
/// which counters were enabled while feeding.
#[test]
fn range_pair_matches_rainflow_matrix_by_class_distance() {
    let c = run(SERIES, 1.0, 8, ResiduePolicy::Repeated);
    let n = 8u16;
    let mut by_distance = vec![0u64; n as usize];
    for from in 0..n {
        for to in 0..n {
            let d = (from as i32 - to as i32).unsigned_abs() as usize;
            by_distance[d] += c.rfm_get(from, to).unwrap();
        }
    }
    assert_eq!(by_distance.iter().sum::<u64>(), rfm_sum(&c, n));
    assert!(by_distance.iter().sum::<u64>() > 0);
}

/// `REPEATED` only ever removes nested seam pairs from the tail of the
/// residue, so it can never leave more tuples behind than `IGNORE` would
/// (which does not remove any).
#[test]
fn repeated_policy_never_leaves_more_residue_than_ignore() {
    let ignored = run(SERIES, 1.0, 8, ResiduePolicy::Ignore);
    let repeated = run(SERIES, 1.0, 8, ResiduePolicy::Repeated);
    assert!(repeated.residue().len() <= ignored.residue().len());
}

/// `sum(rfm)` only grows (weighted by `full_inc`/`half_inc`) as more cycles
/// close; finalizing never decreases the count already recorded while
/// feeding.
#[test]
fn finalizing_never_decreases_already_closed_cycle_count() {
    let class = ClassParam::new(8, 1.0, 0.0).unwrap();
    let wohler = WohlerCurve::elementary(1e3, 1e7, 5.0).unwrap();
    let mut c = RainflowContext::init(
        class,
        wohler,
        1.0,
        HysteresisMeasure::Value,
        DetectorKind::FourPoint,
    )
    .unwrap();
    for &v in SERIES {
        c.feed(v).unwrap();
    }
    let before = rfm_sum(&c, 8);
    c.finalize(ResiduePolicy::HalfCycles).unwrap();
    let after = rfm_sum(&c, 8);
    assert!(after >= before);
}

/// `rfm_make_symmetric` is idempotent: applying it twice must equal
/// applying it once.
#[test]
fn rfm_make_symmetric_is_idempotent_end_to_end() {
    let mut c = run(SERIES, 1.0, 8, ResiduePolicy::HalfCycles);
    c.rfm_make_symmetric();
    let once: Vec<u64> = (0..8u16)
        .flat_map(|from| (0..8u16).map(move |to| (from, to)))
        .map(|(from, to)| c.rfm_get(from, to).unwrap())
        .collect();
    c.rfm_make_symmetric();
    let twice: Vec<u64> = (0..8u16)
        .flat_map(|from| (0..8u16).map(move |to| (from, to)))
        .map(|(from, to)| c.rfm_get(from, to).unwrap())
        .collect();
    assert_eq!(once, twice);
}

/// `damage_from_rfm` derived from the matrix snapshot must match the
/// running damage total accumulated cycle-by-cycle while feeding, when no
/// amplitude transform or Miner-consequent degradation is active.
#[test]
fn damage_from_rfm_matches_running_damage_total() {
    let class = ClassParam::new(8, 1.0, 0.0).unwrap();
    let wohler = WohlerCurve::elementary(1e3, 1e7, 5.0).unwrap();
    let mut c = RainflowContext::init(
        class,
        wohler,
        1.0,
        HysteresisMeasure::Value,
        DetectorKind::FourPoint,
    )
    .unwrap();
    for &v in SERIES {
        c.feed(v).unwrap();
    }
    c.finalize(ResiduePolicy::HalfCycles).unwrap();

    let n = 8u16;
    let rfm: Vec<u64> = (0..n)
        .flat_map(|from| (0..n).map(move |to| (from, to)))
        .map(|(from, to)| c.rfm_get(from, to).unwrap())
        .collect();
    let from_rfm = c.damage_from_rfm(&rfm);
    assert!((from_rfm - c.damage()).abs() < 1e-9 * c.damage().max(1.0));
}

/// Boundary: an empty input series closes no cycles and carries zero
/// damage.
#[test]
fn empty_series_closes_nothing() {
    let c = run(&[], 1.0, 8, ResiduePolicy::HalfCycles);
    assert_eq!(rfm_sum(&c, 8), 0);
    assert_eq!(c.damage(), 0.0);
    assert!(c.residue().is_empty());
}

/// Boundary: a constant input series never breaches the hysteresis band,
/// so it never produces a turning point and never closes a cycle.
#[test]
fn constant_series_closes_nothing() {
    let c = run(&[3.0, 3.0, 3.0, 3.0, 3.0], 0.5, 8, ResiduePolicy::HalfCycles);
    assert_eq!(rfm_sum(&c, 8), 0);
    assert_eq!(c.damage(), 0.0);
}

/// Boundary: a strictly monotonic two-extreme series (one rise) leaves
/// both endpoints in residue and closes nothing under `IGNORE`.
#[test]
fn strictly_monotonic_series_leaves_residue_uncounted() {
    let c = run(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.1, 8, ResiduePolicy::Ignore);
    assert_eq!(rfm_sum(&c, 8), 0);
    assert_eq!(c.residue().len(), 2);
}
