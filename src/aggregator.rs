//! Rainflow matrix, range-pair, level-crossing histograms and global
//! extrema.

use crate::error::{RfcError, Result};
use crate::flags::CountFlags;
use crate::residue::ValueTuple;

/// Default full-cycle increment; `half_inc = full_inc / 2` so half cycles
/// stay integral.
pub const DEFAULT_FULL_INC: u32 = 2;

/// Dense rainflow matrix, range-pair and level-crossing histograms plus
/// running global extrema for one context.
#[derive(Debug, Clone)]
pub struct Aggregator {
    class_count: u16,
    rfm: Vec<u64>,
    rp: Vec<u64>,
    lc: Vec<u64>,
    damage: f64,
    full_inc: u32,
    half_inc: u32,
    min: Option<ValueTuple>,
    max: Option<ValueTuple>,
}

impl Aggregator {
    pub fn new(class_count: u16) -> Self {
        let n = class_count as usize;
        Self {
            class_count,
            rfm: vec![0; n * n],
            rp: vec![0; n],
            lc: vec![0; n],
            damage: 0.0,
            full_inc: DEFAULT_FULL_INC,
            half_inc: DEFAULT_FULL_INC / 2,
            min: None,
            max: None,
        }
    }

    pub fn full_inc(&self) -> u32 {
        self.full_inc
    }

    pub fn half_inc(&self) -> u32 {
        self.half_inc
    }

    /// Grow to `new_count` classes (`AUTORESIZE`), remapping `rfm`'s flat
    /// storage to the new stride and zero-extending `rp`/`lc`, whose
    /// indices (delta / boundary) don't depend on `class_count` and so
    /// need no remap. A no-op if `new_count <= class_count`.
    pub fn grow(&mut self, new_count: u16) {
        if new_count <= self.class_count {
            return;
        }
        let old_n = self.class_count as usize;
        let new_n = new_count as usize;
        let mut rfm = vec![0u64; new_n * new_n];
        for from in 0..old_n {
            for to in 0..old_n {
                rfm[from * new_n + to] = self.rfm[from * old_n + to];
            }
        }
        self.rfm = rfm;
        self.rp.resize(new_n, 0);
        self.lc.resize(new_n, 0);
        self.class_count = new_count;
    }

    pub fn set_increments(&mut self, full_inc: u32) {
        self.full_inc = full_inc.max(2);
        self.half_inc = self.full_inc / 2;
    }

    pub fn damage(&self) -> f64 {
        self.damage
    }

    pub fn clear_counts(&mut self) {
        self.rfm.iter_mut().for_each(|c| *c = 0);
        self.rp.iter_mut().for_each(|c| *c = 0);
        self.lc.iter_mut().for_each(|c| *c = 0);
        self.damage = 0.0;
        self.min = None;
        self.max = None;
    }

    /// Track global extrema (`RFC_GLOBAL_EXTREMA`).
    #[cfg(feature = "global_extrema")]
    pub fn observe_extrema(&mut self, tuple: ValueTuple) {
        if self.min.is_none_or(|m| tuple.value < m.value) {
            self.min = Some(tuple);
        }
        if self.max.is_none_or(|m| tuple.value > m.value) {
            self.max = Some(tuple);
        }
    }

    pub fn extrema(&self) -> (Option<ValueTuple>, Option<ValueTuple>) {
        (self.min, self.max)
    }

    fn idx(&self, from: u16, to: u16) -> usize {
        from as usize * self.class_count as usize + to as usize
    }

    pub fn rfm_get(&self, from: u16, to: u16) -> Result<u64> {
        if from >= self.class_count || to >= self.class_count {
            return Err(RfcError::InvalidArg(format!(
                "class pair ({from},{to}) out of range [0,{})",
                self.class_count
            )));
        }
        Ok(self.rfm[self.idx(from, to)])
    }

    pub fn rfm_set(&mut self, from: u16, to: u16, value: u64) -> Result<()> {
        if from >= self.class_count || to >= self.class_count {
            return Err(RfcError::InvalidArg(format!(
                "class pair ({from},{to}) out of range [0,{})",
                self.class_count
            )));
        }
        let idx = self.idx(from, to);
        self.rfm[idx] = value;
        Ok(())
    }

    /// Fold `rfm[to,from]` into `rfm[from,to]` for `from <= to`, zeroing the
    /// lower triangle.
    pub fn rfm_make_symmetric(&mut self) {
        let n = self.class_count as usize;
        for from in 0..n {
            for to in (from + 1)..n {
                let lo = from * n + to;
                let hi = to * n + from;
                self.rfm[lo] += self.rfm[hi];
                self.rfm[hi] = 0;
            }
        }
    }

    pub fn rfm_sum(&self) -> u64 {
        self.rfm.iter().sum()
    }

    pub fn rfm_non_zeros(&self) -> usize {
        self.rfm.iter().filter(|&&c| c != 0).count()
    }

    pub fn rp_get(&self, delta: u16) -> Result<u64> {
        self.rp
            .get(delta as usize)
            .copied()
            .ok_or_else(|| RfcError::InvalidArg(format!("range-pair index {delta} out of range")))
    }

    pub fn lc_get(&self, boundary: u16) -> Result<u64> {
        self.lc
            .get(boundary as usize)
            .copied()
            .ok_or_else(|| RfcError::InvalidArg(format!("level-crossing index {boundary} out of range")))
    }

    /// Derive `rp` from the current `rfm` (`rp[d] = sum_{|i-j|=d} rfm[i,j]`).
    pub fn rp_from_rfm(&self) -> Vec<u64> {
        let n = self.class_count as usize;
        let mut rp = vec![0u64; n];
        for from in 0..n {
            for to in 0..n {
                let d = (from as i32 - to as i32).unsigned_abs() as usize;
                rp[d] += self.rfm[from * n + to];
            }
        }
        rp
    }

    /// Derive `lc` from `rfm`: for each cycle `(from,to)` every class
    /// boundary strictly between the two is crossed once per slope
    /// direction weighted by the count.
    pub fn lc_from_rfm(&self, flags: CountFlags) -> Vec<u64> {
        let n = self.class_count as usize;
        let mut lc = vec![0u64; n];
        for from in 0..n {
            for to in 0..n {
                let count = self.rfm[from * n + to];
                if count == 0 || from == to {
                    continue;
                }
                let (lo, hi) = (from.min(to), from.max(to));
                let rising = to > from;
                if (rising && flags.contains(CountFlags::COUNT_LC_UP))
                    || (!rising && flags.contains(CountFlags::COUNT_LC_DN))
                {
                    for b in (lo + 1)..=hi {
                        lc[b] += count;
                    }
                }
            }
        }
        lc
    }

    /// Count one closed cycle: updates `rfm`, `rp`,
    /// `lc`, global extrema and accumulates `damage_per_cycle * weight`
    /// where `weight = curr_inc / full_inc`.
    #[allow(clippy::too_many_arguments)]
    pub fn count_cycle(
        &mut self,
        from: u16,
        to: u16,
        is_half: bool,
        flags: CountFlags,
        damage_per_cycle: f64,
    ) -> Result<u32> {
        let curr_inc = if is_half { self.half_inc } else { self.full_inc };
        if flags.contains(CountFlags::COUNT_RFM) {
            let idx = self.idx(from, to);
            self.rfm[idx] += curr_inc as u64;
        }
        if flags.contains(CountFlags::COUNT_RP) {
            let d = (from as i32 - to as i32).unsigned_abs() as usize;
            self.rp[d] += curr_inc as u64;
        }
        if flags.intersects(CountFlags::COUNT_LC) {
            let (lo, hi) = (from.min(to), from.max(to));
            let rising = to > from;
            if (rising && flags.contains(CountFlags::COUNT_LC_UP))
                || (!rising && flags.contains(CountFlags::COUNT_LC_DN))
            {
                for b in (lo + 1)..=hi {
                    self.lc[b as usize] += curr_inc as u64;
                }
            }
        }
        if flags.contains(CountFlags::COUNT_DAMAGE) {
            let weight = curr_inc as f64 / self.full_inc as f64;
            self.damage += damage_per_cycle * weight;
        }
        Ok(curr_inc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_cycle_into_rfm_rp_lc() {
        let mut agg = Aggregator::new(4);
        let flags = CountFlags::default() | CountFlags::COUNT_RP | CountFlags::COUNT_LC;
        agg.count_cycle(2, 1, false, flags, 0.1).unwrap();
        assert_eq!(agg.rfm_get(2, 1).unwrap(), 2);
        assert_eq!(agg.rp_get(1).unwrap(), 2);
        assert_eq!(agg.lc_get(2).unwrap(), 2);
        assert!((agg.damage() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn half_cycle_weighs_damage_by_half() {
        let mut agg = Aggregator::new(4);
        agg.count_cycle(0, 1, true, CountFlags::COUNT_DAMAGE, 1.0)
            .unwrap();
        assert!((agg.damage() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn make_symmetric_is_idempotent() {
        let mut agg = Aggregator::new(3);
        agg.rfm_set(0, 2, 5).unwrap();
        agg.rfm_set(2, 0, 3).unwrap();
        agg.rfm_make_symmetric();
        let once: Vec<u64> = agg.rfm.clone();
        agg.rfm_make_symmetric();
        assert_eq!(agg.rfm, once);
        assert_eq!(agg.rfm_get(0, 2).unwrap(), 8);
        assert_eq!(agg.rfm_get(2, 0).unwrap(), 0);
    }

    #[test]
    fn rp_from_rfm_matches_manual_histogram() {
        let mut agg = Aggregator::new(4);
        agg.rfm_set(0, 3, 2).unwrap();
        agg.rfm_set(1, 2, 1).unwrap();
        let rp = agg.rp_from_rfm();
        assert_eq!(rp[3], 2);
        assert_eq!(rp[1], 1);
    }
}
