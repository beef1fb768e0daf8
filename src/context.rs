//! `RainflowContext`: the public streaming engine tying every module
//! together.
//!
//! The feed path collects confirmed turning points from the filter into a
//! small local buffer before touching any other field, the same way the
//! teacher's `evo_control_unit` cycle loop drains one segment's event queue
//! into a local `Vec` before dispatching, rather than mutating shared state
//! from inside a callback that also needs `&mut self`.
//!
//! Every fallible inner step (`feed_inner`, `finalize_inner`, ...) returns a
//! plain `Result` without touching `self.error`/`self.state`; only the
//! public entry points catch the error and mark the context
//! [`ContextState::Error`] (`fail`), so no inner call needs `&mut self`
//! while another field is already borrowed.

use crate::aggregator::Aggregator;
#[cfg(feature = "at")]
use crate::amplitude_transform::AmplitudeTransform;
use crate::class::ClassParam;
use crate::damage::{DamageCalculator, DamageMethod};
#[cfg(feature = "astm")]
use crate::detector::AstmDetector;
#[cfg(feature = "hcm")]
use crate::detector::HcmDetector;
use crate::detector::{ClosedCycle, CycleDetector, Detector, FourPointDetector};
#[cfg(feature = "dh")]
use crate::dh::DamageHistory;
use crate::error::{RfcError, Result};
use crate::filter::{HysteresisMeasure, TurningPointFilter};
use crate::finalizer::{self, ResiduePolicy};
use crate::flags::{CountFlags, DebugFlags};
use crate::miner::MinerConsequent;
use crate::residue::{Residue, ValueTuple};
#[cfg(feature = "ar")]
use crate::spreading::{self, SpreadContext, SpreadMethod};
use crate::state::ContextState;
#[cfg(feature = "tp")]
use crate::tp_log::{PruneOptions, TurningPointLog};
use crate::wohler::WohlerCurve;

/// Selects which built-in detector `RainflowContext::init` installs.
/// `Delegated` is reached through [`RainflowContext::set_delegated_detector`]
/// instead, since it carries a boxed trait object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    None,
    #[default]
    FourPoint,
    #[cfg(feature = "hcm")]
    Hcm,
    #[cfg(feature = "astm")]
    Astm,
}

pub struct RainflowContext {
    state: ContextState,
    class: ClassParam,
    damage_calc: DamageCalculator,
    miner: Option<MinerConsequent>,
    filter: TurningPointFilter,
    detector: Detector,
    residue: Residue,
    aggregator: Aggregator,
    #[cfg(feature = "tp")]
    tp_log: Option<TurningPointLog>,
    #[cfg(feature = "dh")]
    dh: Option<DamageHistory>,
    flags: CountFlags,
    debug_flags: DebugFlags,
    #[cfg(feature = "ar")]
    spread_method: SpreadMethod,
    residue_policy: ResiduePolicy,
    eps: f64,
    next_pos: u64,
    error: Option<RfcError>,
}

impl RainflowContext {
    /// Construct and move straight to [`ContextState::Init`].
    pub fn init(
        class: ClassParam,
        wohler: WohlerCurve,
        hysteresis: f64,
        measure: HysteresisMeasure,
        detector_kind: DetectorKind,
    ) -> Result<Self> {
        let detector = match detector_kind {
            DetectorKind::None => Detector::None,
            DetectorKind::FourPoint => Detector::FourPoint(FourPointDetector),
            #[cfg(feature = "hcm")]
            DetectorKind::Hcm => Detector::Hcm(HcmDetector::new()),
            #[cfg(feature = "astm")]
            DetectorKind::Astm => Detector::Astm(AstmDetector),
        };
        let eps = class.width() / 100.0;
        let residue = Residue::with_capacity(class.residue_capacity());
        let damage_calc = DamageCalculator::new(class, wohler, false);
        Ok(Self {
            state: ContextState::Init,
            class,
            damage_calc,
            miner: None,
            filter: TurningPointFilter::new(hysteresis, measure, class.width()),
            detector,
            residue,
            aggregator: Aggregator::new(class.count()),
            #[cfg(feature = "tp")]
            tp_log: None,
            #[cfg(feature = "dh")]
            dh: None,
            flags: CountFlags::default(),
            debug_flags: DebugFlags::default(),
            #[cfg(feature = "ar")]
            spread_method: SpreadMethod::None,
            residue_policy: ResiduePolicy::HalfCycles,
            eps,
            next_pos: 1,
            error: None,
        })
    }

    /// Reset to [`ContextState::Init0`]; a host calls `init` again to
    /// reconfigure.
    pub fn deinit(&mut self) {
        self.state = ContextState::Init0;
        self.residue.clear();
        self.filter.reset();
        self.aggregator.clear_counts();
        #[cfg(feature = "tp")]
        if let Some(tp) = &mut self.tp_log {
            tp.clear();
        }
        #[cfg(feature = "dh")]
        if let Some(dh) = &mut self.dh {
            dh.clear();
        }
        if let Some(m) = &mut self.miner {
            m.reset();
        }
        self.next_pos = 1;
        self.error = None;
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn error(&self) -> Option<&RfcError> {
        self.error.as_ref()
    }

    /// Mark the context `Error` and return the same error, for use at
    /// public entry points: `self.feed_inner(v).map_err(|e| self.fail(e))`.
    fn fail(&mut self, err: RfcError) -> RfcError {
        self.state = ContextState::Error;
        self.error = Some(err.clone());
        err
    }

    fn ensure_feedable(&self) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if !self.state.can_feed() {
            return Err(RfcError::InvalidArg(format!(
                "cannot feed in state {:?}",
                self.state
            )));
        }
        Ok(())
    }

    // --- configuration ----------------------------------------------------

    pub fn class_param(&self) -> &ClassParam {
        &self.class
    }

    pub fn set_hysteresis(&mut self, hysteresis: f64) {
        self.filter.set_hysteresis(hysteresis);
    }

    pub fn set_wohler(&mut self, wohler: WohlerCurve) {
        self.damage_calc.set_wohler(wohler);
        if let Some(m) = &mut self.miner {
            m.set_base(wohler);
        }
    }

    pub fn wohler(&self) -> &WohlerCurve {
        self.damage_calc.wohler()
    }

    #[cfg(feature = "at")]
    pub fn set_amplitude_transform(&mut self, at: Option<AmplitudeTransform>) {
        self.damage_calc.set_amplitude_transform(at);
    }

    pub fn set_flags(&mut self, flags: CountFlags) {
        self.flags = flags;
        if flags.contains(CountFlags::COUNT_MK) && self.miner.is_none() {
            self.miner = Some(MinerConsequent::new(*self.damage_calc.wohler()));
        }
    }

    pub fn flags(&self) -> CountFlags {
        self.flags
    }

    pub fn set_debug_flags(&mut self, flags: DebugFlags) {
        self.debug_flags = flags;
    }

    pub fn debug_flags(&self) -> DebugFlags {
        self.debug_flags
    }

    #[cfg(feature = "ar")]
    pub fn set_spread_method(&mut self, method: SpreadMethod) {
        self.spread_method = method;
    }

    pub fn set_residue_policy(&mut self, policy: ResiduePolicy) {
        self.residue_policy = policy;
    }

    pub fn residue_policy(&self) -> ResiduePolicy {
        self.residue_policy
    }

    /// Enable the turning-point log (`tp_init`).
    #[cfg(feature = "tp")]
    pub fn init_tp_log(&mut self) {
        self.tp_log = Some(TurningPointLog::new());
    }

    #[cfg(feature = "tp")]
    pub fn init_tp_autoprune(&mut self, target_size: u32, threshold: u32) {
        if let Some(tp) = &mut self.tp_log {
            tp.init_autoprune(target_size, threshold);
        }
    }

    /// Enable the damage-history array (`dh_init`); its quantized-class
    /// trail also backs the `TRANSIENT_*` spreading methods.
    #[cfg(feature = "dh")]
    pub fn init_dh(&mut self) {
        self.dh = Some(DamageHistory::new());
    }

    #[cfg(feature = "tp")]
    pub fn tp_log(&self) -> Option<&TurningPointLog> {
        self.tp_log.as_ref()
    }

    #[cfg(feature = "dh")]
    pub fn dh(&self) -> Option<&DamageHistory> {
        self.dh.as_ref()
    }

    pub fn residue(&self) -> &[ValueTuple] {
        self.residue.as_slice()
    }

    pub fn clear_counts(&mut self) {
        self.aggregator.clear_counts();
        if let Some(m) = &mut self.miner {
            m.reset();
        }
    }

    pub fn damage(&self) -> f64 {
        self.aggregator.damage()
    }

    pub fn rfm_get(&self, from: u16, to: u16) -> Result<u64> {
        self.aggregator.rfm_get(from, to)
    }

    pub fn rp_get(&self, delta: u16) -> Result<u64> {
        self.aggregator.rp_get(delta)
    }

    pub fn lc_get(&self, boundary: u16) -> Result<u64> {
        self.aggregator.lc_get(boundary)
    }

    pub fn rfm_make_symmetric(&mut self) {
        self.aggregator.rfm_make_symmetric();
    }

    pub fn extrema(&self) -> (Option<ValueTuple>, Option<ValueTuple>) {
        self.aggregator.extrema()
    }

    pub fn damage_from_rp(&self, rp: &[u64], method: DamageMethod) -> f64 {
        self.damage_calc
            .damage_from_rp(rp, self.aggregator.full_inc(), method)
    }

    pub fn damage_from_rfm(&self, rfm: &[u64]) -> f64 {
        self.damage_calc
            .damage_from_rfm(rfm, self.class.count(), self.aggregator.full_inc())
    }

    /// Install a host-supplied detector (`DELEGATED`).
    pub fn set_delegated_detector(&mut self, detector: Box<dyn CycleDetector>) {
        self.detector = Detector::Delegated(detector);
    }

    // --- streaming ---------------------------------------------------------

    /// Quantize `value`. When `AUTORESIZE` is set and `value` falls above
    /// the current upper bound, the class range is grown (and the matrix,
    /// histograms, residue and damage LUT remapped) to cover it before
    /// quantizing, rather than silently clipping to the edge class.
    /// `AUTORESIZE` never shifts the lower bound: a value below `offset`
    /// is always `DataOutOfRange`.
    fn quantize(&mut self, value: f64) -> Result<u16> {
        if self.class.count() > 0 && !self.class.in_range(value) {
            if self.flags.contains(CountFlags::AUTORESIZE) {
                self.grow_class_range(value)?;
            } else {
                let lo = self.class.offset();
                let hi = lo + self.class.count() as f64 * self.class.width();
                return Err(RfcError::DataOutOfRange { value, lo, hi });
            }
        }
        match self.class.quantize(value)? {
            Some(c) => Ok(c),
            None => Ok(0),
        }
    }

    /// Grow the class range's upper bound just far enough to cover
    /// `value`, remapping the rainflow matrix, range-pair/level-crossing
    /// histograms, damage LUT and residue capacity onto the wider range.
    /// Existing counts keep their class indices: growing only appends new,
    /// empty classes above the old ones.
    fn grow_class_range(&mut self, value: f64) -> Result<()> {
        let lo = self.class.offset();
        let width = self.class.width();
        if value < lo {
            let hi = lo + self.class.count() as f64 * width;
            return Err(RfcError::DataOutOfRange { value, lo, hi });
        }
        let raw = ((value - lo) / width).floor();
        if !raw.is_finite() || raw + 1.0 > crate::class::MAX_CLASS_COUNT as f64 {
            let hi = lo + self.class.count() as f64 * width;
            return Err(RfcError::DataOutOfRange { value, lo, hi });
        }
        let needed = (raw as u32 + 1) as u16;
        if needed <= self.class.count() {
            return Ok(());
        }
        let new_class = ClassParam::new(needed, width, lo)?;
        self.aggregator.grow(needed);
        self.damage_calc.set_class(new_class);
        self.residue.set_capacity(new_class.residue_capacity());
        self.class = new_class;
        Ok(())
    }

    /// Feed one raw sample.
    pub fn feed(&mut self, value: f64) -> Result<()> {
        self.ensure_feedable()?;
        let result = self.feed_quantized(value, None);
        result.map_err(|e| self.fail(e))
    }

    /// Feed a pre-quantized tuple directly, bypassing `quantize` (a host
    /// that already classified its samples, via `feed_tuple`).
    /// The tuple's `class` must agree with what `ClassParam` would assign
    /// to `value`, or `DataInconsistent` is raised.
    pub fn feed_tuple(&mut self, value: f64, class: u16) -> Result<()> {
        self.ensure_feedable()?;
        let result = self.feed_quantized(value, Some(class));
        result.map_err(|e| self.fail(e))
    }

    fn feed_quantized(&mut self, value: f64, explicit_class: Option<u16>) -> Result<()> {
        let class = match explicit_class {
            Some(class) => {
                if self.class.count() > 0 {
                    if let Some(expected) = self.class.quantize(value)? {
                        if expected != class {
                            return Err(RfcError::DataInconsistent(format!(
                                "tuple class {class} disagrees with quantized class {expected}"
                            )));
                        }
                    }
                }
                class
            }
            None => self.quantize(value)?,
        };

        let pos = self.next_pos;
        self.next_pos += 1;
        let tuple = ValueTuple::new(value, class, pos);

        #[cfg(feature = "global_extrema")]
        self.aggregator.observe_extrema(tuple);

        #[cfg(feature = "dh")]
        if let Some(dh) = &mut self.dh {
            dh.record(pos, class)?;
        }

        let mut confirmed = Vec::new();
        self.filter.step(tuple, |t| confirmed.push(t));
        for tp in confirmed {
            self.process_turning_point(tp)?;
        }

        self.state = if self.filter.is_seeking() {
            ContextState::Busy
        } else {
            ContextState::BusyInterim
        };
        Ok(())
    }

    fn process_turning_point(&mut self, mut tp: ValueTuple) -> Result<()> {
        #[cfg(feature = "tp")]
        if let Some(tp_log) = &mut self.tp_log {
            let pos = tp_log.append(tp)?;
            tp.tp_pos = pos;
            if self.flags.contains(CountFlags::TPAUTOPRUNE) {
                tp_log.maybe_prune(PruneOptions {
                    preserve_pos: self.flags.contains(CountFlags::TPPRUNE_PRESERVE_POS),
                    preserve_residue_refs: self.flags.contains(CountFlags::TPPRUNE_PRESERVE_RES),
                });
            }
        }

        let mut closed = Vec::new();
        self.detector
            .feed(tp, &mut self.residue, self.eps, &mut |c| closed.push(c))?;

        for cycle in closed {
            self.count_closed_cycle(cycle)?;
        }
        Ok(())
    }

    fn count_closed_cycle(&mut self, cycle: ClosedCycle) -> Result<()> {
        let damage = if self.flags.contains(CountFlags::COUNT_MK) {
            let sa = self
                .damage_calc
                .amplitude_for_pair(cycle.from.class, cycle.to.class);
            let damage_calc_wohler = *self.damage_calc.wohler();
            let miner = self
                .miner
                .get_or_insert_with(|| MinerConsequent::new(damage_calc_wohler));
            miner.damage_and_degrade(sa, false)
        } else {
            self.damage_calc
                .damage_for_pair(cycle.from.class, cycle.to.class)
        };

        self.aggregator.count_cycle(
            cycle.from.class,
            cycle.to.class,
            cycle.is_half,
            self.flags,
            damage,
        )?;

        #[cfg(feature = "ar")]
        if self.flags.contains(CountFlags::COUNT_DH) && self.spread_method != SpreadMethod::None {
            let weight = if cycle.is_half {
                self.aggregator.half_inc() as f64 / self.aggregator.full_inc() as f64
            } else {
                1.0
            };
            let ctx = SpreadContext {
                weighted_damage: damage * weight,
                k_abs: self.damage_calc.wohler().k.abs(),
            };
            let damage_calc = &self.damage_calc;
            if let Some(tp_log) = &mut self.tp_log {
                spreading::spread(
                    self.spread_method,
                    cycle.from,
                    cycle.to,
                    cycle.next,
                    ctx,
                    tp_log,
                    self.dh.as_mut(),
                    &|from, to| damage_calc.damage_for_pair(from, to),
                )?;
            }
        }
        Ok(())
    }

    // --- finalization --------------------------------------------------------

    /// Finalize the residue under `policy`, moving to
    /// [`ContextState::Finished`].
    pub fn finalize(&mut self, policy: ResiduePolicy) -> Result<()> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        if !self.state.can_feed() {
            return Err(RfcError::InvalidArg(format!(
                "cannot finalize in state {:?}",
                self.state
            )));
        }
        let result = self.finalize_inner(policy);
        result.map_err(|e| self.fail(e))
    }

    fn finalize_inner(&mut self, policy: ResiduePolicy) -> Result<()> {
        self.state = ContextState::Finalize;

        if policy == ResiduePolicy::NoFinalize {
            self.state = ContextState::BusyInterim;
            return Ok(());
        }

        // Promote the pending interim tuple, if any, into a real turning
        // point so finalization sees the full stream.
        if let Some(interim) = self.filter.interim() {
            self.process_turning_point(interim)?;
        }

        #[cfg(feature = "tp")]
        if policy != ResiduePolicy::Discard {
            if let Some(tp_log) = &mut self.tp_log {
                tp_log.lock();
            }
        }

        let cycles = match policy {
            ResiduePolicy::None | ResiduePolicy::Ignore | ResiduePolicy::NoFinalize => Vec::new(),
            ResiduePolicy::Discard => {
                self.residue.clear();
                Vec::new()
            }
            ResiduePolicy::HalfCycles => {
                let c = finalizer::adjacent_pairs(self.residue.as_slice(), true);
                self.residue.clear();
                c
            }
            ResiduePolicy::FullCycles => {
                let c = finalizer::adjacent_pairs(self.residue.as_slice(), false);
                self.residue.clear();
                c
            }
            ResiduePolicy::ClormannSeeger => {
                let (c, rest) = finalizer::clormann_seeger(self.residue.as_slice());
                self.residue.replace_all(rest);
                c
            }
            ResiduePolicy::RpDin45667 => {
                let c = finalizer::rp_din45667(self.residue.as_slice());
                self.residue.clear();
                c
            }
            ResiduePolicy::Repeated => {
                let mut all = Vec::new();
                loop {
                    let (closed, rest) = finalizer::remove_seam_cycle(self.residue.as_slice());
                    self.residue.replace_all(rest);
                    match closed {
                        Some(c) => all.push(c),
                        None => break,
                    }
                }
                all.extend(self.refeed_doubled());
                self.residue.clear();
                all
            }
        };

        #[cfg(feature = "tp")]
        if let Some(tp_log) = &mut self.tp_log {
            tp_log.unlock();
        }

        for c in cycles {
            self.count_closed_cycle(ClosedCycle {
                from: c.from,
                to: c.to,
                next: None,
                is_half: c.is_half,
            })?;
        }

        self.state = ContextState::Finished;
        Ok(())
    }

    /// `REPEATED`'s re-feed step: having already stripped every seam cycle
    /// the live detector would close on a fifth wrap-around sample, feed
    /// the remaining residue *twice* through a fresh filter/detector pair
    /// sharing the live configuration, to find cycles that only close once
    /// the load history repeats. Fresh instances rather than the live,
    /// mutated ones, so a sample already folded into the live filter's
    /// interim/detector state isn't replayed against it a second time.
    ///
    /// Returns no cycles when the live detector is `Delegated`: a boxed
    /// custom detector can't be cloned into a fresh instance, so there is
    /// nothing sound to re-feed through.
    fn refeed_doubled(&self) -> Vec<finalizer::FinalCycle> {
        let remaining = self.residue.as_slice();
        if remaining.is_empty() {
            return Vec::new();
        }
        let Some(mut detector) = self.detector.fresh_like() else {
            return Vec::new();
        };
        let mut filter =
            TurningPointFilter::new(self.filter.hysteresis(), self.filter.measure(), self.class.width());
        let mut residue = Residue::with_capacity(self.class.residue_capacity());
        let mut closed = Vec::new();
        for tuple in remaining.iter().chain(remaining.iter()).copied() {
            let mut confirmed = Vec::new();
            filter.step(tuple, |t| confirmed.push(t));
            for tp in confirmed {
                let _ = detector.feed(tp, &mut residue, self.eps, &mut |c| closed.push(c));
            }
        }
        closed
            .into_iter()
            .map(|c| finalizer::FinalCycle {
                from: c.from,
                to: c.to,
                is_half: c.is_half,
            })
            .collect()
    }
}
