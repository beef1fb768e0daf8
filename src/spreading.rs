//! Damage spreading: distributing a closed cycle's damage back onto the
//! turning-point log and/or the damage-history array.

use crate::dh::DamageHistory;
use crate::error::Result;
use crate::residue::ValueTuple;
use crate::tp_log::TurningPointLog;

/// One of the nine spreading methods, plus `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpreadMethod {
    #[default]
    None,
    Half23,
    FullP2,
    FullP3,
    RampAmplitude23,
    RampDamage23,
    RampAmplitude24,
    RampDamage24,
    Transient23,
    Transient23c,
}

/// Everything a spreading pass needs about the closing cycle, beyond the
/// turning points themselves: the already cycle-weighted damage (`D *
/// curr_inc / full_inc`) and the Wöhler slope magnitude used by the
/// `RAMP_AMPLITUDE_*` weighting.
#[derive(Debug, Clone, Copy)]
pub struct SpreadContext {
    pub weighted_damage: f64,
    pub k_abs: f64,
}

fn ramp_weight(w: f64, k_abs: f64, by_amplitude: bool) -> f64 {
    if by_amplitude {
        w.powf(k_abs)
    } else {
        w
    }
}

/// Spread `weighted_damage` over turning points `from.tp_pos ..= to.tp_pos`
/// (or `..= next.tp_pos` for the `_24` variants), weighted cumulative-
/// monotonically as the spreading method requires.
fn ramp(
    tp_log: &mut TurningPointLog,
    from: ValueTuple,
    end: ValueTuple,
    ctx: SpreadContext,
    by_amplitude: bool,
) -> Result<()> {
    if end.tp_pos <= from.tp_pos || from.tp_pos == 0 {
        return Ok(());
    }
    let span = (end.pos - from.pos) as f64;
    if span <= 0.0 {
        return Ok(());
    }
    let mut prev_weight = 0.0;
    for pos in from.tp_pos..=end.tp_pos {
        let tup = tp_log.get(pos)?;
        let w = ((tup.pos as i64 - from.pos as i64) as f64 / span).clamp(0.0, 1.0);
        let weight = ramp_weight(w, ctx.k_abs, by_amplitude);
        let contribution = ctx.weighted_damage * (weight - prev_weight);
        if contribution > 0.0 {
            tp_log.inc_damage(pos, contribution)?;
        }
        prev_weight = weight;
    }
    Ok(())
}

/// Walk the quantized class trail recorded in `dh` from `from.pos` to
/// `to.pos`, assigning positive damage increments to samples whose class
/// moves monotonically toward `to.class`.
fn transient(
    dh: &mut DamageHistory,
    from: ValueTuple,
    to: ValueTuple,
    weighted_damage: f64,
    damage_for_pair: &dyn Fn(u16, u16) -> f64,
    class_lo: u16,
    class_hi: u16,
) -> Result<()> {
    if to.pos <= from.pos {
        return Ok(());
    }
    let base = damage_for_pair(from.class, from.class);
    let total_span = damage_for_pair(from.class, to.class) - base;
    if total_span.abs() < f64::EPSILON {
        return Ok(());
    }
    let mut prev = 0.0;
    for pos in from.pos..=to.pos {
        let Some(class) = dh.class_at(pos) else {
            continue;
        };
        let clamped = class.clamp(class_lo, class_hi);
        let here = damage_for_pair(from.class, clamped) - base;
        let increment = here - prev;
        if increment > 0.0 {
            dh.add(pos, weighted_damage * increment / total_span)?;
        }
        prev = here.max(prev);
    }
    Ok(())
}

/// Dispatch one closed cycle's damage onto the configured spreading target.
pub fn spread(
    method: SpreadMethod,
    from: ValueTuple,
    to: ValueTuple,
    next: Option<ValueTuple>,
    ctx: SpreadContext,
    tp_log: &mut TurningPointLog,
    dh: Option<&mut DamageHistory>,
    damage_for_pair: &dyn Fn(u16, u16) -> f64,
) -> Result<()> {
    match method {
        SpreadMethod::None => Ok(()),
        SpreadMethod::Half23 => {
            if from.tp_pos != 0 {
                tp_log.inc_damage(from.tp_pos, ctx.weighted_damage / 2.0)?;
            }
            if to.tp_pos != 0 {
                tp_log.inc_damage(to.tp_pos, ctx.weighted_damage / 2.0)?;
            }
            Ok(())
        }
        SpreadMethod::FullP2 => {
            if from.tp_pos != 0 {
                tp_log.inc_damage(from.tp_pos, ctx.weighted_damage)?;
            }
            Ok(())
        }
        SpreadMethod::FullP3 => {
            if to.tp_pos != 0 {
                tp_log.inc_damage(to.tp_pos, ctx.weighted_damage)?;
            }
            Ok(())
        }
        SpreadMethod::RampAmplitude23 => ramp(tp_log, from, to, ctx, true),
        SpreadMethod::RampDamage23 => ramp(tp_log, from, to, ctx, false),
        SpreadMethod::RampAmplitude24 => match next {
            Some(n) => ramp(tp_log, from, n, ctx, true),
            None => ramp(tp_log, from, to, ctx, true),
        },
        SpreadMethod::RampDamage24 => match next {
            Some(n) => ramp(tp_log, from, n, ctx, false),
            None => ramp(tp_log, from, to, ctx, false),
        },
        SpreadMethod::Transient23 => {
            let Some(dh) = dh else { return Ok(()) };
            let (lo, hi) = (from.class.min(to.class), from.class.max(to.class));
            transient(dh, from, to, ctx.weighted_damage, damage_for_pair, lo, hi)
        }
        SpreadMethod::Transient23c => {
            let Some(dh) = dh else { return Ok(()) };
            let (lo, hi) = (from.class.min(to.class), from.class.max(to.class));
            transient(dh, from, to, ctx.weighted_damage / 2.0, damage_for_pair, lo, hi)?;
            if let Some(n) = next {
                let (lo2, hi2) = (to.class.min(n.class), to.class.max(n.class));
                transient(dh, to, n, ctx.weighted_damage / 2.0, damage_for_pair, lo2, hi2)?;
            }
            Ok(())
        }
    }
}
