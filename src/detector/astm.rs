//! ASTM 3-point closed-cycle detector.
//!
//! The half-cycle sentinel `Z` is always the *first* residue element, per
//! the explicit note preserving that detail against drift.

use super::ClosedCycle;
use crate::error::Result;
use crate::residue::{Residue, ValueTuple};

#[derive(Debug, Default)]
pub struct AstmDetector;

impl AstmDetector {
    pub fn feed(
        &mut self,
        tuple: ValueTuple,
        residue: &mut Residue,
        emit: &mut dyn FnMut(ClosedCycle),
    ) -> Result<()> {
        residue.push(tuple)?;
        loop {
            let n = residue.len();
            if n < 3 {
                break;
            }
            let a = *residue.get(n - 3).unwrap();
            let b = *residue.get(n - 2).unwrap();
            let c = *residue.get(n - 1).unwrap();
            let z = *residue.get(0).unwrap();

            let x = (b.class as i32 - c.class as i32).unsigned_abs();
            let y = (a.class as i32 - b.class as i32).unsigned_abs();
            if x < y {
                break;
            }

            let lo = a.class.min(b.class);
            let hi = a.class.max(b.class);
            if z.class >= lo && z.class <= hi {
                emit(ClosedCycle {
                    from: a,
                    to: b,
                    next: Some(c),
                    is_half: true,
                });
                residue.remove(n - 3);
            } else {
                emit(ClosedCycle {
                    from: a,
                    to: b,
                    next: Some(c),
                    is_half: false,
                });
                residue.remove(n - 3);
                residue.remove(n - 3);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tup(class: u16, pos: u64) -> ValueTuple {
        let mut t = ValueTuple::new(class as f64, class, pos);
        t.tp_pos = pos as u32;
        t
    }

    #[test]
    fn full_cycle_when_z_outside_ab() {
        // Residue primed to [Z=10, filler=2, A=5, B=8]; feeding C=1 gives
        // X=|8-1|=7 >= Y=|5-8|=3, and Z=10 falls outside [5,8]: a full cycle.
        let mut det = AstmDetector;
        let mut residue = Residue::with_capacity(9);
        for (c, pos) in [(10u16, 1u64), (2, 2), (5, 3), (8, 4)] {
            residue.push(tup(c, pos)).unwrap();
        }
        let mut closed = Vec::new();
        det.feed(tup(1, 5), &mut residue, &mut |ev| closed.push(ev))
            .unwrap();

        assert_eq!(closed.len(), 1);
        assert!(!closed[0].is_half);
        assert_eq!(closed[0].from.class, 5);
        assert_eq!(closed[0].to.class, 8);
        let rest: Vec<u16> = residue.as_slice().iter().map(|t| t.class).collect();
        assert_eq!(rest, vec![10, 2, 1]);
    }

    #[test]
    fn half_cycle_when_z_between_a_and_b() {
        // Residue primed to [Z=6, A=5, B=8]; feeding C=1 gives X=7 >= Y=3 with
        // Z=6 inside [5,8]: a half cycle dropping only A. The new front (Z)
        // then plays the role of A again, with Z still inside [Z,B]'s own
        // range, so a second half cycle closes before the window shrinks
        // below 3 entries.
        let mut det = AstmDetector;
        let mut residue = Residue::with_capacity(9);
        for (c, pos) in [(6u16, 1u64), (5, 2), (8, 3)] {
            residue.push(tup(c, pos)).unwrap();
        }
        let mut closed = Vec::new();
        det.feed(tup(1, 4), &mut residue, &mut |ev| closed.push(ev))
            .unwrap();

        assert_eq!(closed.len(), 2);
        assert!(closed[0].is_half);
        assert_eq!(closed[0].from.class, 5);
        assert_eq!(closed[0].to.class, 8);
        assert!(closed[1].is_half);
        assert_eq!(closed[1].from.class, 6);
        assert_eq!(closed[1].to.class, 8);
        let rest: Vec<u16> = residue.as_slice().iter().map(|t| t.class).collect();
        assert_eq!(rest, vec![8, 1]);
    }
}
