//! 4-point closed-cycle detector, the default.

use super::ClosedCycle;
use crate::error::Result;
use crate::residue::{Residue, ValueTuple};

/// The 4-point closure test: does `a, b, c, d` (in stream order) close a
/// cycle `b -> c`? Shared with [`crate::finalizer::remove_seam_cycle`] so
/// the two can't drift apart on what "closes" means.
pub(crate) fn closure_test(a: &ValueTuple, b: &ValueTuple, c: &ValueTuple, d: &ValueTuple) -> bool {
    let b_lo = b.class.min(c.class);
    let c_hi = b.class.max(c.class);
    let a_lo = a.class.min(d.class);
    let d_hi = a.class.max(d.class);
    a_lo <= b_lo && c_hi <= d_hi
}

/// Stateless: all state lives in the shared residue.
#[derive(Debug, Default)]
pub struct FourPointDetector;

impl FourPointDetector {
    pub fn feed(
        &mut self,
        tuple: ValueTuple,
        residue: &mut Residue,
        emit: &mut dyn FnMut(ClosedCycle),
    ) -> Result<()> {
        residue.push(tuple)?;
        loop {
            let n = residue.len();
            if n < 4 {
                break;
            }
            let a = *residue.get(n - 4).unwrap();
            let b = *residue.get(n - 3).unwrap();
            let c = *residue.get(n - 2).unwrap();
            let d = *residue.get(n - 1).unwrap();

            if closure_test(&a, &b, &c, &d) {
                emit(ClosedCycle {
                    from: b,
                    to: c,
                    next: Some(d),
                    is_half: false,
                });
                // Remove the two middle tuples, higher index first.
                residue.remove(n - 2);
                residue.remove(n - 3);
            } else {
                break;
            }
        }
        Ok(())
    }
}
