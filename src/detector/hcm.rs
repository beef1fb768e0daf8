//! HCM (Clormann/Seeger) 3-point stack detector.
//!
//! Unlike [`super::four_point::FourPointDetector`] and
//! [`super::astm::AstmDetector`], which operate directly on the shared
//! [`Residue`](crate::residue::Residue), HCM keeps its own private stack and
//! hands the caller a fresh snapshot after each sample — mirroring the
//! teacher's `evo_control_unit::state` split between a module's internal
//! working state and the externally visible snapshot it publishes.

use super::ClosedCycle;
use crate::residue::ValueTuple;

/// 1-indexed in spec prose; held here as a plain `Vec` with `ir` tracking
/// the reset floor (`0` = not yet established).
#[derive(Debug, Clone, Default)]
pub struct HcmDetector {
    stack: Vec<ValueTuple>,
    ir: usize,
}

impl HcmDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stack contents, becoming the new residue after this call.
    pub fn stack_snapshot(&self) -> Vec<ValueTuple> {
        self.stack.clone()
    }

    /// Feed one newly confirmed turning point. `eps` is `class_width / 100`.
    pub fn feed(&mut self, k: ValueTuple, eps: f64, emit: &mut dyn FnMut(ClosedCycle)) {
        if self.ir == 0 {
            self.stack.push(k);
            self.ir = 1;
            return;
        }

        loop {
            let iz = self.stack.len();
            if iz > self.ir {
                let j = self.stack[iz - 1];
                let i = self.stack[iz - 2];
                let (kc, jc, ic) = (k.class as f64, j.class as f64, i.class as f64);
                if (kc - jc) * (jc - ic) >= -eps {
                    // J is an inflection point, not a turning point: drop it.
                    self.stack.pop();
                    continue;
                }
                if (kc - jc).abs() >= (jc - ic).abs() {
                    emit(ClosedCycle {
                        from: i,
                        to: j,
                        next: Some(k),
                        is_half: false,
                    });
                    self.stack.pop();
                    self.stack.pop();
                    continue;
                }
                break;
            }
            if iz == self.ir && iz >= 1 {
                let j = self.stack[iz - 1];
                let (kc, jc) = (k.class as f64, j.class as f64);
                if (kc - jc) * jc >= -eps {
                    self.stack.pop();
                    if self.stack.is_empty() {
                        self.ir = 0;
                        break;
                    }
                    self.ir -= 1;
                    continue;
                }
                if kc.abs() > jc.abs() {
                    self.ir += 1;
                }
                break;
            }
            break;
        }

        self.stack.push(k);
        if self.ir == 0 {
            self.ir = 1;
        }
    }
}
