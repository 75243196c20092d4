//! Native evaluation of the gate relations against the current witness.
//!
//! Memory record rows depend on challenges drawn by the prover and are not
//! evaluated here.
use crate::errors::{PlonkError, Result};
use crate::plonk::constraint_system::{flavor::Selector, CircuitBuilder};
use crate::utils::field_to_u64;
use ark_ff::{Field, One, PrimeField, Zero};

/// The value of a two-bit delta, if the delta is one.
fn quad<F: PrimeField>(delta: F) -> Option<u64> {
    field_to_u64(&delta).filter(|v| *v < 4)
}

fn unsatisfied(row: usize, reason: &str) -> PlonkError {
    PlonkError::UnsatisfiedGate {
        row,
        reason: reason.to_string(),
    }
}

impl<F: PrimeField> CircuitBuilder<F> {
    /// Value of wire `wire` at `row`; rows past the end read as zero.
    fn wire_eval(&self, row: usize, wire: usize) -> F {
        if row >= self.num_gates {
            return F::zero();
        }
        self.get_variable(self.wire_value(row, wire))
    }

    /// Evaluate every row. Returns the first unsatisfied one.
    pub fn check_circuit(&self) -> Result<()> {
        (0..self.num_gates).try_for_each(|row| self.check_row(row))
    }

    /// Evaluate the relations active at `row`.
    pub fn check_row(&self, row: usize) -> Result<()> {
        self.check_arithmetic(row)?;
        if !self.selector_value(row, Selector::QRange).is_zero() {
            self.check_range(row)?;
        }
        if !self.selector_value(row, Selector::QLogic).is_zero() {
            self.check_logic(row)?;
        }
        if !self.selector_value(row, Selector::QSort).is_zero() {
            self.check_sort(row)?;
        }
        if !self.selector_value(row, Selector::QElliptic).is_zero() {
            self.check_elliptic(row)?;
        }
        Ok(())
    }

    fn check_arithmetic(&self, row: usize) -> Result<()> {
        let w: Vec<F> = (0..4).map(|i| self.wire_eval(row, i)).collect();
        let q = |s: Selector| self.selector_value(row, s);
        let has_arith = self.flavor.selector_column(Selector::QArith).is_some();
        let q_arith = if has_arith { q(Selector::QArith) } else { F::one() };
        // memory rows reuse the arithmetic selectors
        if q_arith.is_zero() || !q(Selector::QAux).is_zero() {
            return Ok(());
        }

        let linear = q(Selector::Q1) * w[0]
            + q(Selector::Q2) * w[1]
            + q(Selector::Q3) * w[2]
            + q(Selector::Q4) * w[3]
            + q(Selector::QC);
        let product = q(Selector::QM) * w[0] * w[1];

        let identity = if self.flavor.generalized {
            // q_arith = 2 halves the product and pulls in the next fourth wire
            let two_inv = F::from(2u64)
                .inverse()
                .ok_or_else(|| unsatisfied(row, "field of characteristic two"))?;
            let mul_scale = (F::from(3u64) - q_arith) * two_inv;
            let next_w_4 = self.wire_eval(row + 1, 3);
            q_arith * (mul_scale * product + linear + (q_arith - F::one()) * next_w_4)
        } else {
            q_arith * (product + linear)
        };
        if !identity.is_zero() {
            return Err(unsatisfied(row, "arithmetic relation"));
        }

        let q_5 = q(Selector::Q5);
        if !q_5.is_zero() {
            let d = w[3];
            let range = d * (d - F::one()) * (d - F::from(2u64)) * (d - F::from(3u64));
            if !(q_arith * q_5 * range).is_zero() {
                return Err(unsatisfied(row, "balanced fourth wire out of range"));
            }
        }
        Ok(())
    }

    fn check_range(&self, row: usize) -> Result<()> {
        let four = F::from(4u64);
        let w_1 = self.wire_eval(row, 0);
        let w_2 = self.wire_eval(row, 1);
        let w_3 = self.wire_eval(row, 2);
        let w_4 = self.wire_eval(row, 3);
        let next_w_4 = self.wire_eval(row + 1, 3);
        let deltas = [
            w_3 - four * w_4,
            w_2 - four * w_3,
            w_1 - four * w_2,
            next_w_4 - four * w_1,
        ];
        if deltas.iter().all(|d| quad(*d).is_some()) {
            Ok(())
        } else {
            Err(unsatisfied(row, "range accumulator step is not a quad"))
        }
    }

    fn check_logic(&self, row: usize) -> Result<()> {
        let four = F::from(4u64);
        let delta = |wire: usize| self.wire_eval(row + 1, wire) - four * self.wire_eval(row, wire);
        let (a, b, c) = match (quad(delta(0)), quad(delta(1)), quad(delta(3))) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return Err(unsatisfied(row, "logic accumulator step is not a quad")),
        };
        if self.wire_eval(row, 2) != F::from(a * b) {
            return Err(unsatisfied(row, "logic product mismatch"));
        }
        let is_xor = self.selector_value(row, Selector::QLogic) == -F::one();
        let expected = if is_xor { a ^ b } else { a & b };
        if c != expected {
            return Err(unsatisfied(row, "logic output mismatch"));
        }
        Ok(())
    }

    fn check_sort(&self, row: usize) -> Result<()> {
        let w: Vec<F> = (0..4).map(|i| self.wire_eval(row, i)).collect();
        let next_w_1 = self.wire_eval(row + 1, 0);
        let deltas = [w[1] - w[0], w[2] - w[1], w[3] - w[2], next_w_1 - w[3]];
        if deltas.iter().all(|d| quad(*d).is_some()) {
            Ok(())
        } else {
            Err(unsatisfied(row, "sorted list step exceeds 3"))
        }
    }

    fn check_elliptic(&self, row: usize) -> Result<()> {
        let x_1 = self.wire_eval(row, 1);
        let y_1 = self.wire_eval(row, 2);
        let x_2 = self.selector_value(row, Selector::Q3) * self.wire_eval(row + 1, 0);
        let y_2 = self.selector_value(row, Selector::Q1) * self.wire_eval(row + 1, 3);
        let x_3 = self.wire_eval(row + 1, 1);
        let y_3 = self.wire_eval(row + 1, 2);
        let lambda = match (x_2 - x_1).inverse() {
            Some(inv) => (y_2 - y_1) * inv,
            None => return Err(unsatisfied(row, "elliptic addition of equal abscissae")),
        };
        let x = lambda.square() - x_1 - x_2;
        let y = lambda * (x_1 - x) - y_1;
        if x == x_3 && y == y_3 {
            Ok(())
        } else {
            Err(unsatisfied(row, "elliptic addition mismatch"))
        }
    }
}
