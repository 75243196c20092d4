//! AND/XOR constraints over `num_bits`-bit operands.
use crate::plonk::constraint_system::{
    flavor::{GateKind, Selector},
    gates::{AccumulatorTriple, AddTriple, MulTriple, PolyTriple},
    CircuitBuilder, VarIndex,
};
use crate::utils::field_to_biguint;
use ark_ff::{One, PrimeField, Zero};
use num_bigint::BigUint;

fn quad_at(value: &BigUint, window: usize) -> u64 {
    let lo = value.bit(2 * window as u64) as u64;
    let hi = value.bit(2 * window as u64 + 1) as u64;
    lo + 2 * hi
}

impl<F: PrimeField> CircuitBuilder<F> {
    /// `a AND b` over `num_bits` bits.
    pub fn create_and_constraint(
        &mut self,
        a: VarIndex,
        b: VarIndex,
        num_bits: usize,
    ) -> AccumulatorTriple {
        self.create_logic_constraint(a, b, num_bits, false)
    }

    /// `a XOR b` over `num_bits` bits.
    pub fn create_xor_constraint(
        &mut self,
        a: VarIndex,
        b: VarIndex,
        num_bits: usize,
    ) -> AccumulatorTriple {
        self.create_logic_constraint(a, b, num_bits, true)
    }

    /// Constrain `a` and `b` as `num_bits`-bit values and compute their AND or
    /// XOR two bits at a time. Entry `i` of each accumulator holds the value of
    /// the top `2 * (i + 1)` bits; the last `left`/`right` entries are `a`/`b`
    /// and the last `out` entry is the result.
    pub fn create_logic_constraint(
        &mut self,
        a: VarIndex,
        b: VarIndex,
        num_bits: usize,
        is_xor_gate: bool,
    ) -> AccumulatorTriple {
        assert!(
            num_bits > 0 && num_bits % 2 == 0,
            "logic constraints need a positive even number of bits, got {}",
            num_bits
        );
        let mut accumulators = if self.flavor.supports(GateKind::Logic) {
            self.logic_quads(a, b, num_bits, is_xor_gate)
        } else {
            self.logic_bits(a, b, num_bits, is_xor_gate)
        };

        let last = accumulators.left.len() - 1;
        self.assert_equal(
            a,
            accumulators.left[last],
            "cannot reproduce `a` value using accumulator.",
        );
        accumulators.left[last] = a;
        self.assert_equal(
            b,
            accumulators.right[last],
            "cannot reproduce `b` value using accumulator.",
        );
        accumulators.right[last] = b;
        accumulators
    }

    /// Base-4 accumulator rows:
    ///
    /// | w_1     | w_2     | w_3       | w_4     |
    /// | 0       | 0       | a_0 * b_0 | 0       |
    /// | left_0  | right_0 | a_1 * b_1 | out_0   |
    /// | ...     | ...     | ...       | ...     |
    /// | left_m  | right_m | 0         | out_m   |
    fn logic_quads(
        &mut self,
        a: VarIndex,
        b: VarIndex,
        num_bits: usize,
        is_xor_gate: bool,
    ) -> AccumulatorTriple {
        let num_quads = num_bits / 2;
        let left_value = field_to_biguint(&self.get_variable(a));
        let right_value = field_to_biguint(&self.get_variable(b));
        let four = F::from(4u64);

        let mut accumulators = AccumulatorTriple::default();
        let mut products = Vec::with_capacity(num_quads);
        let (mut left_acc, mut right_acc, mut out_acc) = (F::zero(), F::zero(), F::zero());
        for window in (0..num_quads).rev() {
            let left_quad = quad_at(&left_value, window);
            let right_quad = quad_at(&right_value, window);
            let out_quad = if is_xor_gate {
                left_quad ^ right_quad
            } else {
                left_quad & right_quad
            };
            left_acc = left_acc * four + F::from(left_quad);
            right_acc = right_acc * four + F::from(right_quad);
            out_acc = out_acc * four + F::from(out_quad);
            accumulators.left.push(self.add_variable(left_acc));
            accumulators.right.push(self.add_variable(right_acc));
            accumulators.out.push(self.add_variable(out_acc));
            products.push(self.add_variable(F::from(left_quad * right_quad)));
        }

        let selector = if is_xor_gate { -F::one() } else { F::one() };
        let zero = self.zero_idx;
        for row in 0..=num_quads {
            let (left, right, out) = if row == 0 {
                (zero, zero, zero)
            } else {
                (
                    accumulators.left[row - 1],
                    accumulators.right[row - 1],
                    accumulators.out[row - 1],
                )
            };
            if row < num_quads {
                self.push_gate(
                    GateKind::Logic,
                    [left, right, products[row], out],
                    &[(Selector::QC, selector), (Selector::QLogic, selector)],
                );
            } else {
                self.push_gate(GateKind::Logic, [left, right, zero, out], &[]);
            }
        }
        accumulators
    }

    /// Bit-by-bit construction for flavors without a logic selector. The
    /// accumulators are sampled every two bits so they match the base-4 ones.
    fn logic_bits(
        &mut self,
        a: VarIndex,
        b: VarIndex,
        num_bits: usize,
        is_xor_gate: bool,
    ) -> AccumulatorTriple {
        let left_value = field_to_biguint(&self.get_variable(a));
        let right_value = field_to_biguint(&self.get_variable(b));

        let mut left_bits = Vec::with_capacity(num_bits);
        let mut right_bits = Vec::with_capacity(num_bits);
        let mut out_bits = Vec::with_capacity(num_bits);
        for i in (0..num_bits as u64).rev() {
            let l = self.add_variable(F::from(left_value.bit(i)));
            let r = self.add_variable(F::from(right_value.bit(i)));
            self.create_bool_gate(l);
            self.create_bool_gate(r);
            let o = if is_xor_gate {
                let l_bit = left_value.bit(i);
                let r_bit = right_value.bit(i);
                let o = self.add_variable(F::from(l_bit ^ r_bit));
                // l + r - 2lr - o = 0
                self.create_poly_gate(&PolyTriple {
                    a: l,
                    b: r,
                    c: o,
                    q_m: -F::from(2u64),
                    q_l: F::one(),
                    q_r: F::one(),
                    q_o: -F::one(),
                    q_c: F::zero(),
                });
                o
            } else {
                let product = self.get_variable(l) * self.get_variable(r);
                let o = self.add_variable(product);
                self.create_mul_gate(&MulTriple {
                    a: l,
                    b: r,
                    c: o,
                    mul_scaling: F::one(),
                    c_scaling: -F::one(),
                    const_scaling: F::zero(),
                });
                o
            };
            left_bits.push(l);
            right_bits.push(r);
            out_bits.push(o);
        }

        AccumulatorTriple {
            left: self.accumulate_bit_windows(&left_bits),
            right: self.accumulate_bit_windows(&right_bits),
            out: self.accumulate_bit_windows(&out_bits),
        }
    }

    /// Running `acc = 2 * acc + bit` over most-significant-first bits, keeping
    /// the accumulator after every second bit.
    fn accumulate_bit_windows(&mut self, bits: &[VarIndex]) -> Vec<VarIndex> {
        let mut windows = Vec::with_capacity(bits.len() / 2);
        let mut acc = bits[0];
        for (i, bit) in bits.iter().enumerate().skip(1) {
            let value = self.get_variable(acc).double() + self.get_variable(*bit);
            let next = self.add_variable(value);
            self.create_add_gate(&AddTriple {
                a: acc,
                b: *bit,
                c: next,
                a_scaling: F::from(2u64),
                b_scaling: F::one(),
                c_scaling: -F::one(),
                const_scaling: F::zero(),
            });
            acc = next;
            if i % 2 == 1 {
                windows.push(acc);
            }
        }
        windows
    }
}

#[cfg(test)]
mod test {
    use crate::plonk::constraint_system::{flavor::CircuitFlavor, CircuitBuilder};
    use ark_bls12_381::Fr;

    type F = Fr;

    fn logic_circuit(flavor: CircuitFlavor, a: u64, b: u64, num_bits: usize, xor: bool) -> (CircuitBuilder<F>, u64) {
        let mut cs = CircuitBuilder::<F>::with_flavor(flavor);
        let a_idx = cs.add_variable(F::from(a));
        let b_idx = cs.add_variable(F::from(b));
        let expected = if xor { a ^ b } else { a & b };
        let result = cs.add_variable(F::from(expected));
        let accumulators = cs.create_logic_constraint(a_idx, b_idx, num_bits, xor);
        assert_eq!(accumulators.left.len(), num_bits / 2);
        assert_eq!(*accumulators.left.last().unwrap(), a_idx);
        assert_eq!(*accumulators.right.last().unwrap(), b_idx);
        let out = *accumulators.out.last().unwrap();
        assert_eq!(cs.get_variable(out), F::from(expected));
        cs.assert_equal(out, result, "logic result mismatch");
        (cs, expected)
    }

    #[test]
    fn test_xor_turbo() {
        let (mut cs, expected) = logic_circuit(CircuitFlavor::Turbo, 5, 3, 4, true);
        assert_eq!(expected, 6);
        cs.finalize_circuit();
        assert!(!cs.failed());
        assert!(cs.check_circuit().is_ok());
    }

    #[test]
    fn test_and_turbo() {
        let (cs, expected) = logic_circuit(CircuitFlavor::Turbo, 0xdead, 0xbeef, 16, false);
        assert_eq!(expected, 0xdead & 0xbeef);
        assert!(!cs.failed());
        assert!(cs.check_circuit().is_ok());
    }

    #[test]
    fn test_logic_without_logic_selector() {
        for flavor in [CircuitFlavor::Standard, CircuitFlavor::Ultra] {
            for xor in [true, false] {
                let (cs, _) = logic_circuit(flavor, 0b1011_0110, 0b0110_1101, 8, xor);
                assert!(!cs.failed());
                assert!(cs.check_circuit().is_ok());
            }
        }
    }

    #[test]
    fn test_operand_too_wide() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Turbo);
        let a = cs.add_variable(F::from(17u64));
        let b = cs.add_variable(F::from(3u64));
        cs.create_xor_constraint(a, b, 4);
        assert!(cs.failed());
        assert_eq!(
            cs.err(),
            Some("cannot reproduce `a` value using accumulator.")
        );
    }

    #[test]
    #[should_panic(expected = "even number of bits")]
    fn test_odd_bits_panics() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Turbo);
        let a = cs.add_variable(F::from(1u64));
        cs.create_and_constraint(a, a, 3);
    }
}
