//! Arithmetic and elliptic gate emission. Each method fixes the selector policy of
//! one gate shape; selectors not mentioned stay zero.
use crate::plonk::constraint_system::{
    flavor::{GateKind, Selector},
    gates::{AddQuad, AddTriple, EccAddGate, MulQuad, MulTriple, PolyTriple},
    CircuitBuilder, VarIndex,
};
use ark_ff::{One, PrimeField, Zero};

impl<F: PrimeField> CircuitBuilder<F> {
    /// `a_scaling * a + b_scaling * b + c_scaling * c + const_scaling = 0`.
    pub fn create_add_gate(&mut self, gate: &AddTriple<F>) {
        self.push_gate(
            GateKind::Arithmetic,
            [gate.a, gate.b, gate.c, self.zero_idx],
            &[
                (Selector::Q1, gate.a_scaling),
                (Selector::Q2, gate.b_scaling),
                (Selector::Q3, gate.c_scaling),
                (Selector::QC, gate.const_scaling),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// `mul_scaling * a * b + c_scaling * c + const_scaling = 0`.
    pub fn create_mul_gate(&mut self, gate: &MulTriple<F>) {
        self.push_gate(
            GateKind::Arithmetic,
            [gate.a, gate.b, gate.c, self.zero_idx],
            &[
                (Selector::QM, gate.mul_scaling),
                (Selector::Q3, gate.c_scaling),
                (Selector::QC, gate.const_scaling),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// Constrain `a` to {0, 1}: `a * a - a = 0`.
    pub fn create_bool_gate(&mut self, a: VarIndex) {
        self.push_gate(
            GateKind::Arithmetic,
            [a, a, a, self.zero_idx],
            &[
                (Selector::QM, F::one()),
                (Selector::Q3, -F::one()),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// `q_m * a * b + q_l * a + q_r * b + q_o * c + q_c = 0`.
    pub fn create_poly_gate(&mut self, gate: &PolyTriple<F>) {
        self.push_gate(
            GateKind::Arithmetic,
            [gate.a, gate.b, gate.c, self.zero_idx],
            &[
                (Selector::QM, gate.q_m),
                (Selector::Q1, gate.q_l),
                (Selector::Q2, gate.q_r),
                (Selector::Q3, gate.q_o),
                (Selector::QC, gate.q_c),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// Pin `index` to `value`.
    pub fn fix_witness(&mut self, index: VarIndex, value: F) {
        self.push_gate(
            GateKind::Arithmetic,
            [index, self.zero_idx, self.zero_idx, self.zero_idx],
            &[
                (Selector::Q1, F::one()),
                (Selector::QC, -value),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// Four-wire linear relation. With `use_next_gate_w_4` the fourth wire of
    /// the next row is added to the relation, which lets accumulators chain.
    pub fn create_big_add_gate(&mut self, gate: &AddQuad<F>, use_next_gate_w_4: bool) {
        let (kind, q_arith) = if use_next_gate_w_4 {
            (GateKind::ChainedArithmetic, F::from(2u64))
        } else {
            (GateKind::WideArithmetic, F::one())
        };
        self.push_gate(
            kind,
            [gate.a, gate.b, gate.c, gate.d],
            &[
                (Selector::Q1, gate.a_scaling),
                (Selector::Q2, gate.b_scaling),
                (Selector::Q3, gate.c_scaling),
                (Selector::Q4, gate.d_scaling),
                (Selector::QC, gate.const_scaling),
                (Selector::QArith, q_arith),
            ],
        );
    }

    /// Four-wire linear relation whose fourth wire is also restricted to
    /// {0, 1, 2, 3}.
    pub fn create_balanced_add_gate(&mut self, gate: &AddQuad<F>) {
        self.push_gate(
            GateKind::BalancedAdd,
            [gate.a, gate.b, gate.c, gate.d],
            &[
                (Selector::Q1, gate.a_scaling),
                (Selector::Q2, gate.b_scaling),
                (Selector::Q3, gate.c_scaling),
                (Selector::Q4, gate.d_scaling),
                (Selector::Q5, F::one()),
                (Selector::QC, gate.const_scaling),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// Four-wire relation with a product term.
    pub fn create_big_mul_gate(&mut self, gate: &MulQuad<F>) {
        self.push_gate(
            GateKind::WideArithmetic,
            [gate.a, gate.b, gate.c, gate.d],
            &[
                (Selector::QM, gate.mul_scaling),
                (Selector::Q1, gate.a_scaling),
                (Selector::Q2, gate.b_scaling),
                (Selector::Q3, gate.c_scaling),
                (Selector::Q4, gate.d_scaling),
                (Selector::QC, gate.const_scaling),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// Rows with every selector zero, used to place variables in the wire
    /// columns without constraining them.
    pub fn create_dummy_constraints(&mut self, variable_indices: &[VarIndex]) {
        let width = self.flavor.program_width;
        let mut padded = variable_indices.to_vec();
        while padded.len() % width != 0 {
            padded.push(self.zero_idx);
        }
        let kind = if width == 4 {
            GateKind::WideArithmetic
        } else {
            GateKind::Arithmetic
        };
        for chunk in padded.chunks(width) {
            let mut wires = [self.zero_idx; 4];
            wires[..width].copy_from_slice(chunk);
            self.push_gate(kind, wires, &[]);
        }
    }

    /// Elliptic curve addition over two rows:
    ///
    /// | w_1 | w_2 | w_3 | w_4 |
    /// | --  | x1  | y1  | --  |
    /// | x2  | x3  | y3  | y2  |
    ///
    /// The first row is shared with the previous gate when that gate already
    /// carries `(x1, y1)` and has no conflicting selector.
    pub fn create_ecc_add_gate(&mut self, gate: &EccAddGate<F>) {
        for index in [gate.x1, gate.x2, gate.x3, gate.y1, gate.y2, gate.y3] {
            self.variables.assert_valid(index);
        }
        assert!(
            !self.circuit_finalised,
            "gate emitted after finalize_circuit"
        );
        let can_fuse = self.num_gates > 0 && {
            let prev = self.num_gates - 1;
            self.wire_value(prev, 1) == gate.x1
                && self.wire_value(prev, 2) == gate.y1
                && [Selector::Q1, Selector::Q3, Selector::Q4, Selector::QArith]
                    .iter()
                    .all(|s| self.selector_value(prev, *s).is_zero())
        };
        if can_fuse {
            let prev = self.num_gates - 1;
            self.set_selector(prev, Selector::Q3, gate.endomorphism_coefficient);
            self.set_selector(prev, Selector::Q4, gate.endomorphism_coefficient);
            self.set_selector(prev, Selector::Q1, gate.sign_coefficient);
            self.set_selector(prev, Selector::QElliptic, F::one());
        } else {
            self.push_gate(
                GateKind::Elliptic,
                [self.zero_idx, gate.x1, gate.y1, self.zero_idx],
                &[
                    (Selector::Q3, gate.endomorphism_coefficient),
                    (Selector::Q4, gate.endomorphism_coefficient),
                    (Selector::Q1, gate.sign_coefficient),
                    (Selector::QElliptic, F::one()),
                ],
            );
        }
        self.push_gate(
            GateKind::Elliptic,
            [gate.x2, gate.x3, gate.y3, gate.y2],
            &[],
        );
    }

    /// Create an output variable holding `a + b` and constrain it.
    pub fn add(&mut self, a: VarIndex, b: VarIndex) -> VarIndex {
        let sum = self.get_variable(a) + self.get_variable(b);
        let c = self.add_variable(sum);
        self.create_add_gate(&AddTriple {
            a,
            b,
            c,
            a_scaling: F::one(),
            b_scaling: F::one(),
            c_scaling: -F::one(),
            const_scaling: F::zero(),
        });
        c
    }

    /// Create an output variable holding `a * b` and constrain it.
    pub fn mul(&mut self, a: VarIndex, b: VarIndex) -> VarIndex {
        let product = self.get_variable(a) * self.get_variable(b);
        let c = self.add_variable(product);
        self.create_mul_gate(&MulTriple {
            a,
            b,
            c,
            mul_scaling: F::one(),
            c_scaling: -F::one(),
            const_scaling: F::zero(),
        });
        c
    }
}
