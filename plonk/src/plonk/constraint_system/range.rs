//! Range constraints.
//!
//! Turbo circuits decompose the witness into base-4 accumulators checked by the
//! range selector. Ultra circuits tag the witness into a sorted list per target
//! range; the lists are emitted as sort rows at finalization. Flavors with
//! neither fall back to a boolean decomposition.
use crate::plonk::constraint_system::{
    flavor::{GateKind, Selector},
    gates::{AddQuad, AddTriple},
    variables::DUMMY_TAG,
    CircuitBuilder, VarIndex,
};
use crate::utils::field_to_biguint;
use ark_ff::{Field, One, PrimeField, Zero};
use num_bigint::BigUint;
use std::collections::BTreeSet;

/// Largest range, in bits, handled by a single sorted list.
pub const DEFAULT_PLOOKUP_RANGE_BITNUM: usize = 14;
/// Spacing of the filler values seeded into every sorted list.
pub const DEFAULT_PLOOKUP_RANGE_STEP_SIZE: u64 = 3;

/// Variables constrained to `[0, target_range]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeList {
    pub target_range: u64,
    /// Tag carried by the constrained variables.
    pub range_tag: u32,
    /// Tag carried by the sorted copies.
    pub tau_tag: u32,
    pub variable_indices: Vec<VarIndex>,
}

impl<F: PrimeField> CircuitBuilder<F> {
    /// Constrain `variable_index` to `num_bits` bits. A witness that does not fit
    /// marks the circuit failed with `msg`.
    pub fn create_range_constraint(&mut self, variable_index: VarIndex, num_bits: usize, msg: &str) {
        if num_bits == 0 {
            if !self.get_variable(variable_index).is_zero() {
                self.failure(msg);
            }
            let zero = self.zero_idx;
            self.assert_equal(variable_index, zero, msg);
            return;
        }
        if self.flavor.supports(GateKind::Range) {
            self.decompose_into_base4_accumulators(variable_index, num_bits, msg);
        } else if self.flavor.supports(GateKind::Sort) {
            if num_bits <= DEFAULT_PLOOKUP_RANGE_BITNUM {
                self.create_new_range_constraint(variable_index, (1u64 << num_bits) - 1, msg);
            } else {
                self.decompose_into_default_range(
                    variable_index,
                    num_bits,
                    DEFAULT_PLOOKUP_RANGE_BITNUM,
                    msg,
                );
            }
        } else {
            self.decompose_into_bits(variable_index, num_bits, msg);
        }
    }

    /// Base-4 decomposition over rows of four accumulators. Returns the
    /// accumulators, most significant first; the last one is `witness_index`.
    ///
    /// | w_1      | w_2      | w_3      | w_4      |
    /// | acc[3]   | acc[2]   | acc[1]   | acc[0]   |
    /// | acc[7]   | acc[6]   | acc[5]   | acc[4]   |
    /// | 0        | 0        | 0        | acc[8]   |
    ///
    /// Entries below the threshold are the zero variable, so the decomposition
    /// covers exactly `num_bits` bits rounded up to a quad.
    pub fn decompose_into_base4_accumulators(
        &mut self,
        witness_index: VarIndex,
        num_bits: usize,
        msg: &str,
    ) -> Vec<VarIndex> {
        assert!(num_bits > 0, "range constraint over zero bits");
        let value = field_to_biguint(&self.get_variable(witness_index));
        if value.bits() > num_bits as u64 {
            self.failure(msg);
        }

        let num_quad_gates = (num_bits + 7) / 8;
        let num_quads = num_quad_gates * 4;
        let forced_zero_threshold = 1 + (((num_quads << 1) - num_bits) >> 1);

        let zero = self.zero_idx;
        let four = F::from(4u64);
        let mut accumulator = F::zero();
        let mut accumulators = Vec::with_capacity(num_quads);
        let mut rows = vec![[zero; 4]; num_quad_gates + 1];
        for i in 0..=num_quads {
            let index = if i < forced_zero_threshold {
                zero
            } else {
                let bit = ((num_quads - i) << 1) as u64;
                let quad = value.bit(bit) as u64 + 2 * value.bit(bit + 1) as u64;
                accumulator = accumulator * four + F::from(quad);
                let index = self.add_variable(accumulator);
                accumulators.push(index);
                index
            };
            rows[i / 4][3 - (i % 4)] = index;
        }

        for (r, row) in rows.iter().enumerate() {
            let selectors: &[(Selector, F)] = if r < num_quad_gates {
                &[(Selector::QRange, F::one())]
            } else {
                &[]
            };
            self.push_gate(GateKind::Range, *row, selectors);
        }

        let last = accumulators.len() - 1;
        self.assert_equal(witness_index, accumulators[last], msg);
        accumulators[last] = witness_index;

        // an odd bit count leaves one spare bit in the top quad
        if num_bits & 1 == 1 {
            self.create_bool_gate(accumulators[0]);
        }
        accumulators
    }

    /// Split into `target_range_bitnum`-bit limbs, range-constrain each limb
    /// through a sorted list and recompose them with chained wide additions.
    /// Returns the limbs, least significant first.
    pub fn decompose_into_default_range(
        &mut self,
        variable_index: VarIndex,
        num_bits: usize,
        target_range_bitnum: usize,
        msg: &str,
    ) -> Vec<VarIndex> {
        assert!(num_bits > 0, "range constraint over zero bits");
        assert!(
            target_range_bitnum > 0 && target_range_bitnum < 64,
            "limb size {} out of bounds",
            target_range_bitnum
        );
        let value = field_to_biguint(&self.get_variable(variable_index));
        if value.bits() > num_bits as u64 {
            self.failure(msg);
        }

        let sublimb_mask = (1u64 << target_range_bitnum) - 1;
        let has_remainder_bits = num_bits % target_range_bitnum != 0;
        let num_limbs = num_bits / target_range_bitnum + has_remainder_bits as usize;
        let last_limb_size = num_bits % target_range_bitnum;
        let last_limb_range = (1u64 << last_limb_size) - 1;

        let mut rest = value.clone();
        let mut sublimbs = Vec::with_capacity(num_limbs);
        for _ in 0..num_limbs {
            let low = rest.to_u64_digits().first().copied().unwrap_or(0);
            sublimbs.push(low & sublimb_mask);
            rest >>= target_range_bitnum;
        }

        let mut sublimb_indices = Vec::with_capacity(num_limbs);
        for (i, limb) in sublimbs.iter().enumerate() {
            let limb_index = self.add_variable(F::from(*limb));
            sublimb_indices.push(limb_index);
            let range = if i == num_limbs - 1 && has_remainder_bits {
                last_limb_range
            } else {
                sublimb_mask
            };
            self.create_new_range_constraint(limb_index, range, msg);
        }

        let num_limb_triples = (num_limbs + 2) / 3;
        let mut accumulator = self.get_variable(variable_index);
        let mut accumulator_index = variable_index;
        for i in 0..num_limb_triples {
            let mut limbs = [self.zero_idx; 3];
            let mut scalings = [F::zero(); 3];
            let mut next = accumulator;
            for j in 0..3 {
                let k = 3 * i + j;
                let shift = F::from(2u64).pow([(target_range_bitnum * k) as u64]);
                scalings[j] = shift;
                if k < num_limbs {
                    limbs[j] = sublimb_indices[k];
                    next -= F::from(sublimbs[k]) * shift;
                }
            }
            let is_last = i == num_limb_triples - 1;
            self.create_big_add_gate(
                &AddQuad {
                    a: limbs[0],
                    b: limbs[1],
                    c: limbs[2],
                    d: accumulator_index,
                    a_scaling: scalings[0],
                    b_scaling: scalings[1],
                    c_scaling: scalings[2],
                    d_scaling: -F::one(),
                    const_scaling: F::zero(),
                },
                !is_last,
            );
            if !is_last {
                accumulator_index = self.add_variable(next);
                accumulator = next;
            }
        }
        sublimb_indices
    }

    /// Put `variable_index` into the sorted list of `target_range`, creating the
    /// list on first use.
    pub fn create_new_range_constraint(
        &mut self,
        variable_index: VarIndex,
        target_range: u64,
        msg: &str,
    ) {
        let value = field_to_biguint(&self.get_variable(variable_index));
        if value > BigUint::from(target_range) {
            self.failure(msg);
        }
        if !self.range_lists.contains_key(&target_range) {
            let list = self.create_range_list(target_range);
            self.range_lists.insert(target_range, list);
        }
        let list_tag = self.range_lists[&target_range].range_tag;
        let existing_tag = self.variables.tag(variable_index);
        if existing_tag == list_tag {
            return;
        }
        if existing_tag == DUMMY_TAG {
            self.variables.assign_tag(variable_index, list_tag);
            if let Some(list) = self.range_lists.get_mut(&target_range) {
                list.variable_indices.push(variable_index);
            }
            return;
        }

        let tighter = self
            .range_lists
            .values()
            .any(|l| l.range_tag == existing_tag && l.target_range < target_range);
        if tighter {
            return;
        }
        // one class carries one tag, so constrain a fresh copy instead
        let copy = self.add_variable(self.get_variable(variable_index));
        self.create_add_gate(&AddTriple {
            a: variable_index,
            b: copy,
            c: self.zero_idx,
            a_scaling: F::one(),
            b_scaling: -F::one(),
            c_scaling: F::zero(),
            const_scaling: F::zero(),
        });
        self.create_new_range_constraint(copy, target_range, msg);
    }

    /// A new list seeded with `0, 3, 6, ...` and `target_range`, so the sorted
    /// copy can always step by at most 3.
    pub(crate) fn create_range_list(&mut self, target_range: u64) -> RangeList {
        let range_tag = self.variables.get_new_tag();
        let tau_tag = self.variables.get_new_tag();
        self.variables.create_tag(range_tag, tau_tag);
        self.variables.create_tag(tau_tag, range_tag);

        let num_multiples_of_three = target_range / DEFAULT_PLOOKUP_RANGE_STEP_SIZE;
        let mut list = RangeList {
            target_range,
            range_tag,
            tau_tag,
            variable_indices: Vec::with_capacity(num_multiples_of_three as usize + 2),
        };
        for i in 0..=num_multiples_of_three {
            let index = self.add_variable(F::from(i * DEFAULT_PLOOKUP_RANGE_STEP_SIZE));
            self.variables.assign_tag(index, range_tag);
            list.variable_indices.push(index);
        }
        let index = self.add_variable(F::from(target_range));
        self.variables.assign_tag(index, range_tag);
        list.variable_indices.push(index);

        self.create_dummy_constraints(&list.variable_indices);
        list
    }

    /// Emit the sorted copy of every range list.
    pub(crate) fn process_range_lists(&mut self) {
        let lists: Vec<RangeList> = self.range_lists.values().cloned().collect();
        for list in lists.iter() {
            self.process_range_list(list);
        }
    }

    fn process_range_list(&mut self, list: &RangeList) {
        let mut seen = BTreeSet::new();
        let mut sorted_values: Vec<F> = list
            .variable_indices
            .iter()
            .filter(|index| seen.insert(self.variables.canonical(**index)))
            .map(|index| self.get_variable(*index))
            .collect();
        sorted_values.sort_unstable();

        let width = 4;
        let padding = (width - sorted_values.len() % width) % width;
        let mut indices = vec![self.zero_idx; padding];
        for value in sorted_values {
            let index = self.add_variable(value);
            self.variables.assign_tag(index, list.tau_tag);
            indices.push(index);
        }
        self.create_sort_constraint_with_edges(
            &indices,
            F::zero(),
            F::from(list.target_range),
        );
    }

    /// Constrain consecutive entries of `variable_indices` to differ by at most 3.
    pub fn create_sort_constraint(&mut self, variable_indices: &[VarIndex]) {
        assert!(
            !variable_indices.is_empty() && variable_indices.len() % 4 == 0,
            "sorted list length {} is not a positive multiple of 4",
            variable_indices.len()
        );
        for chunk in variable_indices.chunks(4) {
            self.push_gate(
                GateKind::Sort,
                [chunk[0], chunk[1], chunk[2], chunk[3]],
                &[(Selector::QSort, F::one())],
            );
        }
        // the last sort row reads the first wire of the next one
        let last = variable_indices[variable_indices.len() - 1];
        let zero = self.zero_idx;
        self.push_gate(GateKind::Sort, [last, zero, zero, zero], &[]);
    }

    /// Like `create_sort_constraint`, also pinning the first entry to `start`
    /// and the last one to `end`.
    pub fn create_sort_constraint_with_edges(
        &mut self,
        variable_indices: &[VarIndex],
        start: F,
        end: F,
    ) {
        assert!(
            !variable_indices.is_empty() && variable_indices.len() % 4 == 0,
            "sorted list length {} is not a positive multiple of 4",
            variable_indices.len()
        );
        for (k, chunk) in variable_indices.chunks(4).enumerate() {
            let wires = [chunk[0], chunk[1], chunk[2], chunk[3]];
            if k == 0 {
                self.push_gate(
                    GateKind::Sort,
                    wires,
                    &[
                        (Selector::Q1, F::one()),
                        (Selector::QC, -start),
                        (Selector::QArith, F::one()),
                        (Selector::QSort, F::one()),
                    ],
                );
            } else {
                self.push_gate(GateKind::Sort, wires, &[(Selector::QSort, F::one())]);
            }
        }
        let last = variable_indices[variable_indices.len() - 1];
        let zero = self.zero_idx;
        self.push_gate(
            GateKind::Arithmetic,
            [last, zero, zero, zero],
            &[
                (Selector::Q1, F::one()),
                (Selector::QC, -end),
                (Selector::QArith, F::one()),
            ],
        );
    }

    /// Boolean decomposition for flavors without range or sort selectors.
    /// Returns the bits, least significant first.
    pub(crate) fn decompose_into_bits(
        &mut self,
        variable_index: VarIndex,
        num_bits: usize,
        msg: &str,
    ) -> Vec<VarIndex> {
        let value = field_to_biguint(&self.get_variable(variable_index));
        if value.bits() > num_bits as u64 {
            self.failure(msg);
        }

        let bits: Vec<VarIndex> = (0..num_bits as u64)
            .map(|i| self.add_variable(F::from(value.bit(i))))
            .collect();
        for bit in bits.iter() {
            self.create_bool_gate(*bit);
        }

        let mut acc = bits[num_bits - 1];
        for bit in bits.iter().rev().skip(1) {
            let next_value = self.get_variable(acc).double() + self.get_variable(*bit);
            let next = self.add_variable(next_value);
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
        }
        self.assert_equal(variable_index, acc, msg);
        bits
    }
}
