use crate::plonk::constraint_system::{
    flavor::{CircuitConfig, CircuitFlavor, FlavorConfig, GateKind, Selector},
    memory::{RamTranscript, RomTranscript},
    range::RangeList,
    variables::{Merge, VariableStore},
};
use ark_ff::PrimeField;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Module for gate-input records.
pub mod gates;

/// Module for flavor tables and configuration.
pub mod flavor;

/// Module for the variable store.
pub mod variables;

/// Module for arithmetic and elliptic gates.
pub mod arithmetic;

/// Module for range constraints and sorted lists.
pub mod range;

/// Module for AND/XOR constraints.
pub mod logic;

/// Module for ROM/RAM arrays.
pub mod memory;

/// Module for the native circuit checker.
pub mod checker;

/// Variable index
pub type VarIndex = u32;
/// Constraint index
pub type CsIndex = usize;

/// Read-only view of a circuit, consumed by copy cycles, permutation and key assembly.
pub trait ConstraintSystem {
    type Field: PrimeField;

    /// The static table of the flavor.
    fn flavor(&self) -> &'static FlavorConfig;

    /// Number of gate rows, public input rows excluded.
    fn num_gates(&self) -> usize;

    /// Number of variables.
    fn num_variables(&self) -> usize;

    /// Variables promoted to public inputs, in row order.
    fn public_inputs(&self) -> &[VarIndex];

    /// Number of public inputs.
    fn num_public_inputs(&self) -> usize {
        self.public_inputs().len()
    }

    /// The wire columns, `program_width` of them.
    fn wires(&self) -> &[Vec<VarIndex>];

    /// The selector columns, in the flavor's order.
    fn selectors(&self) -> &[Vec<Self::Field>];

    /// Canonical index of the class of `index`.
    fn real_variable_index(&self, index: VarIndex) -> VarIndex;

    /// Tag of the class of `index`.
    fn variable_tag(&self, index: VarIndex) -> u32;

    /// Partner tag of `tag`.
    fn tau(&self, tag: u32) -> Option<u32>;

    /// Value of the class of `index`.
    fn get_variable(&self, index: VarIndex) -> Self::Field;

    /// Whether `finalize_circuit` ran.
    fn is_finalized(&self) -> bool;

    /// Whether the circuit was marked failed while being built.
    fn failed(&self) -> bool;

    /// The first failure message, if any.
    fn err(&self) -> Option<&str>;

    /// Minimum size requested by the configuration.
    fn minimum_circuit_size(&self) -> usize {
        0
    }

    /// Absolute rows of memory read and write records.
    fn memory_records(&self) -> (&[u32], &[u32]) {
        (&[], &[])
    }

    /// Public input positions holding the outputs of an inner proof.
    fn recursive_proof_public_input_indices(&self) -> &[u32] {
        &[]
    }

    /// Padded size of the circuit: public inputs, gates and reserved rows, rounded
    /// up to a power of two.
    fn circuit_subgroup_size(&self) -> usize {
        let total =
            self.num_public_inputs() + self.num_gates() + self.flavor().num_reserved_gates;
        total.max(self.minimum_circuit_size()).next_power_of_two()
    }
}

/// The circuit builder: owns the variables, the wire columns and the selector
/// columns of one circuit. Gadgets receive `&mut CircuitBuilder` and lower
/// themselves through its gate methods.
#[derive(Debug, Clone)]
pub struct CircuitBuilder<F: PrimeField> {
    pub(crate) config: CircuitConfig,
    pub(crate) flavor: &'static FlavorConfig,
    pub(crate) variables: VariableStore<F>,
    /// `program_width` columns of variable indices, one entry per gate.
    pub(crate) wires: Vec<Vec<VarIndex>>,
    /// One column per flavor selector, one entry per gate.
    pub(crate) selectors: Vec<Vec<F>>,
    pub(crate) public_inputs: Vec<VarIndex>,
    pub(crate) num_gates: usize,
    pub(crate) zero_idx: VarIndex,
    constant_variable_indices: BTreeMap<F, VarIndex>,
    failed: bool,
    err: Option<String>,
    pub(crate) circuit_finalised: bool,
    pub(crate) range_lists: BTreeMap<u64, RangeList>,
    pub(crate) rom_arrays: Vec<RomTranscript>,
    pub(crate) ram_arrays: Vec<RamTranscript>,
    /// Absolute rows of memory read records, filled at finalization.
    pub(crate) memory_read_records: Vec<u32>,
    /// Absolute rows of memory write records, filled at finalization.
    pub(crate) memory_write_records: Vec<u32>,
    contains_recursive_proof: bool,
    recursive_proof_public_input_indices: Vec<u32>,
}

impl<F: PrimeField> ConstraintSystem for CircuitBuilder<F> {
    type Field = F;

    fn flavor(&self) -> &'static FlavorConfig {
        self.flavor
    }

    fn num_gates(&self) -> usize {
        self.num_gates
    }

    fn num_variables(&self) -> usize {
        self.variables.len()
    }

    fn public_inputs(&self) -> &[VarIndex] {
        &self.public_inputs
    }

    fn wires(&self) -> &[Vec<VarIndex>] {
        &self.wires
    }

    fn selectors(&self) -> &[Vec<F>] {
        &self.selectors
    }

    fn real_variable_index(&self, index: VarIndex) -> VarIndex {
        self.variables.canonical(index)
    }

    fn variable_tag(&self, index: VarIndex) -> u32 {
        self.variables.tag(index)
    }

    fn tau(&self, tag: u32) -> Option<u32> {
        self.variables.tau(tag)
    }

    fn get_variable(&self, index: VarIndex) -> F {
        self.variables.get(index)
    }

    fn is_finalized(&self) -> bool {
        self.circuit_finalised
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn err(&self) -> Option<&str> {
        self.err.as_deref()
    }

    fn minimum_circuit_size(&self) -> usize {
        self.config.minimum_circuit_size
    }

    fn memory_records(&self) -> (&[u32], &[u32]) {
        (&self.memory_read_records, &self.memory_write_records)
    }

    fn recursive_proof_public_input_indices(&self) -> &[u32] {
        &self.recursive_proof_public_input_indices
    }
}

impl<F: PrimeField> Default for CircuitBuilder<F> {
    fn default() -> Self {
        Self::new(CircuitConfig::default())
    }
}

impl<F: PrimeField> CircuitBuilder<F> {
    /// Create a builder. Variable 0 is the constant zero.
    pub fn new(config: CircuitConfig) -> CircuitBuilder<F> {
        let flavor = config.flavor.config();
        let hint = config.size_hint;
        let mut builder = CircuitBuilder {
            flavor,
            variables: VariableStore::with_capacity(hint * 3),
            wires: (0..flavor.program_width)
                .map(|_| Vec::with_capacity(hint))
                .collect(),
            selectors: (0..flavor.selectors.len())
                .map(|_| Vec::with_capacity(hint))
                .collect(),
            public_inputs: vec![],
            num_gates: 0,
            zero_idx: 0,
            constant_variable_indices: BTreeMap::new(),
            failed: false,
            err: None,
            circuit_finalised: false,
            range_lists: BTreeMap::new(),
            rom_arrays: vec![],
            ram_arrays: vec![],
            memory_read_records: vec![],
            memory_write_records: vec![],
            contains_recursive_proof: false,
            recursive_proof_public_input_indices: vec![],
            config,
        };
        builder.zero_idx = builder.put_constant_variable(F::zero());
        builder
    }

    /// Create a builder of the given flavor with default sizing.
    pub fn with_flavor(flavor: CircuitFlavor) -> CircuitBuilder<F> {
        Self::new(CircuitConfig::new(flavor))
    }

    /// The run-time configuration.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// The index of the zero constant.
    pub fn zero_idx(&self) -> VarIndex {
        self.zero_idx
    }

    /// Number of gate rows.
    pub fn get_num_gates(&self) -> usize {
        self.num_gates
    }

    /// Number of public inputs.
    pub fn get_num_public_inputs(&self) -> usize {
        self.public_inputs.len()
    }

    /// Add a private variable.
    pub fn add_variable(&mut self, value: F) -> VarIndex {
        self.variables.add_variable(value)
    }

    /// Add a variable and promote it to a public input.
    pub fn add_public_variable(&mut self, value: F) -> VarIndex {
        let index = self.add_variable(value);
        self.public_inputs.push(index);
        index
    }

    /// Promote an existing variable to a public input.
    pub fn set_public_input(&mut self, index: VarIndex) {
        self.variables.assert_valid(index);
        if self.public_inputs.contains(&index) {
            self.failure("Attempted to set a public input that is already public!");
            return;
        }
        self.public_inputs.push(index);
    }

    /// Value of the class of `index`. Panics on an invalid index.
    pub fn get_variable(&self, index: VarIndex) -> F {
        self.variables.get(index)
    }

    /// Overwrite the value of the class of `index`.
    pub fn set_variable(&mut self, index: VarIndex, value: F) {
        self.variables.set(index, value)
    }

    /// Number of variables.
    pub fn get_num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Read access to the variable store.
    pub fn variables(&self) -> &VariableStore<F> {
        &self.variables
    }

    /// Copy-constrain `a` and `b`. Differing values or clashing tags mark the
    /// circuit failed with `msg`.
    pub fn assert_equal(&mut self, a: VarIndex, b: VarIndex, msg: &str) {
        self.variables.assert_valid(a);
        self.variables.assert_valid(b);
        if self.get_variable(a) != self.get_variable(b) {
            self.failure(msg);
        }
        if self.variables.merge(a, b) == Merge::TagClash {
            self.failure(msg);
        }
    }

    /// Return the variable fixed to `value`, creating it on first use.
    pub fn put_constant_variable(&mut self, value: F) -> VarIndex {
        if let Some(index) = self.constant_variable_indices.get(&value) {
            return *index;
        }
        let index = self.add_variable(value);
        self.fix_witness(index, value);
        self.constant_variable_indices.insert(value, index);
        index
    }

    /// Expose the outputs of an inner proof as public inputs. Only one inner proof
    /// may be registered. An output that is already public fails the circuit and
    /// keeps its existing position.
    pub fn add_recursive_proof(&mut self, proof_output_witness_indices: &[VarIndex]) {
        if self.contains_recursive_proof {
            self.failure("added recursive proof when one already exists");
            return;
        }
        self.contains_recursive_proof = true;
        for index in proof_output_witness_indices {
            self.set_public_input(*index);
            if let Some(position) = self.public_inputs.iter().position(|p| p == index) {
                self.recursive_proof_public_input_indices.push(position as u32);
            }
        }
    }

    /// Whether an inner proof was registered.
    pub fn contains_recursive_proof(&self) -> bool {
        self.contains_recursive_proof
    }

    /// Public input positions holding the inner proof outputs.
    pub fn recursive_proof_public_input_indices(&self) -> &[u32] {
        &self.recursive_proof_public_input_indices
    }

    /// Absolute rows of memory read and write records.
    pub fn memory_records(&self) -> (&[u32], &[u32]) {
        (&self.memory_read_records, &self.memory_write_records)
    }

    /// Mark the circuit failed. The first message is kept.
    pub fn failure(&mut self, msg: &str) {
        if self.failed {
            return;
        }
        warn!("circuit marked failed: {}", msg);
        self.failed = true;
        self.err = Some(msg.to_string());
    }

    /// Whether the circuit was marked failed.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// The failure message, if any.
    pub fn err(&self) -> Option<&str> {
        self.err.as_deref()
    }

    /// Whether `finalize_circuit` ran.
    pub fn is_finalized(&self) -> bool {
        self.circuit_finalised
    }

    /// Padded circuit size.
    pub fn get_circuit_subgroup_size(&self) -> usize {
        self.circuit_subgroup_size()
    }

    /// Emit the deferred ROM/RAM and range-list gates and close the circuit.
    /// A second call does nothing.
    pub fn finalize_circuit(&mut self) {
        if self.circuit_finalised {
            return;
        }
        let offset = self.public_inputs.len();
        self.process_rom_arrays(offset);
        self.process_ram_arrays(offset);
        self.process_range_lists();
        self.circuit_finalised = true;
        debug!(
            "finalized {} circuit: {} gates, {} public inputs, {} variables",
            self.flavor.name,
            self.num_gates,
            self.public_inputs.len(),
            self.variables.len()
        );
    }

    /// Append one gate row. Wires beyond the flavor's width must be the zero
    /// variable; selectors the flavor lacks are skipped.
    pub(crate) fn push_gate(
        &mut self,
        kind: GateKind,
        wires: [VarIndex; 4],
        selectors: &[(Selector, F)],
    ) -> usize {
        assert!(
            !self.circuit_finalised,
            "gate emitted after finalize_circuit"
        );
        assert!(
            self.flavor.supports(kind),
            "{:?} gates are not supported by the {} flavor",
            kind,
            self.flavor.name
        );
        for wire in wires.iter() {
            self.variables.assert_valid(*wire);
        }
        let width = self.flavor.program_width;
        assert!(
            wires[width..].iter().all(|w| *w == self.zero_idx),
            "{} flavor has {} wires",
            self.flavor.name,
            width
        );
        for (column, wire) in self.wires.iter_mut().zip(wires.iter()) {
            column.push(*wire);
        }
        for column in self.selectors.iter_mut() {
            column.push(F::zero());
        }
        let row = self.num_gates;
        for (selector, value) in selectors {
            if let Some(column) = self.flavor.selector_column(*selector) {
                self.selectors[column][row] = *value;
            }
        }
        self.num_gates += 1;
        self.finish_new_gate(kind, row);
        row
    }

    /// Overwrite a selector of an emitted row.
    pub(crate) fn set_selector(&mut self, row: usize, selector: Selector, value: F) {
        if let Some(column) = self.flavor.selector_column(selector) {
            self.selectors[column][row] = value;
        }
    }

    /// Read a selector of an emitted row; absent selectors read as zero.
    pub fn selector_value(&self, row: usize, selector: Selector) -> F {
        self.flavor
            .selector_column(selector)
            .map(|column| self.selectors[column][row])
            .unwrap_or_else(F::zero)
    }

    /// Read a wire of an emitted row; absent wires read as the zero variable.
    pub fn wire_value(&self, row: usize, wire: usize) -> VarIndex {
        self.wires.get(wire).map(|c| c[row]).unwrap_or(self.zero_idx)
    }

    /// Check the new row when it does not depend on the next one.
    #[cfg(feature = "debug")]
    fn finish_new_gate(&self, kind: GateKind, row: usize) {
        if matches!(
            kind,
            GateKind::Arithmetic | GateKind::WideArithmetic | GateKind::BalancedAdd
        ) {
            if let Err(e) = self.check_row(row) {
                panic!("{}", e);
            }
        }
    }

    #[cfg(not(feature = "debug"))]
    #[inline]
    fn finish_new_gate(&self, _kind: GateKind, _row: usize) {}
}
