//! ROM and RAM arrays.
//!
//! Every access emits one memory row `(index, value/timestamp, value, record)`. At
//! finalization each array is replayed in sorted order: the sorted rows carry a
//! second set of record witnesses, tagged as the partner set of the access
//! records, so the generalized permutation proves the two sets are equal. The
//! record wires themselves depend on a prover challenge and are left at zero;
//! only their absolute rows are kept.
use crate::plonk::constraint_system::{
    flavor::{GateKind, Selector},
    gates::AddQuad,
    CircuitBuilder, VarIndex,
};
use crate::utils::field_to_u64;
use ark_ff::{One, PrimeField, Zero};

/// Marks a cell that was never written.
pub const UNINITIALIZED_MEMORY_RECORD: u32 = u32::MAX;

/// Selector sets of the memory rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemorySelectors {
    RomRead,
    RomConsistencyCheck,
    RamRead,
    RamWrite,
    RamConsistencyCheck,
    RamTimestampCheck,
}

impl MemorySelectors {
    fn selectors<F: PrimeField>(&self) -> Vec<(Selector, F)> {
        let one = F::one();
        let mut selectors = vec![(Selector::QAux, one)];
        match self {
            MemorySelectors::RomRead | MemorySelectors::RamRead => {
                selectors.extend([(Selector::Q1, one), (Selector::QM, one)])
            }
            MemorySelectors::RamWrite => {
                selectors.extend([(Selector::Q1, one), (Selector::QM, one), (Selector::QC, one)])
            }
            MemorySelectors::RomConsistencyCheck => {
                selectors.extend([(Selector::Q1, one), (Selector::Q2, one)])
            }
            MemorySelectors::RamTimestampCheck => {
                selectors.extend([(Selector::Q1, one), (Selector::Q4, one)])
            }
            MemorySelectors::RamConsistencyCheck => selectors.push((Selector::QArith, one)),
        }
        selectors
    }
}

/// One ROM access.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RomRecord {
    pub index_witness: VarIndex,
    pub value_column1_witness: VarIndex,
    pub value_column2_witness: VarIndex,
    pub index: u32,
    pub record_witness: VarIndex,
    /// Row of the access, public inputs excluded.
    pub gate_index: usize,
}

/// State and access log of one ROM array. Cells hold two values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RomTranscript {
    pub state: Vec<[VarIndex; 2]>,
    pub records: Vec<RomRecord>,
}

/// Kind of a RAM access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    Read,
    Write,
}

/// One RAM access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RamRecord {
    pub index_witness: VarIndex,
    pub timestamp_witness: VarIndex,
    pub value_witness: VarIndex,
    pub index: u32,
    pub timestamp: u32,
    pub access_type: AccessType,
    pub record_witness: VarIndex,
    /// Row of the access, public inputs excluded.
    pub gate_index: usize,
}

/// State and access log of one RAM array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RamTranscript {
    pub state: Vec<VarIndex>,
    pub records: Vec<RamRecord>,
    pub access_count: usize,
}

impl<F: PrimeField> CircuitBuilder<F> {
    fn memory_index(&self, index_witness: VarIndex) -> u32 {
        field_to_u64(&self.get_variable(index_witness))
            .filter(|i| *i < UNINITIALIZED_MEMORY_RECORD as u64)
            .map(|i| i as u32)
            .unwrap_or(UNINITIALIZED_MEMORY_RECORD)
    }

    fn constant_index(&mut self, index_value: usize) -> VarIndex {
        if index_value == 0 {
            self.zero_idx
        } else {
            self.put_constant_variable(F::from(index_value as u64))
        }
    }

    fn create_memory_gate(&mut self, kind: MemorySelectors, wires: [VarIndex; 4]) -> usize {
        self.push_gate(GateKind::Memory, wires, &kind.selectors::<F>())
    }

    /// Open a ROM array of `array_size` cells. Returns its id.
    pub fn create_rom_array(&mut self, array_size: usize) -> usize {
        self.rom_arrays.push(RomTranscript {
            state: vec![[UNINITIALIZED_MEMORY_RECORD; 2]; array_size],
            records: vec![],
        });
        self.rom_arrays.len() - 1
    }

    /// Initialize cell `index_value` to `(value_witness, 0)`.
    pub fn set_rom_element(&mut self, rom_id: usize, index_value: usize, value_witness: VarIndex) {
        let zero = self.zero_idx;
        self.set_rom_cell(rom_id, index_value, [value_witness, zero]);
    }

    /// Initialize cell `index_value` to a pair of values.
    pub fn set_rom_element_pair(
        &mut self,
        rom_id: usize,
        index_value: usize,
        value_witnesses: [VarIndex; 2],
    ) {
        self.set_rom_cell(rom_id, index_value, value_witnesses);
    }

    fn set_rom_cell(&mut self, rom_id: usize, index_value: usize, values: [VarIndex; 2]) {
        assert!(rom_id < self.rom_arrays.len(), "unknown ROM array {}", rom_id);
        let size = self.rom_arrays[rom_id].state.len();
        assert!(index_value < size, "ROM index {} out of bounds ({})", index_value, size);
        assert_eq!(
            self.rom_arrays[rom_id].state[index_value][0],
            UNINITIALIZED_MEMORY_RECORD,
            "ROM cell {} is already initialized",
            index_value
        );
        let index_witness = self.constant_index(index_value);
        let mut record = RomRecord {
            index_witness,
            value_column1_witness: values[0],
            value_column2_witness: values[1],
            index: index_value as u32,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_rom_gate(&mut record);
        let rom = &mut self.rom_arrays[rom_id];
        rom.state[index_value] = values;
        rom.records.push(record);
    }

    /// Read the first value of the cell selected by `index_witness`. Returns a new
    /// variable holding it.
    pub fn read_rom_array(&mut self, rom_id: usize, index_witness: VarIndex) -> VarIndex {
        self.read_rom_cell(rom_id, index_witness, false)[0]
    }

    /// Read both values of the cell selected by `index_witness`.
    pub fn read_rom_array_pair(&mut self, rom_id: usize, index_witness: VarIndex) -> [VarIndex; 2] {
        self.read_rom_cell(rom_id, index_witness, true)
    }

    fn read_rom_cell(&mut self, rom_id: usize, index_witness: VarIndex, pair: bool) -> [VarIndex; 2] {
        assert!(rom_id < self.rom_arrays.len(), "unknown ROM array {}", rom_id);
        let index = self.memory_index(index_witness);
        let cell = {
            let rom = &self.rom_arrays[rom_id];
            assert!(
                (index as usize) < rom.state.len(),
                "ROM index {} out of bounds ({})",
                index,
                rom.state.len()
            );
            rom.state[index as usize]
        };
        assert_ne!(cell[0], UNINITIALIZED_MEMORY_RECORD, "ROM cell {} is uninitialized", index);

        let first = self.add_variable(self.get_variable(cell[0]));
        let second = if pair {
            self.add_variable(self.get_variable(cell[1]))
        } else {
            self.zero_idx
        };
        let mut record = RomRecord {
            index_witness,
            value_column1_witness: first,
            value_column2_witness: second,
            index,
            record_witness: 0,
            gate_index: 0,
        };
        self.create_rom_gate(&mut record);
        self.rom_arrays[rom_id].records.push(record);
        [first, second]
    }

    fn create_rom_gate(&mut self, record: &mut RomRecord) {
        record.record_witness = self.add_variable(F::zero());
        record.gate_index = self.create_memory_gate(
            MemorySelectors::RomRead,
            [
                record.index_witness,
                record.value_column1_witness,
                record.value_column2_witness,
                record.record_witness,
            ],
        );
    }

    fn create_sorted_rom_gate(&mut self, record: &mut RomRecord) {
        record.record_witness = self.add_variable(F::zero());
        record.gate_index = self.create_memory_gate(
            MemorySelectors::RomConsistencyCheck,
            [
                record.index_witness,
                record.value_column1_witness,
                record.value_column2_witness,
                record.record_witness,
            ],
        );
    }

    pub(crate) fn process_rom_arrays(&mut self, offset: usize) {
        for rom_id in 0..self.rom_arrays.len() {
            self.process_rom_array(rom_id, offset);
        }
    }

    fn process_rom_array(&mut self, rom_id: usize, offset: usize) {
        let read_tag = self.variables.get_new_tag();
        let sorted_list_tag = self.variables.get_new_tag();
        self.variables.create_tag(read_tag, sorted_list_tag);
        self.variables.create_tag(sorted_list_tag, read_tag);

        let size = self.rom_arrays[rom_id].state.len();
        let zero = self.zero_idx;
        for i in 0..size {
            if self.rom_arrays[rom_id].state[i][0] == UNINITIALIZED_MEMORY_RECORD {
                self.set_rom_cell(rom_id, i, [zero, zero]);
            }
        }

        let mut records = std::mem::take(&mut self.rom_arrays[rom_id].records);
        records.sort_by_key(|r| r.index);
        for record in records.iter() {
            let index_witness = self.add_variable(F::from(record.index as u64));
            let value1 = self.add_variable(self.get_variable(record.value_column1_witness));
            let value2 = self.add_variable(self.get_variable(record.value_column2_witness));
            let mut sorted = RomRecord {
                index_witness,
                value_column1_witness: value1,
                value_column2_witness: value2,
                index: record.index,
                record_witness: 0,
                gate_index: 0,
            };
            self.create_sorted_rom_gate(&mut sorted);

            self.variables.assign_tag(record.record_witness, read_tag);
            self.variables.assign_tag(sorted.record_witness, sorted_list_tag);
            self.memory_read_records.push((sorted.gate_index + offset) as u32);
            self.memory_read_records.push((record.gate_index + offset) as u32);
        }
        self.rom_arrays[rom_id].records = records;

        // the last sorted row reads the index of the next one, which must be the size
        let max_index_value = F::from(size as u64);
        let max_index = self.add_variable(max_index_value);
        self.push_gate(GateKind::Memory, [max_index, zero, zero, zero], &[]);
        self.create_big_add_gate(
            &AddQuad {
                a: max_index,
                b: zero,
                c: zero,
                d: zero,
                a_scaling: F::one(),
                b_scaling: F::zero(),
                c_scaling: F::zero(),
                d_scaling: F::zero(),
                const_scaling: -max_index_value,
            },
            false,
        );
    }

    /// Open a RAM array of `array_size` cells. Returns its id.
    pub fn create_ram_array(&mut self, array_size: usize) -> usize {
        self.ram_arrays.push(RamTranscript {
            state: vec![UNINITIALIZED_MEMORY_RECORD; array_size],
            records: vec![],
            access_count: 0,
        });
        self.ram_arrays.len() - 1
    }

    /// Initialize cell `index_value` of a RAM array. Every cell must be initialized
    /// before the circuit is finalized.
    pub fn init_ram_element(&mut self, ram_id: usize, index_value: usize, value_witness: VarIndex) {
        assert!(ram_id < self.ram_arrays.len(), "unknown RAM array {}", ram_id);
        let size = self.ram_arrays[ram_id].state.len();
        assert!(index_value < size, "RAM index {} out of bounds ({})", index_value, size);
        assert_eq!(
            self.ram_arrays[ram_id].state[index_value],
            UNINITIALIZED_MEMORY_RECORD,
            "RAM cell {} is already initialized",
            index_value
        );
        let index_witness = self.constant_index(index_value);
        self.ram_access(ram_id, index_witness, index_value as u32, value_witness, AccessType::Write);
        self.ram_arrays[ram_id].state[index_value] = value_witness;
    }

    /// Read the cell selected by `index_witness`. Returns a new variable holding
    /// its current value.
    pub fn read_ram_array(&mut self, ram_id: usize, index_witness: VarIndex) -> VarIndex {
        let index = self.checked_ram_index(ram_id, index_witness);
        let current = self.ram_arrays[ram_id].state[index as usize];
        let value_witness = self.add_variable(self.get_variable(current));
        self.ram_access(ram_id, index_witness, index, value_witness, AccessType::Read);
        value_witness
    }

    /// Write `value_witness` to the cell selected by `index_witness`.
    pub fn write_ram_array(&mut self, ram_id: usize, index_witness: VarIndex, value_witness: VarIndex) {
        let index = self.checked_ram_index(ram_id, index_witness);
        self.ram_access(ram_id, index_witness, index, value_witness, AccessType::Write);
        self.ram_arrays[ram_id].state[index as usize] = value_witness;
    }

    fn checked_ram_index(&self, ram_id: usize, index_witness: VarIndex) -> u32 {
        assert!(ram_id < self.ram_arrays.len(), "unknown RAM array {}", ram_id);
        let index = self.memory_index(index_witness);
        let ram = &self.ram_arrays[ram_id];
        assert!(
            (index as usize) < ram.state.len(),
            "RAM index {} out of bounds ({})",
            index,
            ram.state.len()
        );
        assert_ne!(
            ram.state[index as usize],
            UNINITIALIZED_MEMORY_RECORD,
            "RAM cell {} is uninitialized",
            index
        );
        index
    }

    fn ram_access(
        &mut self,
        ram_id: usize,
        index_witness: VarIndex,
        index: u32,
        value_witness: VarIndex,
        access_type: AccessType,
    ) {
        let timestamp = self.ram_arrays[ram_id].access_count as u32;
        let timestamp_witness = self.put_constant_variable(F::from(timestamp as u64));
        let record_witness = self.add_variable(F::zero());
        let kind = match access_type {
            AccessType::Read => MemorySelectors::RamRead,
            AccessType::Write => MemorySelectors::RamWrite,
        };
        let gate_index = self.create_memory_gate(
            kind,
            [index_witness, timestamp_witness, value_witness, record_witness],
        );
        let ram = &mut self.ram_arrays[ram_id];
        ram.records.push(RamRecord {
            index_witness,
            timestamp_witness,
            value_witness,
            index,
            timestamp,
            access_type,
            record_witness,
            gate_index,
        });
        ram.access_count += 1;
    }

    pub(crate) fn process_ram_arrays(&mut self, offset: usize) {
        for ram_id in 0..self.ram_arrays.len() {
            self.process_ram_array(ram_id, offset);
        }
    }

    fn process_ram_array(&mut self, ram_id: usize, offset: usize) {
        let access_tag = self.variables.get_new_tag();
        let sorted_list_tag = self.variables.get_new_tag();
        self.variables.create_tag(access_tag, sorted_list_tag);
        self.variables.create_tag(sorted_list_tag, access_tag);

        if self.ram_arrays[ram_id]
            .state
            .iter()
            .any(|cell| *cell == UNINITIALIZED_MEMORY_RECORD)
        {
            self.failure("RAM array has an uninitialized cell");
            return;
        }

        let size = self.ram_arrays[ram_id].state.len();
        let mut records = std::mem::take(&mut self.ram_arrays[ram_id].records);
        records.sort_by_key(|r| (r.index, r.timestamp));

        let zero = self.zero_idx;
        let mut sorted_records = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let index_witness = self.add_variable(F::from(record.index as u64));
            let timestamp_witness = self.add_variable(F::from(record.timestamp as u64));
            let value_witness = self.add_variable(self.get_variable(record.value_witness));
            let record_witness = self.add_variable(F::zero());
            let wires = [index_witness, timestamp_witness, value_witness, record_witness];
            let gate_index = if i + 1 < records.len() {
                self.create_memory_gate(MemorySelectors::RamConsistencyCheck, wires)
            } else {
                // the last sorted row only pins its index to the last cell
                let row = self.push_gate(GateKind::Memory, wires, &[]);
                self.create_big_add_gate(
                    &AddQuad {
                        a: index_witness,
                        b: zero,
                        c: zero,
                        d: zero,
                        a_scaling: F::one(),
                        b_scaling: F::zero(),
                        c_scaling: F::zero(),
                        d_scaling: F::zero(),
                        const_scaling: -F::from(size as u64 - 1),
                    },
                    false,
                );
                row
            };

            self.variables.assign_tag(record.record_witness, access_tag);
            self.variables.assign_tag(record_witness, sorted_list_tag);
            let rows = match record.access_type {
                AccessType::Read => &mut self.memory_read_records,
                AccessType::Write => &mut self.memory_write_records,
            };
            rows.push((gate_index + offset) as u32);
            rows.push((record.gate_index + offset) as u32);

            sorted_records.push(RamRecord {
                index_witness,
                timestamp_witness,
                value_witness,
                index: record.index,
                timestamp: record.timestamp,
                access_type: record.access_type,
                record_witness,
                gate_index,
            });
        }
        let access_count = self.ram_arrays[ram_id].access_count;
        self.ram_arrays[ram_id].records = records;

        if sorted_records.len() <= 1 {
            return;
        }
        let mut timestamp_deltas = Vec::with_capacity(sorted_records.len() - 1);
        for pair in sorted_records.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let delta = if current.index == next.index {
                F::from((next.timestamp - current.timestamp) as u64)
            } else {
                F::zero()
            };
            let delta_witness = self.add_variable(delta);
            self.create_memory_gate(
                MemorySelectors::RamTimestampCheck,
                [current.index_witness, current.timestamp_witness, delta_witness, zero],
            );
            timestamp_deltas.push(delta_witness);
        }
        if let Some(last) = sorted_records.last() {
            self.push_gate(
                GateKind::Memory,
                [last.index_witness, last.timestamp_witness, zero, zero],
                &[],
            );
        }

        // range lists add rows, so constrain the deltas after the timestamp block
        let max_timestamp = access_count as u64 - 1;
        for delta in timestamp_deltas {
            self.create_new_range_constraint(delta, max_timestamp, "RAM timestamp delta out of range");
        }
    }
}
