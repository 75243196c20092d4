//! Wire copy cycles: for every copy class, the list of wire positions it
//! occupies. Public input rows come first and every gate row is shifted down by
//! the number of public inputs.
use crate::plonk::constraint_system::{ConstraintSystem, VarIndex};
use log::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Wire columns, in column order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WireType {
    Left,
    Right,
    Output,
    Fourth,
}

impl WireType {
    /// The column index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The wire at column `index`.
    pub fn from_index(index: usize) -> Option<WireType> {
        match index {
            0 => Some(WireType::Left),
            1 => Some(WireType::Right),
            2 => Some(WireType::Output),
            3 => Some(WireType::Fourth),
            _ => None,
        }
    }
}

/// One wire position: column and absolute row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleNode {
    pub wire_index: u32,
    pub gate_index: u32,
}

impl CycleNode {
    pub fn new(wire: usize, gate: usize) -> Self {
        CycleNode {
            wire_index: wire as u32,
            gate_index: gate as u32,
        }
    }
}

/// The positions of one copy class, in emission order.
pub type CyclicPermutation = Vec<CycleNode>;

/// Collect the copy cycles of a finalized circuit, one per variable index. Only
/// canonical indices receive nodes; other entries stay empty.
///
/// Every public input contributes `(Left, i)` then `(Right, i)`. Gate positions
/// follow column by column.
pub fn compute_wire_copy_cycles<C: ConstraintSystem + Sync>(cs: &C) -> Vec<CyclicPermutation> {
    assert!(
        cs.is_finalized(),
        "copy cycles need a finalized circuit"
    );
    let num_public_inputs = cs.num_public_inputs();
    let mut cycles: Vec<CyclicPermutation> = vec![vec![]; cs.num_variables()];

    for (i, index) in cs.public_inputs().iter().enumerate() {
        let real = cs.real_variable_index(*index) as usize;
        cycles[real].push(CycleNode::new(WireType::Left.index(), i));
        cycles[real].push(CycleNode::new(WireType::Right.index(), i));
    }

    // canonical indices per column; columns are independent
    let canonical_column = |column: &Vec<VarIndex>| -> Vec<VarIndex> {
        column.iter().map(|v| cs.real_variable_index(*v)).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Vec<VarIndex>> = cs.wires().iter().map(canonical_column).collect();
    #[cfg(feature = "parallel")]
    let columns: Vec<Vec<VarIndex>> = cs.wires().par_iter().map(canonical_column).collect();

    for (j, column) in columns.iter().enumerate() {
        for (i, real) in column.iter().enumerate() {
            cycles[*real as usize].push(CycleNode::new(j, i + num_public_inputs));
        }
    }
    trace!(
        "{} copy cycles over {} positions",
        cycles.iter().filter(|c| !c.is_empty()).count(),
        cycles.iter().map(|c| c.len()).sum::<usize>()
    );
    cycles
}

#[cfg(test)]
mod test {
    use crate::plonk::{
        constraint_system::{flavor::CircuitFlavor, CircuitBuilder, ConstraintSystem},
        copy_cycles::{compute_wire_copy_cycles, CycleNode, WireType},
    };
    use ark_bls12_381::Fr;
    use std::collections::BTreeSet;

    type F = Fr;

    fn sample_circuit(flavor: CircuitFlavor) -> CircuitBuilder<F> {
        let mut cs = CircuitBuilder::<F>::with_flavor(flavor);
        let a = cs.add_public_variable(F::from(3u64));
        let b = cs.add_variable(F::from(4u64));
        let c = cs.add(a, b);
        let d = cs.mul(c, b);
        let e = cs.add_variable(F::from(28u64));
        cs.assert_equal(d, e, "product");
        cs.mul(e, a);
        cs.finalize_circuit();
        cs
    }

    #[test]
    fn test_cycles_cover_every_position_once() {
        for flavor in [CircuitFlavor::Standard, CircuitFlavor::Turbo, CircuitFlavor::Ultra] {
            let cs = sample_circuit(flavor);
            let cycles = compute_wire_copy_cycles(&cs);
            let nodes: Vec<CycleNode> = cycles.iter().flatten().copied().collect();
            let unique: BTreeSet<CycleNode> = nodes.iter().copied().collect();
            assert_eq!(nodes.len(), unique.len());

            let width = cs.flavor().program_width;
            let num_pi = cs.num_public_inputs();
            let mut expected = BTreeSet::new();
            for i in 0..num_pi {
                expected.insert(CycleNode::new(0, i));
                expected.insert(CycleNode::new(1, i));
            }
            for j in 0..width {
                for i in 0..cs.num_gates() {
                    expected.insert(CycleNode::new(j, i + num_pi));
                }
            }
            assert_eq!(unique, expected);
        }
    }

    #[test]
    fn test_cycles_follow_classes() {
        let cs = sample_circuit(CircuitFlavor::Turbo);
        let cycles = compute_wire_copy_cycles(&cs);
        for (index, cycle) in cycles.iter().enumerate() {
            if cs.real_variable_index(index as u32) != index as u32 {
                assert!(cycle.is_empty());
            }
            for node in cycle {
                let row = node.gate_index as usize;
                if row < cs.num_public_inputs() {
                    let var = cs.public_inputs()[row];
                    assert_eq!(cs.real_variable_index(var), index as u32);
                } else {
                    let var = cs.wires()[node.wire_index as usize][row - cs.num_public_inputs()];
                    assert_eq!(cs.real_variable_index(var), index as u32);
                }
            }
        }
        // the public input opens its cycle with the adjacent left/right pair
        let a = cs.public_inputs()[0];
        let cycle = &cycles[cs.real_variable_index(a) as usize];
        assert_eq!(cycle[0], CycleNode::new(WireType::Left.index(), 0));
        assert_eq!(cycle[1], CycleNode::new(WireType::Right.index(), 0));
    }

    #[test]
    #[should_panic(expected = "finalized")]
    fn test_requires_finalized_circuit() {
        let cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Standard);
        compute_wire_copy_cycles(&cs);
    }
}
