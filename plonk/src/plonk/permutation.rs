//! Permutation polynomials. Copy cycles are turned into a mapping over wire
//! positions and the mapping is encoded into Lagrange evaluations, either with
//! the coset encoding of PLONK or the integer encoding of Honk.
use crate::errors::{PlonkError, Result};
use crate::plonk::{
    constraint_system::{flavor::PermutationEncoding, variables::DUMMY_TAG, ConstraintSystem},
    copy_cycles::CyclicPermutation,
};
use ark_ff::{PrimeField, UniformRand};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_std::rand::{CryptoRng, RngCore};
use log::debug;
use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

/// Where a permutation entry points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PermutationSubgroupElement {
    /// Row of the target position, or the tag when `is_tag` is set.
    pub row_index: u32,
    /// Column of the target position.
    pub column_index: u8,
    /// Entry of a public input, cut out of its cycle.
    pub is_public_input: bool,
    /// Entry holding a tag instead of a position.
    pub is_tag: bool,
}

impl PermutationSubgroupElement {
    fn position(row: usize, column: usize) -> Self {
        PermutationSubgroupElement {
            row_index: row as u32,
            column_index: column as u8,
            is_public_input: false,
            is_tag: false,
        }
    }

    fn tag(tag: u32, column: u8) -> Self {
        PermutationSubgroupElement {
            row_index: tag,
            column_index: column,
            is_public_input: false,
            is_tag: true,
        }
    }
}

/// The sigma and id mappings, indexed `[column][row]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermutationMapping {
    pub sigmas: Vec<Vec<PermutationSubgroupElement>>,
    pub ids: Vec<Vec<PermutationSubgroupElement>>,
}

impl PermutationMapping {
    /// The identity mapping over `width` columns of `size` rows.
    pub fn identity(width: usize, size: usize) -> Self {
        let column = |c: usize| {
            (0..size)
                .map(|r| PermutationSubgroupElement::position(r, c))
                .collect::<Vec<_>>()
        };
        let sigmas: Vec<Vec<_>> = (0..width).map(column).collect();
        PermutationMapping {
            ids: sigmas.clone(),
            sigmas,
        }
    }

    pub fn width(&self) -> usize {
        self.sigmas.len()
    }

    pub fn size(&self) -> usize {
        self.sigmas.first().map(|c| c.len()).unwrap_or(0)
    }
}

/// Turn the copy cycles of `cs` into a sigma mapping over `width x size`
/// positions.
///
/// Each cycle is rotated so every node points to the next one and the last
/// back to the first. With `generalized`, a cycle whose variable carries a tag
/// starts with the tag in the id mapping and ends with the tag's tau partner in
/// the sigma mapping. The left entry of every public input row is cut out of
/// its cycle.
pub fn compute_permutation_mapping<C: ConstraintSystem>(
    cs: &C,
    cycles: &[CyclicPermutation],
    size: usize,
    generalized: bool,
) -> Result<PermutationMapping> {
    let width = cs.flavor().program_width;
    let mut mapping = PermutationMapping::identity(width, size);

    for (variable, cycle) in cycles.iter().enumerate() {
        if cycle.is_empty() {
            continue;
        }
        for node in cycle.iter() {
            let (wire, row) = (node.wire_index as usize, node.gate_index as usize);
            if wire >= width || row >= size {
                return Err(PlonkError::PermutationOutOfBounds {
                    wire,
                    row,
                    width,
                    size,
                });
            }
        }

        let first = cycle[0];
        let mut carry = mapping.sigmas[first.wire_index as usize][first.gate_index as usize];
        for node in cycle.iter().skip(1).rev() {
            std::mem::swap(
                &mut mapping.sigmas[node.wire_index as usize][node.gate_index as usize],
                &mut carry,
            );
        }
        mapping.sigmas[first.wire_index as usize][first.gate_index as usize] = carry;

        if generalized {
            let tag = cs.variable_tag(variable as u32);
            if tag != DUMMY_TAG {
                let tau = cs.tau(tag).ok_or(PlonkError::MissingTau(tag))?;
                let last = cycle[cycle.len() - 1];
                mapping.ids[first.wire_index as usize][first.gate_index as usize] =
                    PermutationSubgroupElement::tag(tag, first.wire_index as u8);
                mapping.sigmas[last.wire_index as usize][last.gate_index as usize] =
                    PermutationSubgroupElement::tag(tau, last.wire_index as u8);
            }
        }
    }

    for i in 0..cs.num_public_inputs() {
        mapping.sigmas[0][i].is_public_input = true;
    }
    Ok(mapping)
}

/// Encode one mapping column as Lagrange evaluations.
///
/// Honk: position `(row, col)` becomes `row + n * col`, a public input row `i`
/// becomes `-(i + 1)` and a tag `t` becomes `n * width + t`.
///
/// Plonk: position `(row, col)` becomes `k[col] * omega^row`, a tag `t` becomes
/// `k[width] * omega^t` and a public input row `i` becomes `k[width + 1] * omega^i`.
///
/// Rows past the column length, and Plonk tags past it, are out of bounds.
pub fn encode_permutation_column<F: PrimeField>(
    column: &[PermutationSubgroupElement],
    encoding: PermutationEncoding,
    width: usize,
    ks: &[F],
    group: &[F],
) -> Result<Vec<F>> {
    let n = column.len();
    column
        .iter()
        .map(|e| {
            let (wire, row) = (e.column_index as usize, e.row_index as usize);
            let bounded = e.is_tag && encoding == PermutationEncoding::Honk;
            if (!bounded && row >= n) || (!e.is_tag && !e.is_public_input && wire >= width) {
                return Err(PlonkError::PermutationOutOfBounds {
                    wire,
                    row,
                    width,
                    size: n,
                });
            }
            Ok(match encoding {
                PermutationEncoding::Honk => {
                    if e.is_public_input {
                        -F::from(row as u64 + 1)
                    } else if e.is_tag {
                        F::from((n * width + row) as u64)
                    } else {
                        F::from((row + n * wire) as u64)
                    }
                }
                PermutationEncoding::Plonk => {
                    let root = group[row];
                    if e.is_public_input {
                        ks[width + 1] * root
                    } else if e.is_tag {
                        ks[width] * root
                    } else {
                        ks[wire] * root
                    }
                }
            })
        })
        .collect()
}

/// Find `count` coset multipliers for a subgroup of order `n`: `k[0] = 1` and
/// every other `k` is a nonzero quadratic non-residue whose coset differs from
/// all previous ones.
pub fn choose_ks<R: CryptoRng + RngCore, F: PrimeField>(
    prng: &mut R,
    count: usize,
    n: usize,
) -> Vec<F> {
    let mut k = vec![F::one()];
    let mut coset_ids = vec![F::one()];
    let exp = [n as u64];

    for _ in 1..count {
        loop {
            let ki = F::rand(prng);
            if ki.is_zero() || ki.pow(F::MODULUS_MINUS_ONE_DIV_TWO) == F::one() {
                continue;
            }
            // k_i H == k_j H iff k_i^n == k_j^n
            let id = ki.pow(exp);
            if coset_ids.iter().all(|x| *x != id) {
                k.push(ki);
                coset_ids.push(id);
                break;
            }
        }
    }
    k
}

/// The fixed multipliers used by coset-encoded keys of a given width.
pub fn default_ks<F: PrimeField>(width: usize, n: usize) -> Vec<F> {
    let mut prng = ChaChaRng::from_seed([0u8; 32]);
    choose_ks(&mut prng, width + 2, n)
}

/// Sigma and id evaluations of `cs` over a domain of `size` rows, plus the coset
/// multipliers (empty under the Honk encoding).
pub struct PermutationPolynomials<F> {
    pub sigmas: Vec<Vec<F>>,
    pub ids: Vec<Vec<F>>,
    pub ks: Vec<F>,
}

/// Build the mapping of `cs` and encode it following its flavor.
pub fn compute_permutation_polynomials<C: ConstraintSystem>(
    cs: &C,
    cycles: &[CyclicPermutation],
    size: usize,
) -> Result<PermutationPolynomials<C::Field>> {
    let flavor = cs.flavor();
    let width = flavor.program_width;
    let mapping = compute_permutation_mapping(cs, cycles, size, flavor.generalized)?;

    let domain = Radix2EvaluationDomain::<C::Field>::new(size).ok_or(PlonkError::GroupNotFound(size))?;
    let group: Vec<C::Field> = domain.elements().collect();
    let ks = match flavor.encoding {
        PermutationEncoding::Plonk => default_ks(width, size),
        PermutationEncoding::Honk => vec![],
    };

    let encode = |columns: &[Vec<PermutationSubgroupElement>]| -> Result<Vec<Vec<C::Field>>> {
        columns
            .iter()
            .map(|c| encode_permutation_column(c, flavor.encoding, width, &ks, &group))
            .collect()
    };
    let sigmas = encode(&mapping.sigmas)?;
    let ids = encode(&mapping.ids)?;
    debug!(
        "{} permutation: {} columns over {} rows",
        flavor.name, width, size
    );
    Ok(PermutationPolynomials { sigmas, ids, ks })
}

/// Id evaluations of Standard Honk, `id[wire][gate] = wire * n + gate`.
pub fn compute_standard_honk_id_polynomials<F: PrimeField>(width: usize, size: usize) -> Vec<Vec<F>> {
    (0..width)
        .map(|wire| {
            (0..size)
                .map(|gate| F::from((wire * size + gate) as u64))
                .collect()
        })
        .collect()
}

/// Lagrange evaluations of `L_first` and `L_last`: one at the first row,
/// respectively the last row, zero elsewhere.
pub fn compute_first_and_last_lagrange<F: PrimeField>(size: usize) -> (Vec<F>, Vec<F>) {
    let mut first = vec![F::zero(); size];
    let mut last = vec![F::zero(); size];
    if size > 0 {
        first[0] = F::one();
        last[size - 1] = F::one();
    }
    (first, last)
}

#[cfg(test)]
mod test {
    use crate::plonk::{
        constraint_system::{flavor::CircuitFlavor, CircuitBuilder, ConstraintSystem},
        copy_cycles::{compute_wire_copy_cycles, CycleNode},
        permutation::*,
    };
    use ark_bls12_381::Fr;
    use ark_ff::{Field, One, Zero};
    use std::collections::{BTreeMap, BTreeSet};

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

    fn target(e: &PermutationSubgroupElement) -> (usize, usize) {
        (e.column_index as usize, e.row_index as usize)
    }

    #[test]
    fn test_mapping_follows_cycles() {
        for flavor in [CircuitFlavor::Standard, CircuitFlavor::Turbo] {
            let cs = sample_circuit(flavor);
            let n = cs.circuit_subgroup_size();
            let cycles = compute_wire_copy_cycles(&cs);
            let mapping = compute_permutation_mapping(&cs, &cycles, n, false).unwrap();
            assert_eq!(mapping.width(), cs.flavor().program_width);
            assert_eq!(mapping.size(), n);

            let num_pi = cs.num_public_inputs();
            for cycle in cycles.iter().filter(|c| !c.is_empty()) {
                for (j, node) in cycle.iter().enumerate() {
                    let e = mapping.sigmas[node.wire_index as usize][node.gate_index as usize];
                    if node.wire_index == 0 && (node.gate_index as usize) < num_pi {
                        assert!(e.is_public_input);
                        continue;
                    }
                    let next: CycleNode = cycle[(j + 1) % cycle.len()];
                    assert_eq!(
                        target(&e),
                        (next.wire_index as usize, next.gate_index as usize)
                    );
                }
            }

            // without the cut public input entries sigma is a bijection
            let mut seen = BTreeSet::new();
            for (c, column) in mapping.sigmas.iter().enumerate() {
                for (r, e) in column.iter().enumerate() {
                    if c == 0 && r < num_pi {
                        continue;
                    }
                    assert!(seen.insert(target(e)));
                }
            }
        }
    }

    /// Two public inputs, several shared witnesses and one merged pair.
    fn multi_cycle_circuit(flavor: CircuitFlavor) -> CircuitBuilder<F> {
        let mut cs = CircuitBuilder::<F>::with_flavor(flavor);
        let x = cs.add_public_variable(F::from(2u64));
        let y = cs.add_public_variable(F::from(7u64));
        let s = cs.add(x, y);
        let p = cs.mul(s, x);
        let q = cs.mul(p, y);
        let r = cs.add(q, s);
        let t = cs.add_variable(cs.get_variable(r));
        cs.assert_equal(r, t, "copy");
        cs.mul(t, x);
        cs.add(s, s);
        cs.finalize_circuit();
        cs
    }

    #[test]
    fn test_sigma_orbits_match_cycles() {
        for flavor in [CircuitFlavor::Standard, CircuitFlavor::Turbo, CircuitFlavor::StandardHonk] {
            let cs = multi_cycle_circuit(flavor);
            let n = cs.circuit_subgroup_size();
            let cycles = compute_wire_copy_cycles(&cs);
            let mapping = compute_permutation_mapping(&cs, &cycles, n, false).unwrap();
            let mut walked = 0;
            for cycle in cycles.iter().filter(|c| c.len() > 1) {
                let members: BTreeSet<(usize, usize)> = cycle
                    .iter()
                    .map(|c| (c.wire_index as usize, c.gate_index as usize))
                    .collect();
                let start = (cycle[0].wire_index as usize, cycle[0].gate_index as usize);
                let mut current = start;
                let mut steps = 0;
                loop {
                    current = target(&mapping.sigmas[current.0][current.1]);
                    steps += 1;
                    assert!(members.contains(&current));
                    assert!(steps <= cycle.len());
                    if current == start {
                        break;
                    }
                }
                assert_eq!(steps, cycle.len());
                walked += 1;
            }
            assert!(walked >= 4);
        }
    }

    #[test]
    fn test_encoded_sigma_orbits() {
        for flavor in [CircuitFlavor::Turbo, CircuitFlavor::StandardHonk] {
            let cs = multi_cycle_circuit(flavor);
            let n = cs.circuit_subgroup_size();
            let width = cs.flavor().program_width;
            let num_pi = cs.num_public_inputs();
            let cycles = compute_wire_copy_cycles(&cs);
            let polys = compute_permutation_polynomials(&cs, &cycles, n).unwrap();
            let domain = Radix2EvaluationDomain::<F>::new(n).unwrap();

            let mut positions = BTreeMap::new();
            for (c, column) in polys.ids.iter().enumerate() {
                for (r, id) in column.iter().enumerate() {
                    assert!(positions.insert(*id, (c, r)).is_none());
                }
            }

            let mut public_cycles = 0;
            for cycle in cycles.iter().filter(|c| c.len() > 1) {
                let head = (cycle[0].wire_index as usize, cycle[0].gate_index as usize);
                let public = head.0 == 0 && head.1 < num_pi;
                // a public input cycle is cut at its left entry
                let (start, end, length) = if public {
                    let second = (cycle[1].wire_index as usize, cycle[1].gate_index as usize);
                    (second, head, cycle.len() - 1)
                } else {
                    (head, head, cycle.len())
                };
                let mut current = start;
                for _ in 0..length {
                    current = positions[&polys.sigmas[current.0][current.1]];
                }
                assert_eq!(current, end);

                if public {
                    public_cycles += 1;
                    let i = head.1;
                    let expected = if polys.ks.is_empty() {
                        -F::from(i as u64 + 1)
                    } else {
                        polys.ks[width + 1] * domain.element(i)
                    };
                    assert_eq!(polys.sigmas[0][i], expected);
                    assert!(!positions.contains_key(&expected));
                }
            }
            assert_eq!(public_cycles, 2);
        }
    }

    #[test]
    fn test_encoding_rejects_rows_past_the_domain() {
        let n = 4;
        let domain = Radix2EvaluationDomain::<F>::new(n).unwrap();
        let group: Vec<F> = domain.elements().collect();
        let ks = default_ks::<F>(3, n);
        let mapping = PermutationMapping::identity(3, n);
        for encoding in [PermutationEncoding::Plonk, PermutationEncoding::Honk] {
            assert!(encode_permutation_column(&mapping.sigmas[2], encoding, 3, &ks, &group).is_ok());

            let mut column = mapping.sigmas[1].clone();
            column[2].row_index = n as u32;
            match encode_permutation_column(&column, encoding, 3, &ks, &group) {
                Err(PlonkError::PermutationOutOfBounds { wire, row, size, .. }) => {
                    assert_eq!((wire, row, size), (1, n, n))
                }
                other => panic!("unexpected {:?}", other),
            }

            let mut column = mapping.sigmas[0].clone();
            column[0].column_index = 3;
            assert!(encode_permutation_column(&column, encoding, 3, &ks, &group).is_err());
        }

        // Honk tags sit above every position and need no bound; coset tags do
        let mut column = mapping.sigmas[0].clone();
        column[1] = PermutationSubgroupElement::tag(9, 0);
        assert!(encode_permutation_column(&column, PermutationEncoding::Honk, 3, &ks, &group).is_ok());
        assert!(encode_permutation_column(&column, PermutationEncoding::Plonk, 3, &ks, &group).is_err());
    }

    #[test]
    fn test_singleton_cycles_are_fixed_points() {
        let cs = sample_circuit(CircuitFlavor::Turbo);
        let n = cs.circuit_subgroup_size();
        let cycles = compute_wire_copy_cycles(&cs);
        let mapping = compute_permutation_mapping(&cs, &cycles, n, false).unwrap();
        for cycle in cycles.iter().filter(|c| c.len() == 1) {
            let node = cycle[0];
            let e = mapping.sigmas[node.wire_index as usize][node.gate_index as usize];
            assert_eq!(target(&e), (node.wire_index as usize, node.gate_index as usize));
        }
    }

    #[test]
    fn test_out_of_bounds_cycle() {
        let cs = sample_circuit(CircuitFlavor::Standard);
        let mut cycles = compute_wire_copy_cycles(&cs);
        cycles[1].push(CycleNode::new(0, 1 << 20));
        let n = cs.circuit_subgroup_size();
        match compute_permutation_mapping(&cs, &cycles, n, false) {
            Err(PlonkError::PermutationOutOfBounds { row, .. }) => assert_eq!(row, 1 << 20),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_honk_public_input_encoding() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::StandardHonk);
        let x = cs.add_public_variable(F::from(5u64));
        let y = cs.add_public_variable(F::from(6u64));
        cs.add(x, y);
        cs.finalize_circuit();
        let n = cs.circuit_subgroup_size();
        let cycles = compute_wire_copy_cycles(&cs);
        let polys = compute_permutation_polynomials(&cs, &cycles, n).unwrap();
        assert!(polys.ks.is_empty());
        assert_eq!(polys.sigmas[0][0], -F::one());
        assert_eq!(polys.sigmas[0][1], -F::from(2u64));
        // ids are the plain positions
        let ids = compute_standard_honk_id_polynomials::<F>(3, n);
        assert_eq!(polys.ids, ids);
        assert_eq!(ids[2][1], F::from((2 * n + 1) as u64));
    }

    #[test]
    fn test_tags_close_generalized_cycles() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Ultra);
        let x = cs.add_variable(F::from(100u64));
        cs.create_range_constraint(x, 8, "range");
        cs.finalize_circuit();
        let n = cs.circuit_subgroup_size();
        let cycles = compute_wire_copy_cycles(&cs);
        let mapping = compute_permutation_mapping(&cs, &cycles, n, true).unwrap();

        let mut tagged = 0;
        for (variable, cycle) in cycles.iter().enumerate() {
            if cycle.is_empty() {
                continue;
            }
            let tag = cs.variable_tag(variable as u32);
            if tag == DUMMY_TAG {
                continue;
            }
            tagged += 1;
            let first = cycle[0];
            let last = cycle[cycle.len() - 1];
            let id = mapping.ids[first.wire_index as usize][first.gate_index as usize];
            let sigma = mapping.sigmas[last.wire_index as usize][last.gate_index as usize];
            assert!(id.is_tag && sigma.is_tag);
            assert_eq!(id.row_index, tag);
            assert_eq!(Some(sigma.row_index), cs.tau(tag));
        }
        assert!(tagged > 0);
    }

    #[test]
    fn test_coset_encoding_is_injective() {
        let cs = sample_circuit(CircuitFlavor::Turbo);
        let n = cs.circuit_subgroup_size();
        let cycles = compute_wire_copy_cycles(&cs);
        let polys = compute_permutation_polynomials(&cs, &cycles, n).unwrap();
        assert_eq!(polys.ks.len(), cs.flavor().program_width + 2);
        let all: BTreeSet<F> = polys.ids.iter().flatten().cloned().collect();
        assert_eq!(all.len(), n * cs.flavor().program_width);
    }

    #[test]
    fn test_choose_ks() {
        let n = 16;
        let k = default_ks::<F>(4, n);
        assert_eq!(k.len(), 6);
        assert_eq!(k[0], F::one());
        assert!(k.iter().skip(1).all(|x| !x.is_zero()));
        assert!(k
            .iter()
            .skip(1)
            .all(|x| x.pow(F::MODULUS_MINUS_ONE_DIV_TWO) != F::one()));
        let ids: BTreeSet<F> = k.iter().map(|x| x.pow([n as u64])).collect();
        assert_eq!(ids.len(), k.len());
        assert_eq!(default_ks::<F>(4, n), k);
    }

    #[test]
    fn test_first_and_last_lagrange() {
        let (first, last) = compute_first_and_last_lagrange::<F>(8);
        assert_eq!(first.iter().filter(|x| !x.is_zero()).count(), 1);
        assert!(first[0].is_one() && last[7].is_one());
    }
}
