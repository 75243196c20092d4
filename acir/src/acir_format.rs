use crate::gadgets::GadgetBackend;
use ark_ff::PrimeField;
use log::{debug, warn};
use plonk_arith::plonk::constraint_system::{
    flavor::CircuitConfig, gates::PolyTriple, CircuitBuilder, VarIndex,
};

/// `result = a AND b` or `result = a XOR b` over `num_bits` bits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicConstraint {
    pub a: u32,
    pub b: u32,
    pub result: u32,
    pub num_bits: u32,
    pub is_xor_gate: bool,
}

/// `witness < 2^num_bits`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeConstraint {
    pub witness: u32,
    pub num_bits: u32,
}

/// A hash input: a witness holding `num_bits` bits.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashInput {
    pub witness: u32,
    pub num_bits: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sha256Constraint {
    pub inputs: Vec<HashInput>,
    /// One witness per output byte.
    pub result: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleMembershipConstraint {
    pub hash_path: Vec<u32>,
    pub root: u32,
    pub leaf: u32,
    pub index: u32,
    pub result: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrConstraint {
    /// One witness per message byte.
    pub message: Vec<u32>,
    pub public_key_x: u32,
    pub public_key_y: u32,
    pub result: u32,
    /// 64 witnesses, one per signature byte.
    pub signature: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaSecp256k1Constraint {
    /// One witness per byte of the message hash.
    pub hashed_message: Vec<u32>,
    /// 32 witnesses per coordinate, big-endian bytes.
    pub pub_x_indices: Vec<u32>,
    pub pub_y_indices: Vec<u32>,
    pub result: u32,
    /// 64 witnesses: the bytes of `r` then the bytes of `s`.
    pub signature: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blake2sConstraint {
    pub inputs: Vec<HashInput>,
    pub result: Vec<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PedersenConstraint {
    pub scalars: Vec<u32>,
    pub result_x: u32,
    pub result_y: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashToFieldConstraint {
    pub inputs: Vec<HashInput>,
    pub result: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedBaseScalarMul {
    pub scalar: u32,
    pub pub_key_x: u32,
    pub pub_key_y: u32,
}

/// A constraint system in interchange form. Witness `i` of the records is
/// variable `i` of the circuit; variable 0 is the constant zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AcirFormat<F> {
    /// Number of variables, the zero variable included.
    pub varnum: u32,
    pub public_inputs: Vec<u32>,
    pub logic_constraints: Vec<LogicConstraint>,
    pub range_constraints: Vec<RangeConstraint>,
    pub sha256_constraints: Vec<Sha256Constraint>,
    pub merkle_membership_constraints: Vec<MerkleMembershipConstraint>,
    pub schnorr_constraints: Vec<SchnorrConstraint>,
    pub ecdsa_constraints: Vec<EcdsaSecp256k1Constraint>,
    pub blake2s_constraints: Vec<Blake2sConstraint>,
    pub pedersen_constraints: Vec<PedersenConstraint>,
    pub hash_to_field_constraints: Vec<HashToFieldConstraint>,
    pub fixed_base_scalar_mul_constraints: Vec<FixedBaseScalarMul>,
    pub constraints: Vec<PolyTriple<F>>,
}

impl<F> AcirFormat<F> {
    /// Every witness index referenced by a record.
    pub fn witness_indices(&self) -> Vec<u32> {
        let mut indices = vec![];
        let hash_inputs = |inputs: &[HashInput]| inputs.iter().map(|i| i.witness).collect::<Vec<_>>();
        for c in &self.logic_constraints {
            indices.extend([c.a, c.b, c.result]);
        }
        for c in &self.range_constraints {
            indices.push(c.witness);
        }
        for c in &self.sha256_constraints {
            indices.extend(hash_inputs(&c.inputs));
            indices.extend(&c.result);
        }
        for c in &self.merkle_membership_constraints {
            indices.extend(&c.hash_path);
            indices.extend([c.root, c.leaf, c.index, c.result]);
        }
        for c in &self.schnorr_constraints {
            indices.extend(&c.message);
            indices.extend(&c.signature);
            indices.extend([c.public_key_x, c.public_key_y, c.result]);
        }
        for c in &self.ecdsa_constraints {
            indices.extend(&c.hashed_message);
            indices.extend(&c.signature);
            indices.extend(&c.pub_x_indices);
            indices.extend(&c.pub_y_indices);
            indices.push(c.result);
        }
        for c in &self.blake2s_constraints {
            indices.extend(hash_inputs(&c.inputs));
            indices.extend(&c.result);
        }
        for c in &self.pedersen_constraints {
            indices.extend(&c.scalars);
            indices.extend([c.result_x, c.result_y]);
        }
        for c in &self.hash_to_field_constraints {
            indices.extend(hash_inputs(&c.inputs));
            indices.push(c.result);
        }
        for c in &self.fixed_base_scalar_mul_constraints {
            indices.extend([c.scalar, c.pub_key_x, c.pub_key_y]);
        }
        for c in &self.constraints {
            indices.extend([c.a, c.b, c.c]);
        }
        indices
    }
}

/// Load witness values: `witness[i]` goes to variable `i + 1`, variable 0 keeps
/// zero. Values past the last variable mark the circuit failed and are dropped.
pub fn read_witness<F: PrimeField>(cs: &mut CircuitBuilder<F>, witness: &[F]) {
    let available = cs.get_num_variables().saturating_sub(1);
    if witness.len() > available {
        cs.failure("witness has more values than the circuit has variables");
    }
    for (i, value) in witness.iter().take(available).enumerate() {
        cs.set_variable((i + 1) as VarIndex, *value);
    }
}

/// Build the circuit of `constraint_system` with every witness set to zero.
pub fn create_circuit<F: PrimeField, G: GadgetBackend<F>>(
    constraint_system: &AcirFormat<F>,
    config: CircuitConfig,
    gadgets: &G,
) -> CircuitBuilder<F> {
    build(constraint_system, None, config, gadgets)
}

/// Build the circuit of `constraint_system` and load `witness` before any gate
/// is emitted.
pub fn create_circuit_with_witness<F: PrimeField, G: GadgetBackend<F>>(
    constraint_system: &AcirFormat<F>,
    witness: &[F],
    config: CircuitConfig,
    gadgets: &G,
) -> CircuitBuilder<F> {
    build(constraint_system, Some(witness), config, gadgets)
}

fn build<F: PrimeField, G: GadgetBackend<F>>(
    constraint_system: &AcirFormat<F>,
    witness: Option<&[F]>,
    config: CircuitConfig,
    gadgets: &G,
) -> CircuitBuilder<F> {
    let mut cs = CircuitBuilder::new(config);

    if constraint_system.public_inputs.len() > constraint_system.varnum as usize {
        warn!(
            "{} public inputs for {} variables",
            constraint_system.public_inputs.len(),
            constraint_system.varnum
        );
        cs.failure("too many public inputs!");
    }

    // variables 1..varnum, public ones in index order
    for i in 1..constraint_system.varnum {
        if constraint_system.public_inputs.contains(&i) {
            cs.add_public_variable(F::zero());
        } else {
            cs.add_variable(F::zero());
        }
    }

    if let Some(index) = constraint_system
        .witness_indices()
        .into_iter()
        .find(|i| *i >= constraint_system.varnum.max(1))
    {
        cs.failure(&format!("constraint refers to unknown witness {}", index));
        return cs;
    }
    // index 0 is the zero constant and never a public input
    if let Some(index) = constraint_system
        .public_inputs
        .iter()
        .find(|i| **i == 0 || **i >= constraint_system.varnum)
    {
        cs.failure(&format!("public input refers to unknown witness {}", index));
        return cs;
    }

    if let Some(witness) = witness {
        read_witness(&mut cs, witness);
    }

    // Step 1: arithmetic gates.
    for constraint in &constraint_system.constraints {
        cs.create_poly_gate(constraint);
    }

    // Step 2: logic constraints, the last accumulator is the declared result.
    for constraint in &constraint_system.logic_constraints {
        if constraint.num_bits == 0 || constraint.num_bits % 2 == 1 {
            cs.failure("logic constraint needs a positive even number of bits");
            continue;
        }
        let accumulators = cs.create_logic_constraint(
            constraint.a,
            constraint.b,
            constraint.num_bits as usize,
            constraint.is_xor_gate,
        );
        if let Some(out) = accumulators.out.last() {
            cs.assert_equal(*out, constraint.result, "logic constraint result mismatch");
        }
    }

    // Step 3: range constraints.
    for constraint in &constraint_system.range_constraints {
        cs.create_range_constraint(
            constraint.witness,
            constraint.num_bits as usize,
            "range constraint value out of range",
        );
    }

    // Step 4: black-box gadgets.
    for constraint in &constraint_system.sha256_constraints {
        gadgets.create_sha256_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.merkle_membership_constraints {
        gadgets.create_merkle_membership_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.schnorr_constraints {
        gadgets.create_schnorr_verify_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.ecdsa_constraints {
        gadgets.create_ecdsa_verify_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.blake2s_constraints {
        gadgets.create_blake2s_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.pedersen_constraints {
        gadgets.create_pedersen_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.fixed_base_scalar_mul_constraints {
        gadgets.create_fixed_base_constraint(&mut cs, constraint);
    }
    for constraint in &constraint_system.hash_to_field_constraints {
        gadgets.create_hash_to_field_constraint(&mut cs, constraint);
    }

    debug!(
        "interchange circuit: {} variables, {} gates",
        cs.get_num_variables(),
        cs.get_num_gates()
    );
    cs
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::gadgets::UnsupportedGadgets;
    use ark_bls12_381::Fr;
    use ark_ff::{One, Zero};
    use plonk_arith::plonk::constraint_system::{flavor::CircuitFlavor, ConstraintSystem};

    type F = Fr;

    fn config() -> CircuitConfig {
        CircuitConfig::new(CircuitFlavor::Turbo)
    }

    #[test]
    fn test_variables_follow_varnum() {
        let format = AcirFormat::<F> {
            varnum: 5,
            public_inputs: vec![3, 1],
            ..Default::default()
        };
        let cs = create_circuit(&format, config(), &UnsupportedGadgets);
        assert!(!cs.failed());
        assert_eq!(cs.get_num_variables(), 5);
        // public inputs are promoted in variable order
        assert_eq!(cs.public_inputs(), &[1, 3]);
    }

    #[test]
    fn test_read_witness_skips_zero() {
        let format = AcirFormat::<F> {
            varnum: 4,
            ..Default::default()
        };
        let witness = [F::from(7u64), F::from(8u64), F::from(9u64)];
        let cs = create_circuit_with_witness(&format, &witness, config(), &UnsupportedGadgets);
        assert!(cs.get_variable(0).is_zero());
        assert_eq!(cs.get_variable(1), F::from(7u64));
        assert_eq!(cs.get_variable(3), F::from(9u64));
        assert!(!cs.failed());
    }

    #[test]
    fn test_long_witness_fails() {
        let format = AcirFormat::<F> {
            varnum: 2,
            ..Default::default()
        };
        let cs = create_circuit_with_witness(&format, &[F::one(), F::one()], config(), &UnsupportedGadgets);
        assert!(cs.failed());
        assert_eq!(cs.get_variable(1), F::one());
    }

    #[test]
    fn test_too_many_public_inputs() {
        let format = AcirFormat::<F> {
            varnum: 2,
            public_inputs: vec![1, 2, 3],
            ..Default::default()
        };
        let cs = create_circuit(&format, config(), &UnsupportedGadgets);
        assert!(cs.failed());
        assert_eq!(cs.err(), Some("too many public inputs!"));
    }

    #[test]
    fn test_unknown_public_input_fails() {
        for (public_inputs, bad) in [(vec![0], 0), (vec![2, 5], 5)] {
            let format = AcirFormat::<F> {
                varnum: 3,
                public_inputs,
                ..Default::default()
            };
            let cs = create_circuit(&format, config(), &UnsupportedGadgets);
            assert_eq!(
                cs.err().map(str::to_string),
                Some(format!("public input refers to unknown witness {}", bad))
            );
        }
    }

    #[test]
    fn test_unknown_witness_fails() {
        let format = AcirFormat::<F> {
            varnum: 3,
            range_constraints: vec![RangeConstraint {
                witness: 3,
                num_bits: 8,
            }],
            ..Default::default()
        };
        let cs = create_circuit(&format, config(), &UnsupportedGadgets);
        assert_eq!(cs.err(), Some("constraint refers to unknown witness 3"));
        assert_eq!(cs.get_num_gates(), 1);
    }

    #[test]
    fn test_arithmetic_gate_and_range() {
        // w1 * w2 - w3 = 0, w3 < 2^8
        let format = AcirFormat::<F> {
            varnum: 4,
            range_constraints: vec![RangeConstraint {
                witness: 3,
                num_bits: 8,
            }],
            constraints: vec![PolyTriple {
                a: 1,
                b: 2,
                c: 3,
                q_m: F::one(),
                q_l: F::zero(),
                q_r: F::zero(),
                q_o: -F::one(),
                q_c: F::zero(),
            }],
            ..Default::default()
        };
        let witness = [F::from(6u64), F::from(7u64), F::from(42u64)];
        let mut cs = create_circuit_with_witness(&format, &witness, config(), &UnsupportedGadgets);
        assert!(!cs.failed());
        cs.finalize_circuit();
        assert!(cs.check_circuit().is_ok());

        let bad = [F::from(16u64), F::from(16u64), F::from(256u64)];
        let cs = create_circuit_with_witness(&format, &bad, config(), &UnsupportedGadgets);
        assert_eq!(cs.err(), Some("range constraint value out of range"));
    }

    #[test]
    fn test_odd_logic_width_fails() {
        let format = AcirFormat::<F> {
            varnum: 4,
            logic_constraints: vec![LogicConstraint {
                a: 1,
                b: 2,
                result: 3,
                num_bits: 3,
                is_xor_gate: true,
            }],
            ..Default::default()
        };
        let cs = create_circuit(&format, config(), &UnsupportedGadgets);
        assert!(cs.failed());
    }
}
