//! Black-box gadgets. Hashes, signatures, Merkle membership and fixed-base
//! scalar multiplication lower themselves through the builder; this crate only
//! dispatches the records to a backend.
use crate::acir_format::*;
use ark_ff::PrimeField;
use plonk_arith::{plonk::constraint_system::CircuitBuilder, utils::field_to_u64};

/// Lowers black-box records into gates. Every method defaults to marking the
/// circuit failed, so a backend only implements what it supports.
pub trait GadgetBackend<F: PrimeField> {
    fn create_sha256_constraint(&self, cs: &mut CircuitBuilder<F>, _constraint: &Sha256Constraint) {
        unsupported(cs, "sha256")
    }

    fn create_merkle_membership_constraint(
        &self,
        cs: &mut CircuitBuilder<F>,
        _constraint: &MerkleMembershipConstraint,
    ) {
        unsupported(cs, "merkle membership")
    }

    fn create_schnorr_verify_constraint(&self, cs: &mut CircuitBuilder<F>, _constraint: &SchnorrConstraint) {
        unsupported(cs, "schnorr")
    }

    fn create_ecdsa_verify_constraint(
        &self,
        cs: &mut CircuitBuilder<F>,
        _constraint: &EcdsaSecp256k1Constraint,
    ) {
        unsupported(cs, "ecdsa secp256k1")
    }

    fn create_blake2s_constraint(&self, cs: &mut CircuitBuilder<F>, _constraint: &Blake2sConstraint) {
        unsupported(cs, "blake2s")
    }

    fn create_pedersen_constraint(&self, cs: &mut CircuitBuilder<F>, _constraint: &PedersenConstraint) {
        unsupported(cs, "pedersen")
    }

    fn create_hash_to_field_constraint(
        &self,
        cs: &mut CircuitBuilder<F>,
        _constraint: &HashToFieldConstraint,
    ) {
        unsupported(cs, "hash to field")
    }

    fn create_fixed_base_constraint(&self, cs: &mut CircuitBuilder<F>, _constraint: &FixedBaseScalarMul) {
        unsupported(cs, "fixed base scalar mul")
    }
}

fn unsupported<F: PrimeField>(cs: &mut CircuitBuilder<F>, name: &str) {
    cs.failure(&format!("{} gadget is not supported by this backend", name));
}

/// A backend without any gadget.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnsupportedGadgets;

impl<F: PrimeField> GadgetBackend<F> for UnsupportedGadgets {}

/// Range-constrain every witness to one byte and collect the byte values.
/// A witness above 255 marks the circuit failed with `msg`; its low byte is
/// returned in its place.
pub fn constrain_bytes<F: PrimeField>(cs: &mut CircuitBuilder<F>, witnesses: &[u32], msg: &str) -> Vec<u8> {
    witnesses
        .iter()
        .map(|w| {
            cs.create_range_constraint(*w, 8, msg);
            field_to_u64(&cs.get_variable(*w)).unwrap_or_default() as u8
        })
        .collect()
}

/// The byte-level inputs of an ECDSA verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EcdsaInputs {
    pub hashed_message: Vec<u8>,
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub pub_x: [u8; 32],
    pub pub_y: [u8; 32],
}

impl EcdsaSecp256k1Constraint {
    /// Constrain every byte witness of the record and assemble the signature
    /// and public key. Wrong lengths mark the circuit failed and give `None`.
    pub fn assemble_inputs<F: PrimeField>(&self, cs: &mut CircuitBuilder<F>) -> Option<EcdsaInputs> {
        if self.signature.len() != 64 || self.pub_x_indices.len() != 32 || self.pub_y_indices.len() != 32 {
            cs.failure("ecdsa record needs a 64 byte signature and 32 byte coordinates");
            return None;
        }
        let msg = "ecdsa input is not a byte";
        let hashed_message = constrain_bytes(cs, &self.hashed_message, msg);
        let signature = constrain_bytes(cs, &self.signature, msg);
        let pub_x = constrain_bytes(cs, &self.pub_x_indices, msg);
        let pub_y = constrain_bytes(cs, &self.pub_y_indices, msg);

        let mut inputs = EcdsaInputs {
            hashed_message,
            r: [0u8; 32],
            s: [0u8; 32],
            pub_x: [0u8; 32],
            pub_y: [0u8; 32],
        };
        inputs.r.copy_from_slice(&signature[..32]);
        inputs.s.copy_from_slice(&signature[32..]);
        inputs.pub_x.copy_from_slice(&pub_x);
        inputs.pub_y.copy_from_slice(&pub_y);
        Some(inputs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_bls12_381::Fr;
    use plonk_arith::plonk::constraint_system::flavor::CircuitFlavor;

    type F = Fr;

    fn byte_witnesses(cs: &mut CircuitBuilder<F>, bytes: impl Iterator<Item = u64>) -> Vec<u32> {
        bytes.map(|b| cs.add_variable(F::from(b))).collect()
    }

    #[test]
    fn test_unsupported_gadget_fails() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Turbo);
        UnsupportedGadgets.create_blake2s_constraint(&mut cs, &Blake2sConstraint::default());
        assert_eq!(cs.err(), Some("blake2s gadget is not supported by this backend"));
    }

    #[test]
    fn test_ecdsa_byte_assembly() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Turbo);
        let signature = byte_witnesses(&mut cs, (0..64u64).map(|i| 200 - i));
        let pub_x_indices = byte_witnesses(&mut cs, 0..32u64);
        let pub_y_indices = byte_witnesses(&mut cs, (0..32u64).map(|i| i * 7));
        let hashed_message = byte_witnesses(&mut cs, [0xde, 0xad].into_iter());
        let result = cs.add_variable(F::from(0u64));
        let record = EcdsaSecp256k1Constraint {
            hashed_message,
            pub_x_indices,
            pub_y_indices,
            result,
            signature,
        };
        let inputs = record.assemble_inputs(&mut cs).unwrap();
        assert!(!cs.failed());
        // every byte is kept, not only the last one of each limb
        assert_eq!(inputs.r[0], 200);
        assert_eq!(inputs.r[31], 169);
        assert_eq!(inputs.s[0], 168);
        assert_eq!(inputs.pub_x[5], 5);
        assert_eq!(inputs.pub_y[31], 217);
        assert_eq!(inputs.hashed_message, vec![0xde, 0xad]);
        cs.finalize_circuit();
        assert!(cs.check_circuit().is_ok());
    }

    #[test]
    fn test_ecdsa_rejects_wide_bytes() {
        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Turbo);
        let mut signature = byte_witnesses(&mut cs, 0..64u64);
        signature[3] = cs.add_variable(F::from(256u64));
        let coordinate = byte_witnesses(&mut cs, 0..32u64);
        let record = EcdsaSecp256k1Constraint {
            hashed_message: vec![],
            pub_x_indices: coordinate.clone(),
            pub_y_indices: coordinate,
            result: 0,
            signature,
        };
        assert!(record.assemble_inputs(&mut cs).is_some());
        assert_eq!(cs.err(), Some("ecdsa input is not a byte"));

        let mut cs = CircuitBuilder::<F>::with_flavor(CircuitFlavor::Turbo);
        let short = EcdsaSecp256k1Constraint::default();
        assert!(short.assemble_inputs(&mut cs).is_none());
        assert!(cs.failed());
    }
}
