//! Big-endian codec of the interchange format.
//!
//! Integers are `u32` big-endian, sequences carry a `u32` length prefix,
//! booleans take one byte and field elements take 32 big-endian bytes of their
//! canonical value. Records are written field by field in a fixed order.
use crate::acir_format::*;
use crate::errors::{AcirError, Result};
use ark_ff::PrimeField;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_bigint::BigUint;
use plonk_arith::plonk::constraint_system::gates::PolyTriple;
use std::io::{Read, Write};

/// Width of an encoded field element.
pub const FIELD_BYTES: usize = 32;

/// A value with a fixed binary layout.
pub trait AcirSerialize: Sized {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn read<R: Read>(reader: &mut R) -> Result<Self>;
}

impl AcirSerialize for u32 {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<BigEndian>(*self)?;
        Ok(())
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(reader.read_u32::<BigEndian>()?)
    }
}

impl AcirSerialize for bool {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(*self as u8)?;
        Ok(())
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(AcirError::InvalidBool(b)),
        }
    }
}

impl<T: AcirSerialize> AcirSerialize for Vec<T> {
    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        (self.len() as u32).write(writer)?;
        for item in self {
            item.write(writer)?;
        }
        Ok(())
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let len = u32::read(reader)? as usize;
        // the length is untrusted; grow as records arrive
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(T::read(reader)?);
        }
        Ok(items)
    }
}

/// Write a field element as 32 big-endian bytes.
pub fn write_field<F: PrimeField, W: Write>(value: &F, writer: &mut W) -> Result<()> {
    let bytes = Into::<BigUint>::into(*value).to_bytes_be();
    let mut buf = [0u8; FIELD_BYTES];
    buf[FIELD_BYTES - bytes.len()..].copy_from_slice(&bytes);
    writer.write_all(&buf)?;
    Ok(())
}

/// Read 32 big-endian bytes, rejecting values not below the modulus.
pub fn read_field<F: PrimeField, R: Read>(reader: &mut R) -> Result<F> {
    let mut buf = [0u8; FIELD_BYTES];
    reader.read_exact(&mut buf)?;
    let value = BigUint::from_bytes_be(&buf);
    let modulus: BigUint = F::MODULUS.into();
    if value >= modulus {
        return Err(AcirError::NonCanonicalField);
    }
    Ok(F::from(value))
}

macro_rules! acir_record {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl AcirSerialize for $ty {
            fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
                $( self.$field.write(writer)?; )*
                Ok(())
            }

            fn read<R: Read>(reader: &mut R) -> Result<Self> {
                Ok($ty {
                    $( $field: AcirSerialize::read(reader)?, )*
                })
            }
        }
    };
}

acir_record!(LogicConstraint { a, b, result, num_bits, is_xor_gate });
acir_record!(RangeConstraint { witness, num_bits });
acir_record!(HashInput { witness, num_bits });
acir_record!(Sha256Constraint { inputs, result });
acir_record!(MerkleMembershipConstraint { hash_path, root, leaf, index, result });
acir_record!(SchnorrConstraint { message, signature, public_key_x, public_key_y, result });
acir_record!(EcdsaSecp256k1Constraint {
    hashed_message,
    signature,
    pub_x_indices,
    pub_y_indices,
    result,
});
acir_record!(Blake2sConstraint { inputs, result });
acir_record!(PedersenConstraint { scalars, result_x, result_y });
acir_record!(HashToFieldConstraint { inputs, result });
acir_record!(FixedBaseScalarMul { scalar, pub_key_x, pub_key_y });

fn write_poly_triple<F: PrimeField, W: Write>(gate: &PolyTriple<F>, writer: &mut W) -> Result<()> {
    gate.a.write(writer)?;
    gate.b.write(writer)?;
    gate.c.write(writer)?;
    for q in [&gate.q_m, &gate.q_l, &gate.q_r, &gate.q_o, &gate.q_c] {
        write_field(q, writer)?;
    }
    Ok(())
}

fn read_poly_triple<F: PrimeField, R: Read>(reader: &mut R) -> Result<PolyTriple<F>> {
    Ok(PolyTriple {
        a: u32::read(reader)?,
        b: u32::read(reader)?,
        c: u32::read(reader)?,
        q_m: read_field(reader)?,
        q_l: read_field(reader)?,
        q_r: read_field(reader)?,
        q_o: read_field(reader)?,
        q_c: read_field(reader)?,
    })
}

impl<F: PrimeField> AcirFormat<F> {
    /// Write the constraint system.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.varnum.write(writer)?;
        self.public_inputs.write(writer)?;
        self.logic_constraints.write(writer)?;
        self.range_constraints.write(writer)?;
        self.sha256_constraints.write(writer)?;
        self.merkle_membership_constraints.write(writer)?;
        self.schnorr_constraints.write(writer)?;
        self.ecdsa_constraints.write(writer)?;
        self.blake2s_constraints.write(writer)?;
        self.pedersen_constraints.write(writer)?;
        self.hash_to_field_constraints.write(writer)?;
        self.fixed_base_scalar_mul_constraints.write(writer)?;
        (self.constraints.len() as u32).write(writer)?;
        for gate in &self.constraints {
            write_poly_triple(gate, writer)?;
        }
        Ok(())
    }

    /// Read a constraint system written by [`AcirFormat::write`].
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let varnum = u32::read(reader)?;
        let public_inputs = AcirSerialize::read(reader)?;
        let logic_constraints = AcirSerialize::read(reader)?;
        let range_constraints = AcirSerialize::read(reader)?;
        let sha256_constraints = AcirSerialize::read(reader)?;
        let merkle_membership_constraints = AcirSerialize::read(reader)?;
        let schnorr_constraints = AcirSerialize::read(reader)?;
        let ecdsa_constraints = AcirSerialize::read(reader)?;
        let blake2s_constraints = AcirSerialize::read(reader)?;
        let pedersen_constraints = AcirSerialize::read(reader)?;
        let hash_to_field_constraints = AcirSerialize::read(reader)?;
        let fixed_base_scalar_mul_constraints = AcirSerialize::read(reader)?;
        let num_gates = u32::read(reader)? as usize;
        let mut constraints = Vec::with_capacity(num_gates.min(1024));
        for _ in 0..num_gates {
            constraints.push(read_poly_triple(reader)?);
        }
        Ok(AcirFormat {
            varnum,
            public_inputs,
            logic_constraints,
            range_constraints,
            sha256_constraints,
            merkle_membership_constraints,
            schnorr_constraints,
            ecdsa_constraints,
            blake2s_constraints,
            pedersen_constraints,
            hash_to_field_constraints,
            fixed_base_scalar_mul_constraints,
            constraints,
        })
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![];
        // writing into a Vec cannot fail
        let _ = self.write(&mut bytes);
        bytes
    }

    /// Decode a whole buffer; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let format = Self::read(&mut reader)?;
        if !reader.is_empty() {
            return Err(AcirError::TrailingBytes(reader.len()));
        }
        Ok(format)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::{One, Zero};
    use proptest::prelude::*;

    type F = Fr;

    #[test]
    fn test_layout() {
        let format = AcirFormat::<F> {
            varnum: 4,
            public_inputs: vec![1],
            logic_constraints: vec![LogicConstraint {
                a: 1,
                b: 2,
                result: 3,
                num_bits: 4,
                is_xor_gate: true,
            }],
            constraints: vec![PolyTriple {
                a: 1,
                b: 2,
                c: 3,
                q_m: F::one(),
                q_l: F::zero(),
                q_r: F::zero(),
                q_o: -F::one(),
                q_c: F::from(258u64),
            }],
            ..Default::default()
        };
        let bytes = format.to_bytes();
        assert_eq!(&bytes[..4], &[0, 0, 0, 4]);
        assert_eq!(&bytes[4..12], &[0, 0, 0, 1, 0, 0, 0, 1]);
        // one logic record: length, a, b, result, num_bits, xor byte
        assert_eq!(&bytes[12..16], &[0, 0, 0, 1]);
        assert_eq!(bytes[32], 1);
        // nine empty sequences, then one gate
        let gate = 33 + 9 * 4;
        assert_eq!(&bytes[gate..gate + 4], &[0, 0, 0, 1]);
        let q_c = &bytes[bytes.len() - FIELD_BYTES..];
        assert_eq!(&q_c[30..], &[1, 2]);
        assert!(q_c[..30].iter().all(|b| *b == 0));
        assert_eq!(bytes.len(), gate + 4 + 12 + 5 * FIELD_BYTES);
        assert_eq!(AcirFormat::from_bytes(&bytes).unwrap(), format);
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut bytes = AcirFormat::<F>::default().to_bytes();
        assert!(matches!(
            AcirFormat::<F>::from_bytes(&bytes[..bytes.len() - 1]),
            Err(AcirError::Io(_))
        ));
        bytes.push(0);
        assert!(matches!(
            AcirFormat::<F>::from_bytes(&bytes),
            Err(AcirError::TrailingBytes(1))
        ));

        let mut modulus = vec![0u8; 12];
        modulus.extend([0xffu8; FIELD_BYTES]);
        assert!(matches!(
            read_field::<F, _>(&mut &modulus[12..]),
            Err(AcirError::NonCanonicalField)
        ));
        assert!(matches!(
            bool::read(&mut &[2u8][..]),
            Err(AcirError::InvalidBool(2))
        ));
    }

    fn field() -> impl Strategy<Value = F> {
        any::<u64>().prop_map(|v| F::from(v))
    }

    fn indices(max: u32) -> impl Strategy<Value = Vec<u32>> {
        prop::collection::vec(0..max, 0..6)
    }

    fn hash_inputs(max: u32) -> impl Strategy<Value = Vec<HashInput>> {
        prop::collection::vec(
            (0..max, 0u32..255).prop_map(|(witness, num_bits)| HashInput { witness, num_bits }),
            0..4,
        )
    }

    prop_compose! {
        fn poly_triple(max: u32)(a in 0..max, b in 0..max, c in 0..max,
                                 q in prop::collection::vec(field(), 5)) -> PolyTriple<F> {
            PolyTriple { a, b, c, q_m: q[0], q_l: q[1], q_r: q[2], q_o: q[3], q_c: q[4] }
        }
    }

    prop_compose! {
        fn acir_format()(varnum in 1u32..64)(
            varnum in Just(varnum),
            public_inputs in indices(varnum),
            logic in prop::collection::vec(
                (0..varnum, 0..varnum, 0..varnum, 0u32..64, any::<bool>()).prop_map(
                    |(a, b, result, num_bits, is_xor_gate)| LogicConstraint { a, b, result, num_bits, is_xor_gate }),
                0..4),
            range in prop::collection::vec(
                (0..varnum, 0u32..254).prop_map(|(witness, num_bits)| RangeConstraint { witness, num_bits }),
                0..4),
            sha256 in prop::collection::vec(
                (hash_inputs(varnum), indices(varnum)).prop_map(|(inputs, result)| Sha256Constraint { inputs, result }),
                0..3),
            merkle in prop::collection::vec(
                (indices(varnum), 0..varnum, 0..varnum, 0..varnum, 0..varnum).prop_map(
                    |(hash_path, root, leaf, index, result)| MerkleMembershipConstraint { hash_path, root, leaf, index, result }),
                0..3),
            schnorr in prop::collection::vec(
                (indices(varnum), indices(varnum), 0..varnum, 0..varnum, 0..varnum).prop_map(
                    |(message, signature, public_key_x, public_key_y, result)| SchnorrConstraint {
                        message, public_key_x, public_key_y, result, signature }),
                0..3),
            ecdsa in prop::collection::vec(
                (indices(varnum), indices(varnum), indices(varnum), indices(varnum), 0..varnum).prop_map(
                    |(hashed_message, signature, pub_x_indices, pub_y_indices, result)| EcdsaSecp256k1Constraint {
                        hashed_message, pub_x_indices, pub_y_indices, result, signature }),
                0..3),
            blake2s in prop::collection::vec(
                (hash_inputs(varnum), indices(varnum)).prop_map(|(inputs, result)| Blake2sConstraint { inputs, result }),
                0..3),
            pedersen in prop::collection::vec(
                (indices(varnum), 0..varnum, 0..varnum).prop_map(
                    |(scalars, result_x, result_y)| PedersenConstraint { scalars, result_x, result_y }),
                0..3),
            hash_to_field in prop::collection::vec(
                (hash_inputs(varnum), 0..varnum).prop_map(|(inputs, result)| HashToFieldConstraint { inputs, result }),
                0..3),
            fixed_base in prop::collection::vec(
                (0..varnum, 0..varnum, 0..varnum).prop_map(
                    |(scalar, pub_key_x, pub_key_y)| FixedBaseScalarMul { scalar, pub_key_x, pub_key_y }),
                0..3),
            constraints in prop::collection::vec(poly_triple(varnum), 0..6),
        ) -> AcirFormat<F> {
            AcirFormat {
                varnum,
                public_inputs,
                logic_constraints: logic,
                range_constraints: range,
                sha256_constraints: sha256,
                merkle_membership_constraints: merkle,
                schnorr_constraints: schnorr,
                ecdsa_constraints: ecdsa,
                blake2s_constraints: blake2s,
                pedersen_constraints: pedersen,
                hash_to_field_constraints: hash_to_field,
                fixed_base_scalar_mul_constraints: fixed_base,
                constraints,
            }
        }
    }

    proptest! {
        #[test]
        fn test_round_trip(format in acir_format()) {
            let bytes = format.to_bytes();
            let back = AcirFormat::<F>::from_bytes(&bytes).unwrap();
            prop_assert_eq!(back, format);
        }

        #[test]
        fn test_field_encoding_is_canonical(value in field()) {
            let mut bytes = vec![];
            write_field(&value, &mut bytes).unwrap();
            prop_assert_eq!(bytes.len(), FIELD_BYTES);
            prop_assert_eq!(read_field::<F, _>(&mut bytes.as_slice()).unwrap(), value);
        }
    }
}
