//! Small helpers shared across the crate.
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

/// Return the value as `u64` when it fits in one limb.
pub fn field_to_u64<F: PrimeField>(value: &F) -> Option<u64> {
    let repr = value.into_bigint();
    let limbs = repr.as_ref();
    if limbs[1..].iter().all(|l| *l == 0) {
        Some(limbs[0])
    } else {
        None
    }
}

/// Return the canonical integer representative of the value.
pub fn field_to_biguint<F: PrimeField>(value: &F) -> BigUint {
    (*value).into()
}

/// Number of significant bits of the canonical representative.
pub fn field_num_bits<F: PrimeField>(value: &F) -> u32 {
    value.into_bigint().num_bits()
}

/// Serde adapter for arkworks types, going through their canonical compressed encoding.
///
/// Use with `#[serde(with = "crate::utils::ark_serde")]`.
pub mod ark_serde {
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
    use serde::{de::Error as _, ser::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: CanonicalSerialize,
    {
        let mut bytes = Vec::with_capacity(value.compressed_size());
        value
            .serialize_compressed(&mut bytes)
            .map_err(S::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: CanonicalDeserialize,
    {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        T::deserialize_compressed(bytes.as_slice()).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn test_field_to_u64() {
        assert_eq!(field_to_u64(&Fr::from(300u64)), Some(300));
        assert_eq!(field_to_u64(&-Fr::from(1u64)), None);
        assert_eq!(field_num_bits(&Fr::from(300u64)), 9);
        assert_eq!(field_to_biguint(&Fr::from(7u64)), BigUint::from(7u32));
    }
}
