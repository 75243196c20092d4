use crate::poly_commit::{errors::PolyComSchemeError, field_polynomial::FpPolynomial};
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for polynomial commitment scheme. The key assembler only commits;
/// opening proofs belong to the prover.
pub trait PolyComScheme: Sized {
    /// Type of prime field.
    type Field: PrimeField;

    /// Type of commitment produced.
    type Commitment: Debug + PartialEq + Eq + Clone + Serialize + for<'de> Deserialize<'de>;

    /// The max degree of the polynomial the parameters support.
    fn max_degree(&self) -> usize;

    /// Commits to the polynomial, commitment is binding.
    fn commit(
        &self,
        polynomial: &FpPolynomial<Self::Field>,
    ) -> Result<Self::Commitment, PolyComSchemeError>;
}
