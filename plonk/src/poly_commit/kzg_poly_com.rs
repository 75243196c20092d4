use crate::poly_commit::{
    errors::PolyComSchemeError, field_polynomial::FpPolynomial, pcs::PolyComScheme,
};
use ark_bls12_381::{Bls12_381, Fr, G1Affine, G1Projective};
use ark_ec::{pairing::Pairing, CurveGroup, Group, VariableBaseMSM};
use ark_ff::UniformRand;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, RngCore};

/// KZG commitment over the `Group`.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(bound(
    serialize = "G: CanonicalSerialize",
    deserialize = "G: CanonicalDeserialize"
))]
pub struct KZGCommitment<G>(#[serde(with = "crate::utils::ark_serde")] pub G);

/// KZG commitment scheme about `Pairing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KZGCommitmentScheme<P: Pairing> {
    /// public parameter about G1.
    pub public_parameter_group_1: Vec<P::G1Affine>,
    /// public parameter about G2.
    pub public_parameter_group_2: Vec<P::G2Affine>,
}

impl<P: Pairing> KZGCommitmentScheme<P> {
    /// Create a new instance of a KZG polynomial commitment scheme.
    /// `max_degree` - max degree of the polynomial,
    /// `prng` - pseudo-random generator.
    pub fn new<R: CryptoRng + RngCore>(max_degree: usize, prng: &mut R) -> KZGCommitmentScheme<P> {
        let s = P::ScalarField::rand(prng);

        let mut powers = Vec::with_capacity(max_degree + 1);
        let mut elem_g1 = P::G1::generator();
        for _ in 0..=max_degree {
            powers.push(elem_g1);
            elem_g1 *= s;
        }
        let public_parameter_group_1 = P::G1::normalize_batch(&powers);

        let elem_g2 = P::G2::generator();
        let public_parameter_group_2 = P::G2::normalize_batch(&[elem_g2, elem_g2 * s]);

        KZGCommitmentScheme {
            public_parameter_group_1,
            public_parameter_group_2,
        }
    }

    /// Serialize the parameters to unchecked bytes.
    pub fn to_unchecked_bytes(&self) -> Result<Vec<u8>, PolyComSchemeError> {
        let mut bytes = vec![];
        self.public_parameter_group_1
            .serialize_uncompressed(&mut bytes)
            .map_err(|_| PolyComSchemeError::DeserializationError)?;
        self.public_parameter_group_2
            .serialize_uncompressed(&mut bytes)
            .map_err(|_| PolyComSchemeError::DeserializationError)?;
        Ok(bytes)
    }

    /// Deserialize the parameters from unchecked bytes.
    pub fn from_unchecked_bytes(mut bytes: &[u8]) -> Result<Self, PolyComSchemeError> {
        let public_parameter_group_1 =
            Vec::<P::G1Affine>::deserialize_uncompressed_unchecked(&mut bytes)
                .map_err(|_| PolyComSchemeError::DeserializationError)?;
        let public_parameter_group_2 =
            Vec::<P::G2Affine>::deserialize_uncompressed_unchecked(&mut bytes)
                .map_err(|_| PolyComSchemeError::DeserializationError)?;
        Ok(Self {
            public_parameter_group_1,
            public_parameter_group_2,
        })
    }
}

/// KZG commitment scheme over the BLS12-381 curve
pub type KZGCommitmentSchemeBLS = KZGCommitmentScheme<Bls12_381>;

impl PolyComScheme for KZGCommitmentSchemeBLS {
    type Field = Fr;
    type Commitment = KZGCommitment<G1Affine>;

    fn max_degree(&self) -> usize {
        self.public_parameter_group_1.len() - 1
    }

    fn commit(&self, polynomial: &FpPolynomial<Fr>) -> Result<Self::Commitment, PolyComSchemeError> {
        let coefs = polynomial.get_coefs_ref();
        let degree = polynomial.degree();

        if degree + 1 > self.public_parameter_group_1.len() {
            return Err(PolyComSchemeError::DegreeError);
        }

        let commitment_value =
            G1Projective::msm(&self.public_parameter_group_1[0..coefs.len()], coefs)
                .map_err(|_| PolyComSchemeError::PCSCommitError)?;

        Ok(KZGCommitment(commitment_value.into_affine()))
    }
}

#[cfg(test)]
mod test {
    use crate::poly_commit::{
        errors::PolyComSchemeError,
        field_polynomial::FpPolynomial,
        kzg_poly_com::{KZGCommitmentScheme, KZGCommitmentSchemeBLS},
        pcs::PolyComScheme,
    };
    use ark_bls12_381::{Fr, G1Projective};
    use ark_ec::{CurveGroup, Group};
    use ark_ff::{One, Zero};
    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

    #[test]
    fn test_commit_is_linear() {
        let mut prng = ChaChaRng::from_seed([0u8; 32]);
        let pcs = KZGCommitmentSchemeBLS::new(8, &mut prng);
        assert_eq!(pcs.max_degree(), 8);

        let three = Fr::from(3u64);
        let constant = pcs.commit(&FpPolynomial::from_coefs(vec![three])).unwrap();
        assert_eq!(constant.0, (G1Projective::generator() * three).into_affine());

        let p = FpPolynomial::from_coefs(vec![Fr::one(), Fr::from(2u64), Fr::from(5u64)]);
        let q = FpPolynomial::from_coefs(vec![Fr::zero(), Fr::from(7u64)]);
        let mut sum = p.clone();
        sum.add_assign(&q);
        let com_p = pcs.commit(&p).unwrap().0;
        let com_q = pcs.commit(&q).unwrap().0;
        let com_sum = pcs.commit(&sum).unwrap().0;
        assert_eq!((com_p + com_q).into_affine(), com_sum);
    }

    #[test]
    fn test_degree_bound() {
        let mut prng = ChaChaRng::from_seed([0u8; 32]);
        let pcs = KZGCommitmentSchemeBLS::new(2, &mut prng);
        let poly = FpPolynomial::from_coefs(vec![Fr::one(); 4]);
        assert_eq!(pcs.commit(&poly), Err(PolyComSchemeError::DegreeError));
    }

    #[test]
    fn test_parameters_to_bytes() {
        let mut prng = ChaChaRng::from_seed([0u8; 32]);
        let pcs = KZGCommitmentSchemeBLS::new(4, &mut prng);
        let bytes = pcs.to_unchecked_bytes().unwrap();
        let decoded = KZGCommitmentScheme::from_unchecked_bytes(&bytes).unwrap();
        assert_eq!(pcs, decoded);
    }
}
