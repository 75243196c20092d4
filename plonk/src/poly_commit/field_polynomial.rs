use ark_ff::PrimeField;
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

/// Field polynomial.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: CanonicalSerialize",
    deserialize = "F: CanonicalDeserialize"
))]
pub struct FpPolynomial<F> {
    /// Coefficients of the polynomial, low-order first.
    #[serde(with = "crate::utils::ark_serde")]
    pub coefs: Vec<F>,
}

impl<F: PrimeField> FpPolynomial<F> {
    /// Return the polynomial coefs reference.
    pub fn get_coefs_ref(&self) -> &[F] {
        self.coefs.as_slice()
    }

    /// Build a polynomial from the coefficient vector, low-order coefficient first.
    /// High-order zero coefficient are trimmed.
    /// # Example
    /// ```
    /// use plonk_arith::poly_commit::field_polynomial::FpPolynomial;
    /// use ark_bls12_381::Fr;
    /// use ark_ff::{One, Zero};
    /// let one = Fr::one();
    /// let zero = Fr::zero();
    /// let poly = FpPolynomial::from_coefs(vec![one, zero, one, zero, zero]);
    /// assert_eq!(poly.degree(), 2);
    /// assert_eq!(poly.eval(&Fr::from(2u64)), Fr::from(5u64));
    /// ```
    pub fn from_coefs(coefs: Vec<F>) -> Self {
        let mut p = FpPolynomial { coefs };
        p.trim_coefs();
        p
    }

    /// Interpolate the evaluations over the subgroup of size `values.len()`.
    /// Returns `None` when the field has no such subgroup.
    /// # Example
    /// ```
    /// use plonk_arith::poly_commit::field_polynomial::FpPolynomial;
    /// use ark_bls12_381::Fr;
    /// let values: Vec<Fr> = (0..4u64).map(Fr::from).collect();
    /// let poly = FpPolynomial::ffti(&values).unwrap();
    /// assert_eq!(poly.fft(4).unwrap(), values);
    /// ```
    pub fn ffti(values: &[F]) -> Option<Self> {
        let domain = Radix2EvaluationDomain::<F>::new(values.len())?;
        if domain.size() != values.len() {
            return None;
        }
        Some(Self::from_coefs(domain.ifft(values)))
    }

    /// Evaluate over the subgroup of size `num_points`.
    pub fn fft(&self, num_points: usize) -> Option<Vec<F>> {
        let domain = Radix2EvaluationDomain::<F>::new(num_points)?;
        if domain.size() != num_points || self.coefs.len() > num_points {
            return None;
        }
        Some(domain.fft(&self.coefs))
    }

    /// Remove high degree zero-coefficients
    fn trim_coefs(&mut self) {
        while self.coefs.len() > 1 && self.coefs.last().map_or(false, |c| c.is_zero()) {
            self.coefs.pop();
        }
    }

    /// Return degree of the polynomial
    pub fn degree(&self) -> usize {
        if self.coefs.is_empty() {
            0
        } else {
            self.coefs.len() - 1
        }
    }

    /// Test if polynomial is the zero polynomial.
    pub fn is_zero(&self) -> bool {
        self.coefs.iter().all(|c| c.is_zero())
    }

    /// Evaluate a polynomial on a point.
    pub fn eval(&self, point: &F) -> F {
        self.coefs
            .iter()
            .rev()
            .fold(F::zero(), |acc, coef| acc * point + coef)
    }

    /// Add another polynomial to self.
    pub fn add_assign(&mut self, other: &Self) {
        if self.coefs.len() < other.coefs.len() {
            self.coefs.resize(other.coefs.len(), F::zero());
        }
        for (self_coef, other_coef) in self.coefs.iter_mut().zip(other.coefs.iter()) {
            *self_coef += other_coef;
        }
        self.trim_coefs();
    }

    /// Multiply every coefficient by `scalar`.
    pub fn scale(&mut self, scalar: &F) {
        self.coefs.iter_mut().for_each(|c| *c *= scalar);
        self.trim_coefs();
    }
}

#[cfg(test)]
mod test {
    use crate::poly_commit::field_polynomial::FpPolynomial;
    use ark_bls12_381::Fr;
    use ark_ff::{One, UniformRand, Zero};
    use rand_chacha::{rand_core::SeedableRng, ChaChaRng};

    #[test]
    fn test_fft_matches_eval() {
        let mut prng = ChaChaRng::from_seed([1u8; 32]);
        let poly = FpPolynomial::from_coefs((0..16).map(|_| Fr::rand(&mut prng)).collect());
        let values = poly.fft(16).unwrap();
        let domain_poly = FpPolynomial::ffti(&values).unwrap();
        assert_eq!(domain_poly, poly);
        assert!(FpPolynomial::<Fr>::ffti(&values[..3]).is_none());
        assert!(poly.fft(8).is_none());
    }

    #[test]
    fn test_lagrange_basis() {
        let mut values = vec![Fr::zero(); 8];
        values[0] = Fr::one();
        let l_first = FpPolynomial::ffti(&values).unwrap();
        assert_eq!(l_first.eval(&Fr::one()), Fr::one());
        assert_eq!(l_first.degree(), 7);
    }

    #[test]
    fn test_add_and_scale() {
        let one = Fr::one();
        let two = one + one;
        let mut a = FpPolynomial::from_coefs(vec![one, two]);
        let mut b = FpPolynomial::from_coefs(vec![one, two, two]);
        b.scale(&-one);
        a.add_assign(&b);
        assert_eq!(a, FpPolynomial::from_coefs(vec![Fr::zero(), Fr::zero(), -two]));
        assert_eq!(a.degree(), 2);
        a.scale(&Fr::zero());
        assert!(a.is_zero());
        assert_eq!(a.degree(), 0);
    }
}
