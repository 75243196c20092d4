//! Named polynomials of a proving key. Lagrange evaluations live under
//! `<name>_lagrange`, coefficient forms under the bare name.
use crate::errors::{PlonkError, Result};
use ark_ff::PrimeField;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use std::collections::BTreeMap;

/// Values of one stored polynomial, either evaluations or coefficients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: CanonicalSerialize",
    deserialize = "F: CanonicalDeserialize"
))]
pub struct StoredPolynomial<F>(#[serde(with = "crate::utils::ark_serde")] pub Vec<F>);

/// A map from polynomial names to values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(bound(
    serialize = "F: CanonicalSerialize",
    deserialize = "F: CanonicalDeserialize"
))]
pub struct PolynomialStore<F> {
    polynomials: BTreeMap<String, StoredPolynomial<F>>,
}

/// Name of the Lagrange form of `name`.
pub fn lagrange_name(name: &str) -> String {
    format!("{}_lagrange", name)
}

impl<F: PrimeField> PolynomialStore<F> {
    pub fn new() -> Self {
        PolynomialStore {
            polynomials: BTreeMap::new(),
        }
    }

    /// Store `values` under `name`, replacing what was there.
    pub fn put(&mut self, name: &str, values: Vec<F>) {
        self.polynomials
            .insert(name.to_string(), StoredPolynomial(values));
    }

    /// The values stored under `name`.
    pub fn get(&self, name: &str) -> Result<&[F]> {
        self.polynomials
            .get(name)
            .map(|p| p.0.as_slice())
            .ok_or_else(|| PlonkError::MissingPolynomial(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.polynomials.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<F>> {
        self.polynomials.remove(name).map(|p| p.0)
    }

    pub fn len(&self) -> usize {
        self.polynomials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polynomials.is_empty()
    }

    /// Names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.polynomials.keys().map(|k| k.as_str())
    }

    /// Coefficient forms, i.e. every entry without the `_lagrange` suffix.
    pub fn monomials(&self) -> impl Iterator<Item = (&str, &[F])> {
        self.polynomials
            .iter()
            .filter(|(k, _)| !k.ends_with("_lagrange"))
            .map(|(k, v)| (k.as_str(), v.0.as_slice()))
    }
}
