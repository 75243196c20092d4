use crate::errors::{PlonkError, Result};
use crate::plonk::{
    constraint_system::{
        flavor::{CircuitFlavor, PermutationEncoding},
        ConstraintSystem,
    },
    copy_cycles::compute_wire_copy_cycles,
    permutation::{
        compute_first_and_last_lagrange, compute_permutation_polynomials,
        compute_standard_honk_id_polynomials,
    },
    polynomial_store::{lagrange_name, PolynomialStore},
};
use crate::poly_commit::{field_polynomial::FpPolynomial, pcs::PolyComScheme};
use ark_ff::{PrimeField, Zero};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The prover's view of a finalized circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "F: CanonicalSerialize",
    deserialize = "F: CanonicalDeserialize"
))]
pub struct ProvingKey<F> {
    /// The padded circuit size, a power of two.
    pub circuit_size: usize,
    /// Number of public input rows at the top of the trace.
    pub num_public_inputs: usize,
    /// The flavor the circuit was built with.
    pub flavor: CircuitFlavor,
    /// Selector, sigma, id and Lagrange polynomials, in both forms.
    pub polynomial_store: PolynomialStore<F>,
    /// Coset multipliers of the permutation encoding; empty for Honk.
    #[serde(with = "crate::utils::ark_serde")]
    pub ks: Vec<F>,
    /// Absolute rows of memory read records.
    pub memory_read_records: Vec<u32>,
    /// Absolute rows of memory write records.
    pub memory_write_records: Vec<u32>,
    /// Whether an inner proof was aggregated.
    pub contains_recursive_proof: bool,
    /// Public input positions holding the inner proof outputs.
    pub recursive_proof_public_input_indices: Vec<u32>,
}

/// The verifier's view: commitments to every coefficient-form polynomial of the
/// proving key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "C: Serialize, F: CanonicalSerialize",
    deserialize = "C: Deserialize<'de>, F: CanonicalDeserialize"
))]
pub struct VerificationKey<C, F> {
    /// The padded circuit size.
    pub circuit_size: usize,
    /// Number of public inputs.
    pub num_public_inputs: usize,
    /// The flavor.
    pub flavor: CircuitFlavor,
    /// Commitments keyed by polynomial name.
    pub commitments: BTreeMap<String, C>,
    /// Coset multipliers of the permutation encoding.
    #[serde(with = "crate::utils::ark_serde")]
    pub ks: Vec<F>,
    pub contains_recursive_proof: bool,
    pub recursive_proof_public_input_indices: Vec<u32>,
}

/// Verification key over a particular polynomial commitment scheme.
pub type PlonkVK<PCS> =
    VerificationKey<<PCS as PolyComScheme>::Commitment, <PCS as PolyComScheme>::Field>;

impl<C, F> VerificationKey<C, F> {
    /// The commitment of `name`.
    pub fn commitment(&self, name: &str) -> Result<&C> {
        self.commitments
            .get(name)
            .ok_or_else(|| PlonkError::MissingPolynomial(name.to_string()))
    }
}

/// Store the Lagrange form of `name` and its coefficient form.
fn put_both<F: PrimeField>(
    store: &mut PolynomialStore<F>,
    domain: &Radix2EvaluationDomain<F>,
    name: &str,
    evals: Vec<F>,
) {
    let coefs = domain.ifft(&evals);
    store.put(&lagrange_name(name), evals);
    store.put(name, coefs);
}

/// Build the proving key of a finalized circuit.
///
/// A circuit marked failed gives `PlonkError::CircuitFailed`. Selector rows are
/// shifted below the public input rows, which carry no selector. The result holds `<q>`, `sigma_<k>`, `id_<k>`, `L_first` and
/// `L_last` in Lagrange and coefficient form, `k` counting columns from one.
pub fn compute_proving_key<C: ConstraintSystem + Sync>(cs: &C) -> Result<ProvingKey<C::Field>> {
    if !cs.is_finalized() {
        return Err(PlonkError::Message(
            "proving key needs a finalized circuit".to_string(),
        ));
    }
    if cs.failed() {
        return Err(PlonkError::CircuitFailed(
            cs.err().unwrap_or_default().to_string(),
        ));
    }
    let flavor = cs.flavor();
    let n = cs.circuit_subgroup_size();
    let num_pi = cs.num_public_inputs();
    let domain = Radix2EvaluationDomain::<C::Field>::new(n).ok_or(PlonkError::GroupNotFound(n))?;
    let mut store = PolynomialStore::new();

    // Step 1: compute selector polynomials.
    for (selector, column) in flavor.selectors.iter().zip(cs.selectors().iter()) {
        let mut evals = vec![C::Field::zero(); n];
        for (row, value) in column.iter().enumerate() {
            evals[num_pi + row] = *value;
        }
        put_both(&mut store, &domain, selector.name(), evals);
    }

    // Step 2: compute permutation polynomials.
    let cycles = compute_wire_copy_cycles(cs);
    let perm = compute_permutation_polynomials(cs, &cycles, n)?;
    let ids = if flavor.encoding == PermutationEncoding::Honk && !flavor.generalized {
        compute_standard_honk_id_polynomials(flavor.program_width, n)
    } else {
        perm.ids
    };
    for (k, (sigma, id)) in perm.sigmas.into_iter().zip(ids).enumerate() {
        put_both(&mut store, &domain, &format!("sigma_{}", k + 1), sigma);
        put_both(&mut store, &domain, &format!("id_{}", k + 1), id);
    }

    // Step 3: the first and last Lagrange basis polynomials.
    let (first, last) = compute_first_and_last_lagrange(n);
    put_both(&mut store, &domain, "L_first", first);
    put_both(&mut store, &domain, "L_last", last);

    let (reads, writes) = cs.memory_records();
    let recursive = cs.recursive_proof_public_input_indices();
    debug!(
        "{} proving key: size {}, {} public inputs, {} polynomials",
        flavor.name,
        n,
        num_pi,
        store.len()
    );
    Ok(ProvingKey {
        circuit_size: n,
        num_public_inputs: num_pi,
        flavor: flavor.kind,
        polynomial_store: store,
        ks: perm.ks,
        memory_read_records: reads.to_vec(),
        memory_write_records: writes.to_vec(),
        contains_recursive_proof: !recursive.is_empty(),
        recursive_proof_public_input_indices: recursive.to_vec(),
    })
}

/// Commit every coefficient-form polynomial of `pk`.
pub fn compute_verification_key<PCS: PolyComScheme>(
    pk: &ProvingKey<PCS::Field>,
    pcs: &PCS,
) -> Result<PlonkVK<PCS>> {
    let mut commitments = BTreeMap::new();
    for (name, coefs) in pk.polynomial_store.monomials() {
        let polynomial = FpPolynomial::from_coefs(coefs.to_vec());
        commitments.insert(name.to_string(), pcs.commit(&polynomial)?);
    }
    Ok(VerificationKey {
        circuit_size: pk.circuit_size,
        num_public_inputs: pk.num_public_inputs,
        flavor: pk.flavor,
        commitments,
        ks: pk.ks.clone(),
        contains_recursive_proof: pk.contains_recursive_proof,
        recursive_proof_public_input_indices: pk.recursive_proof_public_input_indices.clone(),
    })
}
