//! The composer owns a circuit and hands out its keys and witness, computing
//! each at most once.
use crate::errors::{PlonkError, Result};
use crate::plonk::{
    constraint_system::{CircuitBuilder, ConstraintSystem},
    indexer::{compute_proving_key, compute_verification_key, PlonkVK, ProvingKey},
    polynomial_store::lagrange_name,
};
use crate::poly_commit::pcs::PolyComScheme;
use ark_ff::PrimeField;
use log::info;

/// Wraps a circuit builder together with its memoized keys.
pub struct CircuitComposer<PCS: PolyComScheme> {
    circuit: CircuitBuilder<PCS::Field>,
    pcs: PCS,
    proving_key: Option<ProvingKey<PCS::Field>>,
    verification_key: Option<PlonkVK<PCS>>,
    witness: Option<Vec<Vec<PCS::Field>>>,
}

impl<PCS: PolyComScheme> CircuitComposer<PCS> {
    pub fn new(circuit: CircuitBuilder<PCS::Field>, pcs: PCS) -> Self {
        CircuitComposer {
            circuit,
            pcs,
            proving_key: None,
            verification_key: None,
            witness: None,
        }
    }

    /// The circuit being composed.
    pub fn circuit(&self) -> &CircuitBuilder<PCS::Field> {
        &self.circuit
    }

    /// Finalize the circuit if needed and build its proving key. Later calls
    /// return the stored key.
    pub fn compute_proving_key(&mut self) -> Result<&ProvingKey<PCS::Field>> {
        if self.proving_key.is_none() {
            self.circuit.finalize_circuit();
            let pk = compute_proving_key(&self.circuit)?;
            info!(
                "proving key ready: {} gates padded to {}",
                self.circuit.num_gates(),
                pk.circuit_size
            );
            self.proving_key = Some(pk);
        }
        self.proving_key
            .as_ref()
            .ok_or_else(|| PlonkError::Message("proving key unavailable".to_string()))
    }

    /// Commit the proving key. Later calls return the stored key.
    pub fn compute_verification_key(&mut self) -> Result<&PlonkVK<PCS>> {
        if self.verification_key.is_none() {
            self.compute_proving_key()?;
            let pk = self
                .proving_key
                .as_ref()
                .ok_or_else(|| PlonkError::Message("proving key unavailable".to_string()))?;
            self.verification_key = Some(compute_verification_key(pk, &self.pcs)?);
        }
        self.verification_key
            .as_ref()
            .ok_or_else(|| PlonkError::Message("verification key unavailable".to_string()))
    }

    /// Wire values over the padded domain, `w_<k>_lagrange` for `k` from one.
    /// Public input rows hold the input on the left and right wires.
    pub fn compute_witness(&mut self) -> Result<&[Vec<PCS::Field>]> {
        if self.witness.is_none() {
            self.compute_proving_key()?;
            let wires = witness_columns(&self.circuit);
            if let Some(pk) = self.proving_key.as_mut() {
                for (k, column) in wires.iter().enumerate() {
                    pk.polynomial_store
                        .put(&lagrange_name(&format!("w_{}", k + 1)), column.clone());
                }
            }
            self.witness = Some(wires);
        }
        self.witness
            .as_deref()
            .ok_or_else(|| PlonkError::Message("witness unavailable".to_string()))
    }
}

fn witness_columns<F: PrimeField>(cs: &CircuitBuilder<F>) -> Vec<Vec<F>> {
    let n = cs.circuit_subgroup_size();
    let width = cs.flavor().program_width;
    let num_pi = cs.num_public_inputs();
    let mut wires = vec![vec![F::zero(); n]; width];
    for (i, index) in cs.public_inputs().iter().enumerate() {
        let value = cs.get_variable(*index);
        wires[0][i] = value;
        wires[1][i] = value;
    }
    for (column, indices) in wires.iter_mut().zip(cs.wires().iter()) {
        for (row, index) in indices.iter().enumerate() {
            column[num_pi + row] = cs.get_variable(*index);
        }
    }
    wires
}
