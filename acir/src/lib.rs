//! Circuit interchange: a flat list of constraint records over numbered
//! witnesses, a big-endian binary codec for it, and the lowering of the records
//! into a `plonk_arith` circuit builder.
#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate serde_derive;

pub mod acir_format;
pub mod errors;
pub mod gadgets;
pub mod serialization;

pub use acir_format::{create_circuit, create_circuit_with_witness, read_witness, AcirFormat};
pub use errors::AcirError;
pub use gadgets::{GadgetBackend, UnsupportedGadgets};
