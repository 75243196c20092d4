//! Circuit arithmetization for the PLONK/Honk family: a variable store with copy
//! constraints, a flavored gate emitter, wire copy cycles and the permutation
//! polynomials consumed by a prover.
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]

#[macro_use]
extern crate serde_derive;

pub mod errors;
pub mod plonk;
pub mod poly_commit;
pub mod utils;

pub use errors::PlonkError;
