//! The arithmetization pipeline: build, finalize, copy cycles, permutation, keys.

/// Module for the constraint system.
pub mod constraint_system;

/// Module for wire copy cycles.
pub mod copy_cycles;

/// Module for permutation polynomials.
pub mod permutation;

/// Module for the named polynomial store.
pub mod polynomial_store;

/// Module for indexer.
pub mod indexer;

/// Module for the key-memoizing composer.
pub mod composer;
