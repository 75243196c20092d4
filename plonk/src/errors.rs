use crate::poly_commit::errors::PolyComSchemeError;
use thiserror::Error;

pub(crate) type Result<T> = core::result::Result<T, PlonkError>;

/// Errors raised while turning a built circuit into keys.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum PlonkError {
    /// The circuit was marked failed while it was being built.
    #[error("circuit failed: {0}")]
    CircuitFailed(String),

    /// No multiplicative subgroup of the requested size exists in the field.
    #[error("evaluation domain of size {0} not found")]
    GroupNotFound(usize),

    /// A copy cycle references a position outside the permutation polynomials.
    #[error("permutation out of bounds: wire {wire}, row {row} (width {width}, size {size})")]
    PermutationOutOfBounds {
        wire: usize,
        row: usize,
        width: usize,
        size: usize,
    },

    /// A tagged cycle refers to a tag without a registered partner.
    #[error("tag {0} has no tau partner")]
    MissingTau(u32),

    /// A polynomial required by the key was never stored.
    #[error("polynomial {0} missing from the store")]
    MissingPolynomial(String),

    /// A gate row does not satisfy its relation.
    #[error("gate {row} is not satisfied: {reason}")]
    UnsatisfiedGate { row: usize, reason: String },

    /// The commitment scheme refused the input.
    #[error("commitment error: {0}")]
    Commitment(#[from] PolyComSchemeError),

    /// Error with message.
    #[error("{0}")]
    Message(String),
}
