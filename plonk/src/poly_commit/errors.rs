use thiserror::Error;

/// Commitment scheme errors.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum PolyComSchemeError {
    /// The multi-scalar multiplication received mismatched inputs.
    #[error("commitment bases and coefficients do not match")]
    PCSCommitError,
    /// The polynomial is wider than the parameters.
    #[error("polynomial degree exceeds the supported maximum")]
    DegreeError,
    /// The public parameters could not be decoded.
    #[error("public parameters could not be decoded")]
    DeserializationError,
}
