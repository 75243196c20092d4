use thiserror::Error;

pub(crate) type Result<T> = core::result::Result<T, AcirError>;

/// Errors raised while decoding interchange bytes.
#[derive(Error, Debug)]
pub enum AcirError {
    /// The input ended early or could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A field element is not below the modulus.
    #[error("field element is not canonical")]
    NonCanonicalField,

    /// A boolean byte other than 0 or 1.
    #[error("invalid boolean byte {0}")]
    InvalidBool(u8),

    /// Bytes left over after the last record.
    #[error("{0} trailing bytes after the constraint system")]
    TrailingBytes(usize),
}
