//! Errors raised while canonicalizing leaf and pubdata inputs.

use thiserror::Error;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed numeric string {0:?}")]
    MalformedNumber(String),

    #[error("invalid length for {field}: expected {expected} bytes, got {got}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("value of {field} does not fit in {bits} bits")]
    Overflow { field: &'static str, bits: u32 },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),
}
