use thiserror::Error;
use zkl2_primitives::CodecError;

use crate::types::TxType;

pub type PubDataResult<T> = Result<T, PubDataError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PubDataError {
    #[error("unknown tx type tag {0}")]
    UnknownTxType(u8),

    #[error("{tx_type:?} record must be {expected} bytes, got {got}")]
    InvalidLength {
        tx_type: TxType,
        expected: usize,
        got: usize,
    },

    #[error("pubdata of {got} bytes is not a multiple of the {stride}-byte tx stride")]
    UnalignedBatch { got: usize, stride: usize },

    #[error("{tx_type:?} record has non-zero padding at byte {offset}")]
    NonZeroPadding { tx_type: TxType, offset: usize },

    #[error("record truncated: needed {needed} more bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },

    #[error("{kind} amount {value} is outside the packable range")]
    Unpackable { kind: &'static str, value: String },

    #[error("{kind} amount {value} is negative")]
    NegativeAmount { kind: &'static str, value: String },

    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}
