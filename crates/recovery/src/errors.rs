use alloy_primitives::U256;
use thiserror::Error;
use zkl2_primitives::Buf32;
use zkl2_pubdata::{PubDataError, TxType};
use zkl2_state::StateError;
use zkl2_witness::WitnessError;

pub type RecoveryResult<T> = Result<T, RecoveryError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("pubdata: {0}")]
    PubData(#[from] PubDataError),

    #[error("state: {0}")]
    State(#[from] StateError),

    #[error("witness: {0}")]
    Witness(#[from] WitnessError),

    #[error("amount {0} does not fit a signed delta")]
    AmountOverflow(U256),

    #[error("malformed {tx_type:?} record: {reason}")]
    MalformedRecord {
        tx_type: TxType,
        reason: &'static str,
    },

    #[error("expected block {expected}, got {got}")]
    NonSequentialBlock { expected: u64, got: u64 },

    #[error("state root mismatch at block {height}: expected {expected}, got {got}")]
    StateRootMismatch {
        height: u64,
        expected: Buf32,
        got: Buf32,
    },
}
