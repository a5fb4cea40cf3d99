use thiserror::Error;
use zkl2_pubdata::{PubDataError, TxType};
use zkl2_smt::SmtError;
use zkl2_state::StateError;

pub type WitnessResult<T> = Result<T, WitnessError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WitnessError {
    #[error("state: {0}")]
    State(#[from] StateError),

    #[error("tree: {0}")]
    Tree(#[from] SmtError),

    #[error("pubdata: {0}")]
    PubData(#[from] PubDataError),

    #[error("{tx_type:?} touches {got} accounts, at most {max} fit in a witness")]
    TooManyAccounts {
        tx_type: TxType,
        got: usize,
        max: usize,
    },

    #[error("{tx_type:?} touches {got} assets of account {account_index}, at most {max} fit")]
    TooManyAssets {
        tx_type: TxType,
        account_index: u64,
        got: usize,
        max: usize,
    },

    #[error("{tx_type:?} touches more than one {kind} leaf ({first} and {second})")]
    ConflictingLeaf {
        tx_type: TxType,
        kind: &'static str,
        first: u64,
        second: u64,
    },

    #[error("{kind} {index} collides with the padding sentinel")]
    SentinelCollision { kind: &'static str, index: u64 },

    #[error("registration of account {index} out of order, next free slot is {next}")]
    RegistrationOutOfOrder { index: u64, next: u64 },

    #[error("{field} of account {account_index} asset {asset_id} would become negative")]
    NegativeBalance {
        account_index: u64,
        asset_id: u64,
        field: &'static str,
    },

    #[error("{field} of pair {pair_index} would become negative")]
    NegativeReserve {
        pair_index: u64,
        field: &'static str,
    },

    #[error("block holds {got} txs but its size is {size}")]
    BlockOverflow { got: usize, size: usize },

    #[error("forest has uncommitted writes before block {0}")]
    PendingWrites(u64),
}
