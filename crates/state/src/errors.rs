use thiserror::Error;
use zkl2_db_types::DbError;
use zkl2_primitives::CodecError;
use zkl2_smt::SmtError;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("codec: {0}")]
    Codec(#[from] CodecError),

    #[error("tree: {0}")]
    Tree(#[from] SmtError),

    #[error("db: {0}")]
    Db(#[from] DbError),

    #[error("account {0} is not registered")]
    AccountNotRegistered(u64),

    #[error("account index {index} is beyond the next free slot {next}")]
    AccountIndexGap { index: u64, next: u64 },

    #[error("{0} is reserved as a padding sentinel")]
    SentinelIndex(&'static str),

    #[error("tree {0} already holds leaves")]
    TreeNotEmpty(String),

    #[error("corrupt leaf pre-image in {tree} at {index}: {reason}")]
    CorruptLeaf {
        tree: String,
        index: u64,
        reason: String,
    },

    #[error("commit height {new} is below the forest height {current}")]
    HeightRegression { new: u64, current: u64 },

    #[error("leaf source: {0}")]
    Source(String),

    #[error("bootstrap aborted: {0}")]
    Bootstrap(String),
}
