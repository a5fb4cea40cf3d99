use thiserror::Error;
use zkl2_db_types::DbError;

pub type SmtResult<T> = Result<T, SmtError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SmtError {
    #[error("index {index} out of range for tree of height {height}")]
    IndexOutOfRange { index: u64, height: u8 },

    #[error("proof has {got} siblings, tree height is {expected}")]
    ProofLength { expected: usize, got: usize },

    #[error("corrupt entry in {namespace}: {reason}")]
    CorruptEntry { namespace: String, reason: String },

    #[error("db: {0}")]
    Db(#[from] DbError),
}
