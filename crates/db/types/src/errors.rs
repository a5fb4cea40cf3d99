use thiserror::Error;

use crate::types::Version;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DbError {
    #[error("tried to roll back to version {0} above latest version {1}")]
    RollbackAboveLatest(Version, Version),

    #[error("version {requested} has been pruned (earliest retained {earliest})")]
    VersionPruned {
        requested: Version,
        earliest: Version,
    },

    #[error("tried to commit version {new} below latest version {latest}")]
    VersionNotIncreasing { new: Version, latest: Version },

    #[error("cannot initialize version of tree {0} with committed history")]
    AlreadyInitialized(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("IO Error: {0}")]
    IoError(String),

    #[error("codec error {0}")]
    CodecError(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for DbError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}
