//! Error types for storage operations

use thiserror::Error;

use crate::novel::NovelId;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Coarse classification callers use to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Lookup key absent
    NotFound,
    /// Unset/zero identifier where one is required, or bad configuration
    InvalidArgument,
    /// The store has been closed
    FailedPrecondition,
    /// Unexpected backend fault
    Internal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("novel not found with id {0}")]
    NotFound(NovelId),

    #[error("novel with unassigned id passed into {0}")]
    UnassignedId(&'static str),

    #[error("invalid database name: {0:?}")]
    InvalidDatabaseName(String),

    #[error("store has been closed")]
    Closed,

    #[error("expected 1 row affected, got {0}")]
    UnexpectedRowCount(u64),

    #[error("mysql error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("document database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("document transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("document table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("document storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("document commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("malformed document: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::UnassignedId(_) | StoreError::InvalidDatabaseName(_) => {
                ErrorKind::InvalidArgument
            }
            StoreError::Closed | StoreError::Sql(sqlx::Error::PoolClosed) => {
                ErrorKind::FailedPrecondition
            }
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_expected_conditions() {
        assert_eq!(
            StoreError::NotFound(NovelId::from(1)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StoreError::UnassignedId("delete").kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(StoreError::Closed.kind(), ErrorKind::FailedPrecondition);
        assert_eq!(
            StoreError::Sql(sqlx::Error::PoolClosed).kind(),
            ErrorKind::FailedPrecondition
        );
        assert_eq!(
            StoreError::UnexpectedRowCount(2).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            StoreError::Sql(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
    }
}
