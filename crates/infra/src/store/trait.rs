use std::sync::Arc;

use thiserror::Error;

use dealroom_core::{ExpectedVersion, TransactionId, UserId};
use dealroom_transactions::TransactionRecord;

/// Storage operation error.
///
/// These are infrastructure errors (versioning, constraints, backend health) as
/// opposed to domain errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Atomic, versioned storage of transaction records.
///
/// Implementations must:
/// - commit a record and all of its children atomically (all or nothing)
/// - reject commits whose `ExpectedVersion` does not match the stored version
/// - bump the stored version by one on every successful commit (first commit = 1)
/// - keep invitation tokens unique across all records
/// - keep at most one participant per (transaction, role)
pub trait TransactionStore: Send + Sync {
    /// Commit a record, returning it with its new version.
    fn commit(
        &self,
        record: TransactionRecord,
        expected_version: ExpectedVersion,
    ) -> Result<TransactionRecord, StoreError>;

    fn load(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError>;

    /// Transaction owning the invitation with this token.
    fn find_by_token(&self, token: &str) -> Result<Option<TransactionId>, StoreError>;

    /// Records the user created or is bound to as a participant.
    fn list_for_user(&self, user: UserId) -> Result<Vec<TransactionRecord>, StoreError>;

    /// Remove a record and everything it owns. Returns whether it existed.
    fn delete(&self, id: TransactionId) -> Result<bool, StoreError>;
}

impl<S> TransactionStore for Arc<S>
where
    S: TransactionStore + ?Sized,
{
    fn commit(
        &self,
        record: TransactionRecord,
        expected_version: ExpectedVersion,
    ) -> Result<TransactionRecord, StoreError> {
        (**self).commit(record, expected_version)
    }

    fn load(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        (**self).load(id)
    }

    fn find_by_token(&self, token: &str) -> Result<Option<TransactionId>, StoreError> {
        (**self).find_by_token(token)
    }

    fn list_for_user(&self, user: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        (**self).list_for_user(user)
    }

    fn delete(&self, id: TransactionId) -> Result<bool, StoreError> {
        (**self).delete(id)
    }
}
