use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use dealroom_core::{AggregateRoot, ExpectedVersion, TransactionId, UserId};
use dealroom_transactions::TransactionRecord;

use super::r#trait::{StoreError, TransactionStore};

#[derive(Debug, Default)]
struct Tables {
    records: HashMap<TransactionId, TransactionRecord>,
    /// Global unique index: invitation token -> owning transaction.
    tokens: HashMap<String, TransactionId>,
}

/// In-memory transaction store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    tables: RwLock<Tables>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tables.read().map(|t| t.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_constraints(tables: &Tables, record: &TransactionRecord) -> Result<(), StoreError> {
    let id = *record.id();

    let mut roles = HashSet::new();
    for participant in record.participants() {
        if !roles.insert(participant.role) {
            return Err(StoreError::UniqueViolation(format!(
                "participant role {} on transaction {id}",
                participant.role
            )));
        }
    }

    let mut seen = HashSet::new();
    for token in record.tokens() {
        if !seen.insert(token) {
            return Err(StoreError::UniqueViolation("duplicate invitation token".to_string()));
        }
        if tables.tokens.get(token).is_some_and(|owner| *owner != id) {
            return Err(StoreError::UniqueViolation(
                "invitation token already in use".to_string(),
            ));
        }
    }
    Ok(())
}

impl TransactionStore for InMemoryTransactionStore {
    fn commit(
        &self,
        record: TransactionRecord,
        expected_version: ExpectedVersion,
    ) -> Result<TransactionRecord, StoreError> {
        let id = *record.id();
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let current = tables.records.get(&id).map(|r| r.version());
        if !expected_version.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current:?}"
            )));
        }
        check_constraints(&tables, &record)?;

        // Drop the old token entries before indexing the new row tree.
        if let Some(previous) = tables.records.get(&id) {
            let stale: Vec<String> = previous.tokens().map(str::to_string).collect();
            for token in stale {
                tables.tokens.remove(&token);
            }
        }
        for token in record.tokens() {
            tables.tokens.insert(token.to_string(), id);
        }

        let committed = record.with_version(current.unwrap_or(0) + 1);
        tables.records.insert(id, committed.clone());
        Ok(committed)
    }

    fn load(&self, id: TransactionId) -> Result<Option<TransactionRecord>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(tables.records.get(&id).cloned())
    }

    fn find_by_token(&self, token: &str) -> Result<Option<TransactionId>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(tables.tokens.get(token).copied())
    }

    fn list_for_user(&self, user: UserId) -> Result<Vec<TransactionRecord>, StoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(tables
            .records
            .values()
            .filter(|r| r.is_visible_to(user))
            .cloned()
            .collect())
    }

    fn delete(&self, id: TransactionId) -> Result<bool, StoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let Some(removed) = tables.records.remove(&id) else {
            return Ok(false);
        };
        for token in removed.tokens() {
            tables.tokens.remove(token);
        }
        Ok(true)
    }
}
