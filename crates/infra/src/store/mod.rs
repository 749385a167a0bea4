//! Transaction record storage boundary.
//!
//! A record is the whole row tree of one transaction (participants, invitations,
//! details, split, event log) and is always committed as one unit.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryTransactionStore;
pub use r#trait::{StoreError, TransactionStore};
