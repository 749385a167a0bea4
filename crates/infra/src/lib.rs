//! Infrastructure layer: record storage, lifecycle orchestration, config.

pub mod config;
pub mod lifecycle;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::LifecycleConfig;
pub use lifecycle::{LifecycleError, LifecycleService};
pub use store::{InMemoryTransactionStore, StoreError, TransactionStore};
