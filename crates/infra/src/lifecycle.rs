//! Transaction lifecycle orchestration.
//!
//! Every mutating operation follows the same pipeline:
//!
//! ```text
//! 1. Load the record (whole row tree) from the store
//! 2. Run the domain operation against a private copy
//! 3. Validate the copy
//! 4. Commit with ExpectedVersion::Exact(loaded version)
//! 5. Publish the newly logged events to the bus
//! ```
//!
//! A stale commit reloads and re-runs the operation, up to
//! `LifecycleConfig::max_commit_attempts` times. Publication happens only after a
//! successful commit; if publication fails the state is already committed.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use dealroom_auth::Actor;
use dealroom_core::{
    AggregateRoot, Clock, DomainError, DomainResult, ExpectedVersion, SystemClock, TransactionId,
};
use dealroom_events::{EventBus, EventEnvelope};
use dealroom_transactions::{
    AcceptedInvitation, CounterpartyInvited, CreateTransaction, DetailsPayload, TransactionEvent,
    TransactionRecord, TransactionSummary,
};

use crate::config::LifecycleConfig;
use crate::store::{StoreError, TransactionStore};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("store error: {0}")]
    Store(StoreError),

    /// Publication failed after a successful commit (at-least-once; retry may duplicate).
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<StoreError> for LifecycleError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => LifecycleError::Domain(DomainError::Conflict(msg)),
            other => LifecycleError::Store(other),
        }
    }
}

/// The only writer of transaction, participant and invitation state.
#[derive(Debug)]
pub struct LifecycleService<S, B, C = SystemClock> {
    store: S,
    bus: B,
    clock: C,
    config: LifecycleConfig,
}

impl<S, B, C> LifecycleService<S, B, C> {
    pub fn with_clock(store: S, bus: B, clock: C, config: LifecycleConfig) -> Self {
        Self {
            store,
            bus,
            clock,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// What to do with the draft after the domain operation returned.
enum Outcome<T> {
    Commit(T),
    /// Persist the draft, then fail with the error.
    CommitThenFail(DomainError),
    Fail(DomainError),
}

impl<T> Outcome<T> {
    fn of(result: DomainResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Commit(value),
            // Expiry is recorded even though the accept fails.
            Err(DomainError::Expired) => Outcome::CommitThenFail(DomainError::Expired),
            Err(e) => Outcome::Fail(e),
        }
    }
}

impl<S, B, C> LifecycleService<S, B, C>
where
    S: TransactionStore,
    B: EventBus<EventEnvelope<JsonValue>>,
    C: Clock,
{
    /// Open a transaction with its initial participants and invitations.
    pub fn create_transaction(
        &self,
        creator: &Actor,
        request: &CreateTransaction,
    ) -> Result<TransactionRecord, LifecycleError> {
        let now = self.clock.now();
        let record = TransactionRecord::open(creator, request, &self.config.invitation_policy(), now)?;
        record.validate()?;

        let committed = self.store.commit(record, ExpectedVersion::New)?;
        self.publish(committed.events())?;
        tracing::info!(
            transaction_id = %committed.id(),
            created_by = %creator.id,
            participants = committed.participants().len(),
            "transaction created"
        );
        Ok(committed)
    }

    pub fn invite_counterparty(
        &self,
        transaction_id: TransactionId,
        actor: &Actor,
        counterparty_email: &str,
    ) -> Result<CounterpartyInvited, LifecycleError> {
        let policy = self.config.invitation_policy();
        let (invited, _) = self.mutate(transaction_id, "invite_counterparty", |record, now| {
            Outcome::of(record.invite_counterparty(actor, counterparty_email, &policy, now))
        })?;
        Ok(invited)
    }

    /// Accept an invitation by token on behalf of `user`.
    pub fn accept_invitation(&self, token: &str, user: &Actor) -> Result<AcceptedInvitation, LifecycleError> {
        let transaction_id = self
            .store
            .find_by_token(token)?
            .ok_or_else(|| DomainError::not_found("invitation"))?;
        let (accepted, _) = self.mutate(transaction_id, "accept_invitation", |record, now| {
            Outcome::of(record.accept_invitation(token, user, now))
        })?;
        Ok(accepted)
    }

    pub fn merge_details(
        &self,
        transaction_id: TransactionId,
        actor: &Actor,
        patch: DetailsPayload,
    ) -> Result<TransactionRecord, LifecycleError> {
        let (_, record) = self.mutate(transaction_id, "merge_details", |record, now| {
            Outcome::of(record.merge_details(actor, patch.clone(), now))
        })?;
        Ok(record)
    }

    /// Summaries of the transactions `user` can see, newest first.
    pub fn list_transactions(&self, user: &Actor) -> Result<Vec<TransactionSummary>, LifecycleError> {
        let mut records = self.store.list_for_user(user.id)?;
        records.sort_by(|a, b| b.transaction().created_at.cmp(&a.transaction().created_at));
        Ok(records
            .iter()
            .map(|r| TransactionSummary::for_user(r, user.id))
            .collect())
    }

    /// Full record if visible to `user`; otherwise `NotFound`.
    pub fn get_transaction(
        &self,
        transaction_id: TransactionId,
        user: &Actor,
    ) -> Result<TransactionRecord, LifecycleError> {
        self.store
            .load(transaction_id)?
            .filter(|r| r.is_visible_to(user.id))
            .ok_or_else(|| DomainError::not_found(format!("transaction {transaction_id}")).into())
    }

    fn mutate<T>(
        &self,
        transaction_id: TransactionId,
        operation: &'static str,
        mut op: impl FnMut(&mut TransactionRecord, DateTime<Utc>) -> Outcome<T>,
    ) -> Result<(T, TransactionRecord), LifecycleError> {
        let attempts = self.config.max_commit_attempts.max(1);
        for attempt in 1..=attempts {
            let loaded = self
                .store
                .load(transaction_id)?
                .ok_or_else(|| DomainError::not_found(format!("transaction {transaction_id}")))?;
            let expected = ExpectedVersion::Exact(loaded.version());
            let mut draft = loaded.clone();

            let (value, failure) = match op(&mut draft, self.clock.now()) {
                Outcome::Commit(value) => (Some(value), None),
                Outcome::CommitThenFail(e) => (None, Some(e)),
                Outcome::Fail(e) => return Err(e.into()),
            };
            draft.validate()?;

            let committed = match self.store.commit(draft, expected) {
                Ok(committed) => committed,
                Err(StoreError::Concurrency(msg)) => {
                    tracing::warn!(
                        transaction_id = %transaction_id,
                        operation,
                        attempt,
                        error = %msg,
                        "commit conflict; retrying"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            self.publish(committed.events_since(loaded.last_sequence()))?;

            if let Some(e) = failure {
                return Err(e.into());
            }
            return match value {
                Some(value) => Ok((value, committed)),
                None => Err(DomainError::invalid_state("operation produced no result").into()),
            };
        }

        tracing::warn!(transaction_id = %transaction_id, operation, attempts, "giving up after repeated conflicts");
        Err(DomainError::conflict(format!(
            "transaction {transaction_id} was modified concurrently"
        ))
        .into())
    }

    fn publish(&self, events: &[TransactionEvent]) -> Result<(), LifecycleError> {
        for event in events {
            self.bus
                .publish(event.to_envelope())
                .map_err(|e| LifecycleError::Publish(format!("{e:?}")))?;
        }
        Ok(())
    }
}
