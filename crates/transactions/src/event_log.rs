//! Append-only lifecycle event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use dealroom_core::{EventId, TransactionId, UserId};
use dealroom_events::EventEnvelope;

use crate::model::TransactionRecord;

pub const AGGREGATE_TYPE: &str = "transactions.transaction";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionEventType {
    StageChanged,
    InvitationSent,
    InvitationAccepted,
    CounterpartyInvited,
}

impl TransactionEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionEventType::StageChanged => "stage_changed",
            TransactionEventType::InvitationSent => "invitation_sent",
            TransactionEventType::InvitationAccepted => "invitation_accepted",
            TransactionEventType::CounterpartyInvited => "counterparty_invited",
        }
    }

    /// Fully qualified name used on the event bus.
    pub fn qualified_name(&self) -> &'static str {
        match self {
            TransactionEventType::StageChanged => "transactions.stage_changed",
            TransactionEventType::InvitationSent => "transactions.invitation_sent",
            TransactionEventType::InvitationAccepted => "transactions.invitation_accepted",
            TransactionEventType::CounterpartyInvited => "transactions.counterparty_invited",
        }
    }
}

/// One entry in a transaction's audit log. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEvent {
    pub id: EventId,
    pub transaction_id: TransactionId,
    /// 1-based position within the transaction's log.
    pub sequence: u64,
    pub event_type: TransactionEventType,
    pub actor: Option<UserId>,
    pub data: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl TransactionEvent {
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.id,
            self.transaction_id,
            AGGREGATE_TYPE,
            self.sequence,
            self.event_type.qualified_name(),
            self.created_at,
            self.data.clone(),
        )
    }
}

impl TransactionRecord {
    /// Sequence number of the last logged event (0 when the log is empty).
    pub fn last_sequence(&self) -> u64 {
        self.events.last().map(|e| e.sequence).unwrap_or(0)
    }

    /// Events appended after `sequence`, in order.
    pub fn events_since(&self, sequence: u64) -> &[TransactionEvent] {
        let start = self.events.partition_point(|e| e.sequence <= sequence);
        &self.events[start..]
    }

    pub(crate) fn log_event(
        &mut self,
        event_type: TransactionEventType,
        actor: Option<UserId>,
        data: JsonValue,
        now: DateTime<Utc>,
    ) {
        let sequence = self.last_sequence() + 1;
        self.events.push(TransactionEvent {
            id: EventId::new(),
            transaction_id: self.transaction.id,
            sequence,
            event_type,
            actor,
            data,
            created_at: now,
        });
    }
}
