//! Read models returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealroom_core::{InvitationId, ParticipantId, TransactionId, UserId};

use crate::event_log::TransactionEvent;
use crate::model::{
    CommissionSplit, CoreFields, DetailsPayload, Invitation, InvitationStatus, Participant, ParticipantRole,
    Stage, Transaction, TransactionRecord, TransactionStatus, TransactionType,
};

pub const WAITING_FOR_SECONDARY: &str = "Waiting for secondary broker";
pub const SECONDARY_MUST_INVITE_SELLER: &str = "Secondary broker must invite seller";
pub const SECONDARY_MUST_INVITE_BUYER: &str = "Secondary broker must invite buyer";

/// List entry for one transaction, from a given user's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub stage: Stage,
    pub stage_updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub core: CoreFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub my_role: Option<ParticipantRole>,
    pub pending_invites_count: usize,
    pub required_next_action: Option<String>,
}

impl TransactionSummary {
    pub fn for_user(record: &TransactionRecord, user: UserId) -> Self {
        let tx = record.transaction();
        Self {
            id: tx.id,
            kind: tx.kind,
            status: tx.status,
            stage: tx.stage,
            stage_updated_at: tx.stage_updated_at,
            core: tx.core.clone(),
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            my_role: record
                .participants()
                .iter()
                .find(|p| p.is_bound_to(user))
                .map(|p| p.role),
            pending_invites_count: record
                .invitations()
                .iter()
                .filter(|i| i.status == InvitationStatus::Pending)
                .count(),
            required_next_action: required_next_action(record).map(str::to_string),
        }
    }
}

fn required_next_action(record: &TransactionRecord) -> Option<&'static str> {
    if record.transaction().kind != TransactionType::DoubleBrokerSplit {
        return None;
    }
    let secondary_joined = record
        .participant_by_role(ParticipantRole::BrokerSecondary)
        .is_some_and(Participant::has_joined);
    if !secondary_joined {
        return Some(WAITING_FOR_SECONDARY);
    }
    match (
        record.has_role(ParticipantRole::Buyer),
        record.has_role(ParticipantRole::Seller),
    ) {
        (true, false) => Some(SECONDARY_MUST_INVITE_SELLER),
        (false, true) => Some(SECONDARY_MUST_INVITE_BUYER),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub role: ParticipantRole,
    pub user_id: Option<UserId>,
    pub invited_email: String,
    pub invited_by: UserId,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Participant> for ParticipantView {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id,
            role: p.role,
            user_id: p.user_id,
            invited_email: p.invited_email.clone(),
            invited_by: p.invited_by,
            joined_at: p.joined_at,
            created_at: p.created_at,
        }
    }
}

/// Invitation without its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationView {
    pub id: InvitationId,
    pub participant_id: ParticipantId,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl From<&Invitation> for InvitationView {
    fn from(i: &Invitation) -> Self {
        Self {
            id: i.id,
            participant_id: i.participant_id,
            status: i.status,
            created_at: i.created_at,
            expires_at: i.expires_at,
            responded_at: i.responded_at,
        }
    }
}

/// Full detail of one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub participants: Vec<ParticipantView>,
    pub invitations: Vec<InvitationView>,
    pub details: DetailsPayload,
    pub commission_split: Option<CommissionSplit>,
    pub events: Vec<TransactionEvent>,
}

impl From<&TransactionRecord> for TransactionView {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            transaction: record.transaction().clone(),
            participants: record.participants().iter().map(ParticipantView::from).collect(),
            invitations: record.invitations().iter().map(InvitationView::from).collect(),
            details: record.details().data.clone(),
            commission_split: record.commission_split().copied(),
            events: record.events().to_vec(),
        }
    }
}
