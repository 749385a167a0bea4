//! Stage evaluation.

use chrono::{DateTime, Utc};
use serde_json::json;

use dealroom_core::UserId;

use crate::event_log::TransactionEventType;
use crate::model::{
    Invitation, InvitationStatus, Participant, ParticipantRole, Stage, Transaction,
    TransactionRecord, TransactionType,
};

const BASE_REQUIRED: [ParticipantRole; 3] = [
    ParticipantRole::BrokerPrimary,
    ParticipantRole::Buyer,
    ParticipantRole::Seller,
];

/// Roles that must be filled and accepted before a transaction leaves
/// `pending_invitations`.
pub fn required_roles(kind: TransactionType) -> Vec<ParticipantRole> {
    let mut roles = BASE_REQUIRED.to_vec();
    if kind == TransactionType::DoubleBrokerSplit {
        roles.push(ParticipantRole::BrokerSecondary);
    }
    roles
}

/// A participant counts as accepted when bound, joined, and its invitation
/// (if one exists) is accepted.
fn is_accepted(participant: &Participant, invitations: &[Invitation]) -> bool {
    if !participant.has_joined() {
        return false;
    }
    invitations
        .iter()
        .find(|i| i.participant_id == participant.id)
        .is_none_or(|i| i.status == InvitationStatus::Accepted)
}

/// Canonical stage for the given state. Pure.
pub fn evaluate_stage(
    transaction: &Transaction,
    participants: &[Participant],
    invitations: &[Invitation],
) -> Stage {
    let present = |role: ParticipantRole| participants.iter().any(|p| p.role == role);

    if transaction.kind == TransactionType::DoubleBrokerSplit
        && !(present(ParticipantRole::Buyer) && present(ParticipantRole::Seller))
    {
        return Stage::PendingInvitations;
    }

    let all_accepted = required_roles(transaction.kind).into_iter().all(|role| {
        participants
            .iter()
            .any(|p| p.role == role && is_accepted(p, invitations))
    });

    if all_accepted {
        Stage::PendingUserInformation
    } else {
        Stage::PendingInvitations
    }
}

impl TransactionRecord {
    /// Stage the record would have if recomputed now.
    pub fn computed_stage(&self) -> Stage {
        evaluate_stage(&self.transaction, &self.participants, &self.invitations)
    }

    /// Recompute and store the stage. Logs `stage_changed` only on an actual change.
    ///
    /// Returns whether the stage changed.
    pub(crate) fn recalc_stage(&mut self, actor: Option<UserId>, now: DateTime<Utc>) -> bool {
        let from = self.transaction.stage;
        let to = self.computed_stage();
        if from == to {
            return false;
        }

        self.transaction.stage = to;
        self.transaction.stage_updated_at = Some(now);
        self.transaction.updated_at = now;
        self.log_event(
            TransactionEventType::StageChanged,
            actor,
            json!({ "from": from.as_str(), "to": to.as_str() }),
            now,
        );
        tracing::info!(
            transaction_id = %self.transaction.id,
            from = %from,
            to = %to,
            "transaction stage changed"
        );
        true
    }
}
