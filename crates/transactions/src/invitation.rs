//! Invitation issuance and token resolution.

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde_json::json;

use dealroom_core::{DomainError, DomainResult, InvitationId, ParticipantId, UserId};

use crate::event_log::TransactionEventType;
use crate::model::{Invitation, InvitationStatus, TransactionRecord};

pub const INVITE_EXPIRY_DAYS: i64 = 7;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvitationPolicy {
    pub ttl: Duration,
}

impl Default for InvitationPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::days(INVITE_EXPIRY_DAYS),
        }
    }
}

impl InvitationPolicy {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }
}

/// Fresh unguessable invitation token: 32 bytes from the OS CSPRNG, hex-encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl TransactionRecord {
    /// Issue a pending invitation for a participant and log `invitation_sent`.
    pub(crate) fn issue_invitation(
        &mut self,
        participant_id: ParticipantId,
        actor: UserId,
        policy: &InvitationPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<Invitation> {
        let participant = self
            .participant(participant_id)
            .ok_or_else(|| DomainError::not_found(format!("participant {participant_id}")))?;
        if self.invitation_for(participant_id).is_some() {
            return Err(DomainError::invalid_state(format!(
                "participant {participant_id} already has an invitation"
            )));
        }
        let role = participant.role;
        let invited_email = participant.invited_email.clone();

        let invitation = Invitation {
            id: InvitationId::new(),
            transaction_id: self.transaction.id,
            participant_id,
            token: generate_token(),
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: policy.expires_at(now),
            responded_at: None,
        };
        self.invitations.push(invitation.clone());
        self.log_event(
            TransactionEventType::InvitationSent,
            Some(actor),
            json!({ "participant_role": role.as_str(), "invited_email": invited_email }),
            now,
        );
        tracing::debug!(
            transaction_id = %self.transaction.id,
            role = %role,
            "invitation issued"
        );
        Ok(invitation)
    }

    /// Resolve a token to a usable pending invitation.
    ///
    /// A pending invitation found past its expiry is marked `expired` on the record
    /// before `Expired` is returned; callers persist that change.
    pub(crate) fn resolve_invitation(&mut self, token: &str, now: DateTime<Utc>) -> DomainResult<InvitationId> {
        let invitation = self
            .invitation_by_token(token)
            .ok_or_else(|| DomainError::not_found("invitation"))?;
        if !invitation.is_pending() {
            return Err(DomainError::invalid_state(format!(
                "invitation is {}",
                invitation.status.as_str()
            )));
        }
        let id = invitation.id;
        if invitation.is_expired_at(now) {
            if let Some(invitation) = self.invitation_mut(id) {
                invitation.status = InvitationStatus::Expired;
            }
            self.transaction.updated_at = now;
            tracing::info!(transaction_id = %self.transaction.id, "invitation expired on use");
            return Err(DomainError::Expired);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_64_hex_chars_and_distinct() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn default_policy_is_seven_days() {
        let now = Utc::now();
        assert_eq!(InvitationPolicy::default().expires_at(now), now + Duration::days(7));
    }
}
