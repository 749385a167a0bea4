//! Lifecycle decisions: opening a transaction, inviting the counterparty and
//! accepting invitations.
//!
//! Every method here works on a private copy of a [`TransactionRecord`]; the
//! orchestrator in `dealroom-infra` validates and commits the result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use dealroom_auth::{Actor, require_broker};
use dealroom_core::{DomainError, DomainResult, ParticipantId, TransactionId};

use crate::event_log::TransactionEventType;
use crate::invitation::InvitationPolicy;
use crate::model::{
    CommissionSplit, CoreFields, DetailsPayload, Invitation, InvitationStatus, Participant,
    ParticipantRole, Stage, Transaction, TransactionDetails, TransactionRecord,
    TransactionStatus, TransactionType,
};
use crate::stage::required_roles;
use crate::validation::validate_email;

/// Input for opening a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTransaction {
    /// Transaction type as supplied by the caller; parsed during `open`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub core: CoreFields,
    /// Type-specific inputs (party emails, commission split) plus any free-form
    /// attributes. Stored verbatim as the transaction details.
    #[serde(default)]
    pub payload: DetailsPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterpartyInvited {
    pub participant: Participant,
    pub invitation: Invitation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedInvitation {
    pub transaction: Transaction,
    pub participant: Participant,
}

/// A participant slot to create at opening time.
struct Slot {
    role: ParticipantRole,
    email: String,
}

fn required_str<'a>(payload: &'a DetailsPayload, key: &str) -> DomainResult<&'a str> {
    payload
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DomainError::invalid_field(key, format!("{key} is required")))
}

fn pct(value: Option<&JsonValue>, key: &str) -> DomainResult<u8> {
    let parsed = match value {
        Some(JsonValue::Number(n)) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Some(JsonValue::String(s)) => s.trim().parse::<u8>().ok(),
        _ => None,
    };
    parsed.filter(|v| *v <= 100).ok_or_else(|| {
        DomainError::invalid_field(
            "commission_split",
            format!("{key} must be a whole number between 0 and 100"),
        )
    })
}

fn commission_split(payload: &DetailsPayload) -> DomainResult<CommissionSplit> {
    match payload.get("commission_split") {
        None | Some(JsonValue::Null) => Ok(CommissionSplit::default()),
        Some(JsonValue::Object(split)) => CommissionSplit::new(
            pct(split.get("primary_broker_pct"), "primary_broker_pct")?,
            pct(split.get("secondary_broker_pct"), "secondary_broker_pct")?,
        ),
        Some(_) => Err(DomainError::invalid_field(
            "commission_split",
            "commission_split must be an object",
        )),
    }
}

/// Invited parties for the given type, excluding the primary broker.
fn plan_slots(
    kind: TransactionType,
    payload: &DetailsPayload,
) -> DomainResult<(Vec<Slot>, Option<CommissionSplit>)> {
    match kind {
        TransactionType::SingleBrokerSale => {
            let buyer = validate_email("buyer_email", required_str(payload, "buyer_email")?)?;
            let seller = validate_email("seller_email", required_str(payload, "seller_email")?)?;
            Ok((
                vec![
                    Slot {
                        role: ParticipantRole::Buyer,
                        email: buyer,
                    },
                    Slot {
                        role: ParticipantRole::Seller,
                        email: seller,
                    },
                ],
                None,
            ))
        }
        TransactionType::DoubleBrokerSplit => {
            let known_role = match payload.get("known_party_role").and_then(JsonValue::as_str) {
                Some("buyer") => ParticipantRole::Buyer,
                Some("seller") => ParticipantRole::Seller,
                _ => {
                    return Err(DomainError::invalid_field(
                        "known_party_role",
                        "known_party_role must be buyer or seller",
                    ));
                }
            };
            let known = validate_email("known_party_email", required_str(payload, "known_party_email")?)?;
            let secondary = validate_email(
                "secondary_broker_email",
                required_str(payload, "secondary_broker_email")?,
            )?;
            let split = commission_split(payload)?;
            Ok((
                vec![
                    Slot {
                        role: ParticipantRole::BrokerSecondary,
                        email: secondary,
                    },
                    Slot {
                        role: known_role,
                        email: known,
                    },
                ],
                Some(split),
            ))
        }
        TransactionType::DueDiligence | TransactionType::HiddenDefects => Ok((Vec::new(), None)),
    }
}

impl TransactionRecord {
    /// Build a new transaction with its initial participants and invitations.
    ///
    /// Nothing is persisted here; the returned record is committed as one unit.
    pub fn open(
        creator: &Actor,
        request: &CreateTransaction,
        policy: &InvitationPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        require_broker(creator, "only brokers can create transactions")?;
        let kind: TransactionType = request.kind.trim().parse()?;
        request.core.validate()?;
        let (slots, split) = plan_slots(kind, &request.payload)?;

        let id = TransactionId::new();
        let mut record = TransactionRecord {
            transaction: Transaction {
                id,
                kind,
                status: TransactionStatus::Draft,
                stage: Stage::PendingInvitations,
                stage_updated_at: None,
                core: request.core.clone(),
                created_by: creator.id,
                created_at: now,
                updated_at: now,
            },
            participants: vec![Participant {
                id: ParticipantId::new(),
                transaction_id: id,
                role: ParticipantRole::BrokerPrimary,
                user_id: Some(creator.id),
                invited_email: creator.email.clone(),
                invited_by: creator.id,
                joined_at: Some(now),
                created_at: now,
            }],
            invitations: Vec::new(),
            details: TransactionDetails {
                data: request.payload.clone(),
            },
            commission_split: split,
            events: Vec::new(),
            version: 0,
        };

        for slot in slots {
            let participant_id = record.add_participant(slot.role, slot.email, creator, now);
            record.issue_invitation(participant_id, creator.id, policy, now)?;
        }

        if record.participants.len() > 1 {
            record.transaction.status = TransactionStatus::Inviting;
        }
        record.recalc_stage(Some(creator.id), now);

        tracing::info!(
            transaction_id = %id,
            kind = %kind,
            status = record.transaction.status.as_str(),
            stage = %record.transaction.stage,
            "transaction opened"
        );
        Ok(record)
    }

    /// Secondary broker invites the missing buyer or seller of a double split.
    pub fn invite_counterparty(
        &mut self,
        actor: &Actor,
        counterparty_email: &str,
        policy: &InvitationPolicy,
        now: DateTime<Utc>,
    ) -> DomainResult<CounterpartyInvited> {
        if self.transaction.kind != TransactionType::DoubleBrokerSplit {
            return Err(DomainError::invalid(
                "counterparty invitations only apply to double broker split transactions",
            ));
        }
        let secondary = self
            .participant_by_role(ParticipantRole::BrokerSecondary)
            .ok_or_else(|| DomainError::invalid("transaction has no secondary broker"))?;
        if !(secondary.is_bound_to(actor.id) && secondary.joined_at.is_some()) {
            return Err(DomainError::forbidden(
                "only the joined secondary broker can invite the counterparty",
            ));
        }

        let has_buyer = self.has_role(ParticipantRole::Buyer);
        if has_buyer && self.has_role(ParticipantRole::Seller) {
            return Err(DomainError::invalid_state("all parties already present"));
        }
        let email = validate_email("counterparty_email", counterparty_email)?;
        let role = if has_buyer {
            ParticipantRole::Seller
        } else {
            ParticipantRole::Buyer
        };

        let participant_id = self.add_participant(role, email.clone(), actor, now);
        self.log_event(
            TransactionEventType::CounterpartyInvited,
            Some(actor.id),
            json!({ "invited_email": email, "role": role.as_str() }),
            now,
        );
        let invitation = self.issue_invitation(participant_id, actor.id, policy, now)?;
        self.transaction.updated_at = now;
        self.recalc_stage(Some(actor.id), now);

        let participant = self
            .participant(participant_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("participant {participant_id}")))?;
        tracing::info!(transaction_id = %self.transaction.id, role = %role, "counterparty invited");
        Ok(CounterpartyInvited {
            participant,
            invitation,
        })
    }

    /// Bind `user` to the participant behind `token`.
    ///
    /// On `Expired` the record has already been updated (invitation marked
    /// expired) and should still be persisted by the caller.
    pub fn accept_invitation(
        &mut self,
        token: &str,
        user: &Actor,
        now: DateTime<Utc>,
    ) -> DomainResult<AcceptedInvitation> {
        let invitation_id = self.resolve_invitation(token, now)?;
        let participant_id = self
            .invitation(invitation_id)
            .map(|i| i.participant_id)
            .ok_or_else(|| DomainError::not_found("invitation"))?;
        let role = self
            .participant(participant_id)
            .map(|p| p.role)
            .ok_or_else(|| DomainError::not_found(format!("participant {participant_id}")))?;

        if role == ParticipantRole::BrokerSecondary {
            require_broker(user, "only brokers can accept a secondary broker invitation")?;
        }

        let invited_email = match self.participant_mut(participant_id) {
            Some(participant) => {
                participant.user_id = Some(user.id);
                participant.joined_at = Some(now);
                participant.invited_email.clone()
            }
            None => return Err(DomainError::not_found(format!("participant {participant_id}"))),
        };
        if let Some(invitation) = self.invitation_mut(invitation_id) {
            invitation.status = InvitationStatus::Accepted;
            invitation.responded_at = Some(now);
        }
        self.transaction.updated_at = now;
        self.log_event(
            TransactionEventType::InvitationAccepted,
            Some(user.id),
            json!({ "participant_role": role.as_str(), "email": invited_email }),
            now,
        );

        if self.transaction.status == TransactionStatus::Inviting && self.required_roles_joined() {
            self.transaction.status = TransactionStatus::Active;
            tracing::info!(transaction_id = %self.transaction.id, status = "active", "all required parties joined");
        }
        self.recalc_stage(Some(user.id), now);

        let participant = self
            .participant(participant_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("participant {participant_id}")))?;
        tracing::info!(transaction_id = %self.transaction.id, role = %role, "invitation accepted");
        Ok(AcceptedInvitation {
            transaction: self.transaction.clone(),
            participant,
        })
    }

    /// Shallow-merge keys into the details payload.
    pub fn merge_details(&mut self, actor: &Actor, patch: DetailsPayload, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.is_visible_to(actor.id) {
            return Err(DomainError::forbidden(
                "only the creator or a joined participant can update details",
            ));
        }
        self.details.data.extend(patch);
        self.transaction.updated_at = now;
        Ok(())
    }

    fn required_roles_joined(&self) -> bool {
        required_roles(self.transaction.kind)
            .into_iter()
            .all(|role| self.participant_by_role(role).is_some_and(Participant::has_joined))
    }

    fn add_participant(
        &mut self,
        role: ParticipantRole,
        email: String,
        invited_by: &Actor,
        now: DateTime<Utc>,
    ) -> ParticipantId {
        let id = ParticipantId::new();
        self.participants.push(Participant {
            id,
            transaction_id: self.transaction.id,
            role,
            user_id: None,
            invited_email: email,
            invited_by: invited_by.id,
            joined_at: None,
            created_at: now,
        });
        id
    }
}
