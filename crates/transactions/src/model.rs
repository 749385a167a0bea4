//! Transaction row tree: plain data records plus the aggregate that owns them.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use dealroom_core::{
    AggregateRoot, DomainError, InvitationId, Money, ParticipantId, TransactionId, UserId,
};

use crate::event_log::{TransactionEvent, TransactionEventType};

/// Kind of brokerage deal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    SingleBrokerSale,
    DoubleBrokerSplit,
    DueDiligence,
    HiddenDefects,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::SingleBrokerSale,
        TransactionType::DoubleBrokerSplit,
        TransactionType::DueDiligence,
        TransactionType::HiddenDefects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::SingleBrokerSale => "single_broker_sale",
            TransactionType::DoubleBrokerSplit => "double_broker_split",
            TransactionType::DueDiligence => "due_diligence",
            TransactionType::HiddenDefects => "hidden_defects",
        }
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::invalid_field("type", format!("unknown transaction type '{s}'")))
    }
}

impl core::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse lifecycle marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Draft,
    Inviting,
    Active,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Draft => "draft",
            TransactionStatus::Inviting => "inviting",
            TransactionStatus::Active => "active",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

/// Derived workflow position. Recomputed, never set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    PendingInvitations,
    PendingUserInformation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PendingInvitations => "pending_invitations",
            Stage::PendingUserInformation => "pending_user_information",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role slot on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    BrokerPrimary,
    BrokerSecondary,
    Buyer,
    Seller,
    Other,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::BrokerPrimary => "broker_primary",
            ParticipantRole::BrokerSecondary => "broker_secondary",
            ParticipantRole::Buyer => "buyer",
            ParticipantRole::Seller => "seller",
            ParticipantRole::Other => "other",
        }
    }
}

impl core::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
            InvitationStatus::Revoked => "revoked",
        }
    }
}

/// Core deal fields captured at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreFields {
    pub title: String,
    pub property_description: String,
    pub purchase_price: Money,
    pub earnest_deposit: Money,
    pub due_diligence_end_date: NaiveDate,
    pub estimated_closing_date: NaiveDate,
    #[serde(default)]
    pub depositor_name: Option<String>,
    #[serde(default)]
    pub property_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: TransactionStatus,
    pub stage: Stage,
    pub stage_updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub core: CoreFields,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub transaction_id: TransactionId,
    pub role: ParticipantRole,
    /// Bound user; `None` until the invitation is accepted.
    pub user_id: Option<UserId>,
    pub invited_email: String,
    pub invited_by: UserId,
    pub joined_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Bound to a user and joined. Does not look at the invitation.
    pub fn has_joined(&self) -> bool {
        self.user_id.is_some() && self.joined_at.is_some()
    }

    pub fn is_bound_to(&self, user: UserId) -> bool {
        self.user_id == Some(user)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub transaction_id: TransactionId,
    pub participant_id: ParticipantId,
    pub token: String,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn is_pending(&self) -> bool {
        self.status == InvitationStatus::Pending
    }

    /// Strictly past expiry; an invitation is still usable at `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Commission percentages for a double-broker split. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSplit {
    primary_broker_pct: u8,
    secondary_broker_pct: u8,
}

impl Default for CommissionSplit {
    fn default() -> Self {
        Self {
            primary_broker_pct: 50,
            secondary_broker_pct: 50,
        }
    }
}

impl CommissionSplit {
    pub fn new(primary_broker_pct: u8, secondary_broker_pct: u8) -> Result<Self, DomainError> {
        let split = Self {
            primary_broker_pct,
            secondary_broker_pct,
        };
        split.check()?;
        Ok(split)
    }

    pub fn primary_broker_pct(&self) -> u8 {
        self.primary_broker_pct
    }

    pub fn secondary_broker_pct(&self) -> u8 {
        self.secondary_broker_pct
    }

    pub(crate) fn check(&self) -> Result<(), DomainError> {
        let total = u16::from(self.primary_broker_pct) + u16::from(self.secondary_broker_pct);
        if total != 100 {
            return Err(DomainError::invalid_field(
                "commission_split",
                format!("percentages must sum to 100 (got {total})"),
            ));
        }
        Ok(())
    }
}

/// Open key/value payload of deal-specific attributes.
///
/// Schema-less: anything not modelled as a first-class field lives here.
pub type DetailsPayload = serde_json::Map<String, JsonValue>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub data: DetailsPayload,
}

/// Aggregate root: a transaction and everything it owns.
///
/// Fields are private; state changes go through the lifecycle methods in
/// [`crate::lifecycle`] so every change is validated and logged the same way.
/// Dropping the record drops its participants, invitations, details, split and
/// events with it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub(crate) transaction: Transaction,
    pub(crate) participants: Vec<Participant>,
    pub(crate) invitations: Vec<Invitation>,
    pub(crate) details: TransactionDetails,
    pub(crate) commission_split: Option<CommissionSplit>,
    pub(crate) events: Vec<TransactionEvent>,
    pub(crate) version: u64,
}

impl TransactionRecord {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn invitations(&self) -> &[Invitation] {
        &self.invitations
    }

    pub fn details(&self) -> &TransactionDetails {
        &self.details
    }

    pub fn commission_split(&self) -> Option<&CommissionSplit> {
        self.commission_split.as_ref()
    }

    /// Event log, in append order.
    pub fn events(&self) -> &[TransactionEvent] {
        &self.events
    }

    pub fn events_of_type(&self, event_type: TransactionEventType) -> impl Iterator<Item = &TransactionEvent> {
        self.events.iter().filter(move |e| e.event_type == event_type)
    }

    pub fn participant_by_role(&self, role: ParticipantRole) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role == role)
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn has_role(&self, role: ParticipantRole) -> bool {
        self.participant_by_role(role).is_some()
    }

    pub fn invitation_for(&self, participant_id: ParticipantId) -> Option<&Invitation> {
        self.invitations.iter().find(|i| i.participant_id == participant_id)
    }

    pub fn invitation_by_token(&self, token: &str) -> Option<&Invitation> {
        self.invitations.iter().find(|i| i.token == token)
    }

    pub fn invitation(&self, id: InvitationId) -> Option<&Invitation> {
        self.invitations.iter().find(|i| i.id == id)
    }

    /// Tokens owned by this record (for the store's global uniqueness index).
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.invitations.iter().map(|i| i.token.as_str())
    }

    /// Creator, or a user bound to one of the participant slots.
    ///
    /// An invited user becomes able to see the transaction only after accepting.
    pub fn is_visible_to(&self, user: UserId) -> bool {
        self.transaction.created_by == user || self.participants.iter().any(|p| p.is_bound_to(user))
    }

    /// Used by stores after a successful commit.
    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub(crate) fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub(crate) fn invitation_mut(&mut self, id: InvitationId) -> Option<&mut Invitation> {
        self.invitations.iter_mut().find(|i| i.id == id)
    }
}

impl AggregateRoot for TransactionRecord {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.transaction.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
