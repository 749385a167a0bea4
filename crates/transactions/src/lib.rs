//! Transactions domain module (brokerage deal lifecycle).
//!
//! This crate contains the business rules for transactions, participants and
//! invitations, implemented purely as deterministic domain logic (no IO, no HTTP,
//! no storage). Persistence, retries and publication live in `dealroom-infra`.

pub mod event_log;
pub mod invitation;
pub mod lifecycle;
pub mod model;
pub mod stage;
pub mod summary;
pub mod validation;

pub use event_log::{TransactionEvent, TransactionEventType};
pub use invitation::{INVITE_EXPIRY_DAYS, InvitationPolicy, generate_token};
pub use lifecycle::{AcceptedInvitation, CounterpartyInvited, CreateTransaction};
pub use model::{
    CommissionSplit, CoreFields, DetailsPayload, Invitation, InvitationStatus, Participant,
    ParticipantRole, Stage, Transaction, TransactionDetails, TransactionRecord,
    TransactionStatus, TransactionType,
};
pub use stage::{evaluate_stage, required_roles};
pub use summary::{InvitationView, ParticipantView, TransactionSummary, TransactionView};
