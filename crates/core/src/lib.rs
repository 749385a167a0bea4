//! `dealroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the error taxonomy, money, and the clock abstraction.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod id;
pub mod money;

pub use aggregate::{AggregateRoot, ExpectedVersion};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{EventId, InvitationId, ParticipantId, TransactionId, UserId};
pub use money::Money;
