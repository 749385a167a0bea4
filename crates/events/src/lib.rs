//! `dealroom-events`: event mechanics shared by the domain and infra layers.
//!
//! Domain-agnostic: the lifecycle event vocabulary lives in
//! `dealroom-transactions`; this crate only knows how events are wrapped
//! and fanned out.

pub mod bus;
pub mod envelope;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
