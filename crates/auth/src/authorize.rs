use dealroom_core::{DomainError, DomainResult};

use crate::Actor;

/// Capabilities the lifecycle core checks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// May open transactions and act as a secondary broker.
    Broker,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Broker => "broker",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check that an actor holds a capability.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(actor: &Actor, required: Capability) -> DomainResult<()> {
    let granted = match required {
        Capability::Broker => actor.is_broker,
    };

    if granted {
        Ok(())
    } else {
        tracing::debug!(user_id = %actor.id, capability = %required, "capability check denied");
        Err(DomainError::forbidden(format!(
            "missing capability '{required}'"
        )))
    }
}

/// Shorthand for the broker capability with a caller-provided reason.
pub fn require_broker(actor: &Actor, reason: &str) -> DomainResult<()> {
    authorize(actor, Capability::Broker).map_err(|_| DomainError::forbidden(reason))
}
