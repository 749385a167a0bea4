use serde::{Deserialize, Serialize};

use dealroom_core::UserId;

/// An authenticated user as supplied by the identity provider.
///
/// Construction is decoupled from transport: the HTTP layer builds it from
/// bearer-token claims, tests build it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub email: String,
    pub is_broker: bool,
}

impl Actor {
    pub fn new(id: UserId, email: impl Into<String>, is_broker: bool) -> Self {
        Self {
            id,
            email: normalize_email(&email.into()),
            is_broker,
        }
    }

    /// A broker with a fresh identity.
    pub fn broker(email: impl Into<String>) -> Self {
        Self::new(UserId::new(), email, true)
    }

    /// A non-broker user (buyer, seller, ...) with a fresh identity.
    pub fn user(email: impl Into<String>) -> Self {
        Self::new(UserId::new(), email, false)
    }
}

/// Canonical form used for comparing invited and authenticated emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_on_construction() {
        let actor = Actor::broker("  Broker@Example.COM ");
        assert_eq!(actor.email, "broker@example.com");
        assert!(actor.is_broker);
    }

    #[test]
    fn plain_users_are_not_brokers() {
        assert!(!Actor::user("buyer@example.com").is_broker);
    }
}
