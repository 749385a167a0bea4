//! Lifecycle service configuration.

use chrono::Duration;

use dealroom_transactions::{INVITE_EXPIRY_DAYS, InvitationPolicy};

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// How long an invitation stays acceptable.
    pub invitation_ttl: Duration,
    /// Commit attempts per operation before a version conflict is surfaced.
    pub max_commit_attempts: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            invitation_ttl: Duration::days(INVITE_EXPIRY_DAYS),
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
        }
    }
}

impl LifecycleConfig {
    pub fn with_invitation_ttl_days(mut self, days: i64) -> Self {
        self.invitation_ttl = Duration::days(days);
        self
    }

    pub fn invitation_policy(&self) -> InvitationPolicy {
        InvitationPolicy::with_ttl(self.invitation_ttl)
    }
}
