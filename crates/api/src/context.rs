use dealroom_auth::Actor;
use dealroom_core::UserId;

/// Authenticated caller for a request.
///
/// Inserted by the auth middleware; must be present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    actor: Actor,
}

impl ActorContext {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn user_id(&self) -> UserId {
        self.actor.id
    }
}
