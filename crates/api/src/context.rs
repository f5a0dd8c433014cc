use warden_auth::ResolvedIdentity;
use warden_core::UserId;

/// Caller context for a request (authenticated identity + roles).
///
/// Inserted by the authentication middleware; present on every protected route.
#[derive(Debug, Clone)]
pub struct CallerContext {
    identity: ResolvedIdentity,
}

impl CallerContext {
    pub fn new(identity: ResolvedIdentity) -> Self {
        Self { identity }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id()
    }

    pub fn identity(&self) -> &ResolvedIdentity {
        &self.identity
    }
}
