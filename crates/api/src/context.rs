use tokengate_auth::SessionClaims;
use tokengate_core::UserId;

/// Authenticated session for a request.
///
/// Inserted by the guard middleware; present on every guarded route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    claims: SessionClaims,
}

impl SessionContext {
    pub fn new(claims: SessionClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> UserId {
        self.claims.sub
    }

    pub fn is_root(&self) -> bool {
        self.claims.is_root
    }
}
