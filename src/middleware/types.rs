use time::OffsetDateTime;

use crate::types::{Claims, ReturnTo, SessionId, Subject};

/// Authorization-flow state remembered between `/auth/login` and `/auth/callback`.
///
/// Keyed by `state`; single use. Once taken from the store it can never be matched again.
#[derive(Debug, Clone)]
pub struct PendingAuthRequest {
    pub state: String,
    pub nonce: String,
    pub pkce_verifier: String,
    pub return_to: ReturnTo,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl PendingAuthRequest {
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

/// Session data from a successful code exchange, handed to
/// [`SessionStore::create`](super::SessionStore::create) which assigns the id.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub subject: Subject,
    pub claims: Claims,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// An authenticated session. Immutable once created.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub subject: Subject,
    pub claims: Claims,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

impl Session {
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}
