use std::future::Future;

use super::types::{NewSession, PendingAuthRequest, Session};
use crate::types::SessionId;

/// Boxed error returned by store implementations.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Persistence for in-flight authorization requests.
///
/// # Example
///
/// ```rust,ignore
/// impl PendingRequestStore for PgPending {
///     async fn take(&self, state: &str) -> Result<Option<PendingAuthRequest>, StoreError> {
///         // DELETE ... WHERE state = $1 RETURNING ...
///         self.db.delete_returning(state).await
///     }
///     // ...
/// }
/// ```
pub trait PendingRequestStore: Send + Sync + 'static {
    /// Persist a freshly issued request.
    fn insert(
        &self,
        request: PendingAuthRequest,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Atomically find and invalidate the request for `state`.
    ///
    /// Of two concurrent calls with the same `state`, at most one may observe
    /// `Some`. Expired entries may be returned; callers reject them.
    fn take(
        &self,
        state: &str,
    ) -> impl Future<Output = Result<Option<PendingAuthRequest>, StoreError>> + Send;

    /// Remove expired entries. Returns how many were dropped.
    fn purge_expired(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Persistence for authenticated sessions. Read-mostly.
pub trait SessionStore: Send + Sync + 'static {
    /// Persist a new session and assign it an unguessable id.
    fn create(
        &self,
        session: NewSession,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    /// Look up a session by id. Expired sessions may be returned; callers reject them.
    fn find(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Delete a session (logout).
    fn delete(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Remove expired sessions. Returns how many were dropped.
    fn purge_expired(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
