use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::traits::{PendingRequestStore, SessionStore, StoreError};
use super::types::{NewSession, PendingAuthRequest, Session};
use crate::pkce;
use crate::types::SessionId;

/// Upper bound on in-flight logins held by [`MemoryPendingStore::new`].
pub const DEFAULT_PENDING_CAPACITY: usize = 10_000;

/// In-process pending-request store. `take` is a single locked `remove`.
///
/// Holds at most `capacity` requests. A full store drops expired entries
/// first; if it is still full, `insert` fails and the login answers 500.
/// Production deployments should back [`PendingRequestStore`] with a database.
#[derive(Debug)]
pub struct MemoryPendingStore {
    entries: Mutex<HashMap<String, PendingAuthRequest>>,
    capacity: usize,
}

impl Default for MemoryPendingStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_PENDING_CAPACITY)
    }
}

impl MemoryPendingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding at most `capacity` pending requests (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl PendingRequestStore for MemoryPendingStore {
    async fn insert(&self, request: PendingAuthRequest) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            let now = OffsetDateTime::now_utc();
            entries.retain(|_, pending| !pending.is_expired_at(now));
        }
        if entries.len() >= self.capacity {
            return Err(format!("pending request store full ({} entries)", self.capacity).into());
        }
        entries.insert(request.state.clone(), request);
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<PendingAuthRequest>, StoreError> {
        Ok(self.entries.lock().await.remove(state))
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, request| !request.is_expired_at(now));
        Ok(before - entries.len())
    }
}

/// In-process session store. Lookups share a read lock.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        let id = loop {
            let candidate = SessionId(pkce::generate_session_id());
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Session {
            id: id.clone(),
            subject: session.subject,
            claims: session.claims,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        };
        sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn find(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        Ok(before - sessions.len())
    }
}

/// Smallest sweep period; `every` below this is raised to it.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Periodically drop expired pending requests and sessions.
///
/// The sweep only removes entries; request handling never waits on it.
/// A zero `every` is clamped to [`MIN_SWEEP_INTERVAL`].
pub fn spawn_sweeper<P, S>(pending: Arc<P>, sessions: Arc<S>, every: Duration) -> JoinHandle<()>
where
    P: PendingRequestStore,
    S: SessionStore,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(MIN_SWEEP_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match pending.purge_expired().await {
                Ok(0) => {}
                Ok(dropped) => tracing::debug!(dropped, "Purged expired pending requests"),
                Err(e) => tracing::warn!(error = %e, "Pending request sweep failed"),
            }
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(dropped) => tracing::debug!(dropped, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Claims, ReturnTo, Subject};
    use time::Duration as TimeDuration;

    fn pending(state: &str, ttl: TimeDuration) -> PendingAuthRequest {
        let now = OffsetDateTime::now_utc();
        PendingAuthRequest {
            state: state.into(),
            nonce: "nonce".into(),
            pkce_verifier: "verifier".into(),
            return_to: ReturnTo::root(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    fn new_session(ttl: TimeDuration) -> NewSession {
        let now = OffsetDateTime::now_utc();
        NewSession {
            subject: Subject("auth0|1".into()),
            claims: Claims::new(),
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn take_consumes_exactly_once() {
        let store = MemoryPendingStore::new();
        store.insert(pending("s1", TimeDuration::minutes(5))).await.unwrap();

        assert!(store.take("s1").await.unwrap().is_some());
        assert!(store.take("s1").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_take_has_single_winner() {
        let store = Arc::new(MemoryPendingStore::new());
        store.insert(pending("race", TimeDuration::minutes(5))).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take("race").await.unwrap().is_some() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn purge_drops_only_expired_pending() {
        let store = MemoryPendingStore::new();
        store.insert(pending("old", TimeDuration::seconds(-1))).await.unwrap();
        store.insert(pending("new", TimeDuration::minutes(5))).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert!(store.take("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let store = MemorySessionStore::new();
        let session = store.create(new_session(TimeDuration::hours(1))).await.unwrap();

        let found = store.find(&session.id).await.unwrap().unwrap();
        assert_eq!(found.subject, Subject("auth0|1".into()));

        store.delete(&session.id).await.unwrap();
        assert!(store.find(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_ids_are_distinct() {
        let store = MemorySessionStore::new();
        let a = store.create(new_session(TimeDuration::hours(1))).await.unwrap();
        let b = store.create(new_session(TimeDuration::hours(1))).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn sweeper_removes_expired_entries() {
        let pending_store = Arc::new(MemoryPendingStore::new());
        let session_store = Arc::new(MemorySessionStore::new());
        pending_store
            .insert(pending("stale", TimeDuration::seconds(-1)))
            .await
            .unwrap();
        session_store
            .create(new_session(TimeDuration::seconds(-1)))
            .await
            .unwrap();
        session_store
            .create(new_session(TimeDuration::hours(1)))
            .await
            .unwrap();

        let handle = spawn_sweeper(
            pending_store.clone(),
            session_store.clone(),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(pending_store.is_empty().await);
        assert_eq!(session_store.len().await, 1);
    }

    #[tokio::test]
    async fn sweeper_accepts_zero_interval() {
        let pending_store = Arc::new(MemoryPendingStore::new());
        let session_store = Arc::new(MemorySessionStore::new());
        pending_store
            .insert(pending("stale", TimeDuration::seconds(-1)))
            .await
            .unwrap();

        let handle = spawn_sweeper(pending_store.clone(), session_store, Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_finished());
        handle.abort();
        let err = handle.await.unwrap_err();
        assert!(err.is_cancelled());

        assert!(pending_store.is_empty().await);
    }

    #[tokio::test]
    async fn full_pending_store_rejects_new_logins() {
        let store = MemoryPendingStore::with_capacity(2);
        store.insert(pending("a", TimeDuration::minutes(5))).await.unwrap();
        store.insert(pending("b", TimeDuration::minutes(5))).await.unwrap();

        assert!(store.insert(pending("c", TimeDuration::minutes(5))).await.is_err());
        assert_eq!(store.len().await, 2);
        assert!(store.take("c").await.unwrap().is_none());

        assert!(store.take("a").await.unwrap().is_some());
        store.insert(pending("c", TimeDuration::minutes(5))).await.unwrap();
    }

    #[tokio::test]
    async fn full_pending_store_evicts_expired_first() {
        let store = MemoryPendingStore::with_capacity(2);
        store.insert(pending("stale", TimeDuration::seconds(-1))).await.unwrap();
        store.insert(pending("live", TimeDuration::minutes(5))).await.unwrap();

        store.insert(pending("next", TimeDuration::minutes(5))).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.take("stale").await.unwrap().is_none());
        assert!(store.take("live").await.unwrap().is_some());
    }
}
