//! Concurrency-safe registry of active sessions.
//!
//! The registry is the only structure mutated from many connection tasks. It
//! maps a [`SessionId`] to the session's state: its turn log and the close
//! signal of the transport carrying it. All create/get/remove operations go
//! through a [`DashMap`] entry, so they are atomic with respect to each other.
//!
//! Each registered session also carries an epoch, unique for the lifetime of
//! the registry. A connection releases its session by handle, which only
//! removes the entry if the epoch still matches; a stale connection can never
//! tear down a newer session that reused its identifier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info};

use postgame_types::chat::{Role, SessionId, Turn};
use postgame_types::config::DuplicateSessionPolicy;
use postgame_types::error::SessionError;

use crate::chat::history::HistoryStore;

/// Shared reference to one registered session.
pub type SessionHandle = Arc<Session>;

/// State of one connected client.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    epoch: u64,
    history: Mutex<HistoryStore>,
    /// Fired when the session is removed or superseded.
    closed: CancellationToken,
}

impl Session {
    fn new(id: SessionId, epoch: u64, max_history_turns: Option<usize>) -> Self {
        Self {
            id,
            epoch,
            history: Mutex::new(HistoryStore::with_cap(max_history_turns)),
            closed: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // Only the owning connection task writes, so the lock is never contended
    // for long. A poisoned lock still holds a consistent append-only log.
    fn history(&self) -> MutexGuard<'_, HistoryStore> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one turn to this session's log.
    pub fn append(&self, role: Role, content: impl Into<String>) {
        self.history().append(role, content);
    }

    /// The most recent `max_turns` turns, oldest first.
    pub fn window(&self, max_turns: usize) -> Vec<Turn> {
        self.history().window(max_turns)
    }

    /// Read the prior window and append `question` as a user turn in one step.
    ///
    /// The returned window does not include `question`.
    pub fn record_question(&self, question: &str, max_turns: usize) -> Vec<Turn> {
        let mut history = self.history();
        let window = history.window(max_turns);
        history.append(Role::User, question);
        window
    }

    pub fn turn_count(&self) -> usize {
        self.history().len()
    }

    /// Signal the transport carrying this session to shut down.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once [`Session::close`] has been called.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }
}

struct RegistryInner {
    sessions: DashMap<SessionId, SessionHandle>,
    next_epoch: AtomicU64,
    policy: DuplicateSessionPolicy,
    max_history_turns: Option<usize>,
}

/// Mapping from session identifier to live session state.
///
/// Cheap to clone; clones share the same map. Construct one per gateway and
/// pass it to whatever needs it.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DuplicateSessionPolicy::default(), None)
    }
}

impl SessionRegistry {
    pub fn new(policy: DuplicateSessionPolicy, max_history_turns: Option<usize>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                sessions: DashMap::new(),
                next_epoch: AtomicU64::new(1),
                policy,
                max_history_turns,
            }),
        }
    }

    pub fn policy(&self) -> DuplicateSessionPolicy {
        self.inner.policy
    }

    /// Register a new session with an empty history.
    ///
    /// If `id` is already active, [`DuplicateSessionPolicy::Reject`] fails
    /// with [`SessionError::Duplicate`]; [`DuplicateSessionPolicy::Replace`]
    /// closes the active session and installs a fresh one in its place.
    pub fn create(&self, id: SessionId) -> Result<SessionHandle, SessionError> {
        let epoch = self.inner.next_epoch.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Session::new(id.clone(), epoch, self.inner.max_history_turns));

        let superseded = match self.inner.sessions.entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&session));
                None
            }
            Entry::Occupied(mut entry) => match self.inner.policy {
                DuplicateSessionPolicy::Reject => {
                    return Err(SessionError::Duplicate(entry.key().to_string()));
                }
                DuplicateSessionPolicy::Replace => Some(entry.insert(Arc::clone(&session))),
            },
        };

        if let Some(old) = superseded {
            old.close();
            info!(
                session_id = %session.id(),
                old_epoch = old.epoch(),
                "Superseded active session with a fresh one"
            );
        }

        Ok(session)
    }

    /// Look up an active session.
    pub fn get(&self, id: &SessionId) -> Result<SessionHandle, SessionError> {
        self.inner
            .sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.inner.sessions.contains_key(id)
    }

    /// Deregister `id` and close its session.
    ///
    /// Idempotent: returns `false` when no session was registered under `id`.
    pub fn remove(&self, id: &SessionId) -> bool {
        match self.inner.sessions.remove(id) {
            Some((_, session)) => {
                session.close();
                debug!(session_id = %id, "Session removed");
                true
            }
            None => false,
        }
    }

    /// Deregister `session` if it is still the registered occupant of its id.
    ///
    /// Always closes `session`. Returns `true` if the registry entry was
    /// removed, `false` if it had already been removed or superseded.
    pub fn release(&self, session: &Session) -> bool {
        session.close();
        self.inner
            .sessions
            .remove_if(session.id(), |_, current| current.epoch() == session.epoch())
            .is_some()
    }

    /// Close and remove every session (used on shutdown).
    pub fn close_all(&self) {
        self.inner.sessions.retain(|_, session| {
            session.close();
            false
        });
    }

    pub fn len(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId::parse(s).unwrap()
    }

    #[test]
    fn test_create_and_get() {
        let registry = SessionRegistry::default();
        let session = registry.create(sid("s1")).unwrap();
        assert_eq!(session.turn_count(), 0);

        let fetched = registry.get(&sid("s1")).unwrap();
        assert!(Arc::ptr_eq(&session, &fetched));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let registry = SessionRegistry::default();
        assert_eq!(
            registry.get(&sid("nope")).unwrap_err(),
            SessionError::NotFound("nope".to_string())
        );
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::default();
        let session = registry.create(sid("s1")).unwrap();
        assert!(registry.remove(&sid("s1")));
        assert!(session.is_closed());
        assert!(!registry.remove(&sid("s1")));
        assert!(!registry.remove(&sid("never")));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reject_policy_refuses_duplicate() {
        let registry = SessionRegistry::new(DuplicateSessionPolicy::Reject, None);
        let first = registry.create(sid("s1")).unwrap();
        first.append(Role::User, "hello");

        let err = registry.create(sid("s1")).unwrap_err();
        assert_eq!(err, SessionError::Duplicate("s1".to_string()));
        assert!(!first.is_closed());
        assert_eq!(registry.get(&sid("s1")).unwrap().turn_count(), 1);
    }

    #[test]
    fn test_replace_policy_resets_history_and_closes_old() {
        let registry = SessionRegistry::new(DuplicateSessionPolicy::Replace, None);
        let first = registry.create(sid("s1")).unwrap();
        first.append(Role::User, "hello");

        let second = registry.create(sid("s1")).unwrap();
        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(second.turn_count(), 0);
        assert_ne!(first.epoch(), second.epoch());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stale_release_does_not_remove_newer_session() {
        let registry = SessionRegistry::default();
        let first = registry.create(sid("s1")).unwrap();
        let second = registry.create(sid("s1")).unwrap();

        assert!(!registry.release(&first));
        assert!(registry.contains(&sid("s1")));

        assert!(registry.release(&second));
        assert!(!registry.contains(&sid("s1")));
    }

    #[test]
    fn test_reuse_after_remove_starts_empty() {
        let registry = SessionRegistry::default();
        let first = registry.create(sid("s1")).unwrap();
        first.append(Role::User, "hello");
        registry.release(&first);

        let again = registry.create(sid("s1")).unwrap();
        assert_eq!(again.turn_count(), 0);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::default();
        let a = registry.create(sid("a")).unwrap();
        let b = registry.create(sid("b")).unwrap();
        a.append(Role::User, "secret for a");

        assert_eq!(b.turn_count(), 0);
        assert!(b.window(10).is_empty());
        assert_eq!(registry.get(&sid("a")).unwrap().window(10).len(), 1);
    }

    #[test]
    fn test_record_question_excludes_new_turn_from_window() {
        let registry = SessionRegistry::default();
        let session = registry.create(sid("s1")).unwrap();
        let window = session.record_question("first?", 10);
        assert!(window.is_empty());
        assert_eq!(session.turn_count(), 1);

        session.append(Role::Assistant, "answer");
        let window = session.record_question("second?", 10);
        assert_eq!(window, vec![Turn::user("first?"), Turn::assistant("answer")]);
    }

    #[test]
    fn test_history_cap_applies_to_sessions() {
        let registry = SessionRegistry::new(DuplicateSessionPolicy::Replace, Some(4));
        let session = registry.create(sid("s1")).unwrap();
        for i in 0..10 {
            session.append(Role::User, format!("m{i}"));
        }
        assert_eq!(session.turn_count(), 4);
    }

    #[test]
    fn test_close_all() {
        let registry = SessionRegistry::default();
        let a = registry.create(sid("a")).unwrap();
        let b = registry.create(sid("b")).unwrap();
        registry.close_all();
        assert!(registry.is_empty());
        assert!(a.is_closed() && b.is_closed());
    }

    #[tokio::test]
    async fn test_concurrent_create_and_remove() {
        let registry = SessionRegistry::default();
        let mut tasks = Vec::new();
        for i in 0..64 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let id = sid(&format!("s{i}"));
                let session = registry.create(id.clone()).unwrap();
                for n in 0..20 {
                    session.append(Role::User, format!("{i}-{n}"));
                    tokio::task::yield_now().await;
                }
                let window = registry.get(&id).unwrap().window(100);
                assert!(window.iter().all(|t| t.content.starts_with(&format!("{i}-"))));
                assert!(registry.release(&session));
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(registry.is_empty());
    }
}
