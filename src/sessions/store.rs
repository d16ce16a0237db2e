use super::types::Session;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared handle to one session. Handlers lock it for the duration of a
/// request so concurrent requests on the same session serialize.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Session persistence contract.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session for `id`, creating it if absent or expired.
    async fn get_or_create(&self, id: &str) -> SessionHandle;

    /// Fetch without creating.
    async fn get(&self, id: &str) -> Option<SessionHandle>;

    /// Drop the session entirely. Returns whether one existed.
    async fn remove(&self, id: &str) -> bool;
}

/// In-memory store with a lazy TTL sweep.
///
/// Sessions hold no durable state (the knowledge corpus lives elsewhere),
/// so process restart losing them is acceptable.
pub struct InMemorySessionStore {
    inner: Mutex<HashMap<String, SessionHandle>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl_hours: u64) -> Self {
        // Clamped to a year so Duration::hours cannot overflow.
        let hours = i64::try_from(ttl_hours.min(24 * 365)).unwrap_or(24);
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl: Duration::hours(hours),
        }
    }

    /// Drop sessions idle past the TTL. Called opportunistically on
    /// lookups rather than from a background task.
    fn sweep(&self, sessions: &mut HashMap<String, SessionHandle>) {
        let cutoff = Utc::now() - self.ttl;
        let mut expired = Vec::new();
        for (id, handle) in sessions.iter() {
            // A session locked by an in-flight request is live by definition.
            if let Ok(session) = handle.try_lock() {
                if session.last_seen < cutoff {
                    expired.push(id.clone());
                }
            }
        }
        for id in expired {
            debug!(session_id = %id, "expiring idle session");
            sessions.remove(&id);
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &str) -> SessionHandle {
        let mut sessions = self.inner.lock().await;
        self.sweep(&mut sessions);
        let handle = sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone();
        drop(sessions);
        handle.lock().await.touch();
        handle
    }

    async fn get(&self, id: &str) -> Option<SessionHandle> {
        let sessions = self.inner.lock().await;
        sessions.get(id).cloned()
    }

    async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.inner.lock().await;
        sessions.remove(id).is_some()
    }
}
