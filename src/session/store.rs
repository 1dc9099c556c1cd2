//! In-memory session store.
//!
//! Each session sits behind its own mutex so requests for one session are
//! processed in order while other sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::Session;

/// How often the background task looks for idle sessions.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Store a new session and hand back its shared handle.
    pub async fn create(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id;
        info!(session_id = %id, mode = %session.mode(), "Session created");

        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Lock a stored session for one request.
    ///
    /// Returns `None` if the session is unknown or was removed while the
    /// caller waited for the lock.
    pub async fn lock(&self, id: Uuid) -> Option<OwnedMutexGuard<Session>> {
        let handle = self.get(id).await?;
        let guard = Arc::clone(&handle).lock_owned().await;
        let still_stored = self
            .sessions
            .read()
            .await
            .get(&id)
            .is_some_and(|current| Arc::ptr_eq(current, &handle));
        if !still_stored {
            debug!(session_id = %id, "Session removed while waiting for lock");
            return None;
        }
        Some(guard)
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions with no activity for longer than `timeout`.
    /// Sessions currently handling an event are kept.
    /// Returns the number of sessions removed.
    pub async fn prune_idle(&self, timeout: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(session) => {
                let idle = session.is_idle(now, timeout);
                if idle {
                    debug!(session_id = %id, "Session idle, pruning");
                }
                !idle
            }
            Err(_) => true,
        });

        let pruned = before - sessions.len();
        if pruned > 0 {
            info!(count = pruned, remaining = sessions.len(), "Pruned idle sessions");
        }
        pruned
    }
}

/// Spawn a background task that periodically prunes idle sessions.
pub fn spawn_prune_task(store: Arc<SessionStore>, timeout: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            store.prune_idle(timeout).await;
        }
    })
}
