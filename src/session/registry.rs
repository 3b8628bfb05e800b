//! Session registry with sliding inactivity expiry.
//!
//! Every entry owns exactly one timer task. Creating or looking up a session
//! aborts the entry's timer and schedules a fresh one, so expiry slides with
//! activity. Removal, clearing and expiry all cancel the timer and invoke the
//! handle's close hook exactly once.

use crate::metrics::Metrics;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A long-lived connection bound to one session.
///
/// The registry never inspects the handle; it only stores it, hands it back
/// on lookup, and calls [`ConnectionHandle::close`] when the session ends.
pub trait ConnectionHandle: Send + Sync + 'static {
    /// Called once when the session leaves the registry.
    fn close(&self);
}

struct SessionEntry<H> {
    handle: Arc<H>,
    deadline: Instant,
    /// Identifies the timer currently allowed to evict this entry
    generation: u64,
    timer: JoinHandle<()>,
}

struct Inner<H> {
    sessions: Mutex<HashMap<String, SessionEntry<H>>>,
    next_generation: AtomicU64,
    timeout: Duration,
    metrics: Metrics,
}

impl<H: ConnectionHandle> Inner<H> {
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SessionEntry<H>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Evict `session_id` if its current timer is still `generation`.
    fn expire(&self, session_id: &str, generation: u64) {
        let evicted = {
            let mut sessions = self.sessions();
            match sessions.get(session_id) {
                Some(entry) if entry.generation == generation => sessions.remove(session_id),
                _ => None,
            }
        };

        if let Some(entry) = evicted {
            tracing::info!(session_id = %session_id, "Session expired after inactivity");
            self.metrics.record_session_expired();
            entry.handle.close();
        }
    }
}

impl<H> Drop for Inner<H> {
    fn drop(&mut self) {
        if let Ok(sessions) = self.sessions.get_mut() {
            for entry in sessions.values() {
                entry.timer.abort();
            }
        }
    }
}

/// `now + timeout`, clamped to roughly thirty years out like `tokio::time::sleep`.
fn deadline_after(now: Instant, timeout: Duration) -> Instant {
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(86400 * 365 * 30))
}

/// Registry of active sessions keyed by session id.
///
/// Cloning is cheap and clones share the same sessions. Methods that start a
/// timer (`create`, `lookup`) must be called from within a Tokio runtime.
pub struct SessionRegistry<H: ConnectionHandle> {
    inner: Arc<Inner<H>>,
}

impl<H: ConnectionHandle> Clone for SessionRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<H: ConnectionHandle> SessionRegistry<H> {
    /// Create an empty registry whose sessions expire after `timeout` idle.
    pub fn new(timeout: Duration, metrics: Metrics) -> Self {
        Self {
            inner: Arc::new(Inner {
                sessions: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                timeout,
                metrics,
            }),
        }
    }

    /// The inactivity timeout applied to every session.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Insert or overwrite a session and (re)start its inactivity timer.
    ///
    /// Overwriting closes the previous handle unless it is the same handle.
    pub fn create(&self, session_id: impl Into<String>, handle: Arc<H>) {
        let session_id = session_id.into();
        if session_id.is_empty() {
            tracing::warn!("Refusing to register a session with an empty id");
            return;
        }

        let (generation, timer) = self.schedule(&session_id);
        let entry = SessionEntry {
            handle: handle.clone(),
            deadline: deadline_after(Instant::now(), self.inner.timeout),
            generation,
            timer,
        };

        let replaced = self.inner.sessions().insert(session_id.clone(), entry);
        self.inner.metrics.record_session_created();
        tracing::debug!(session_id = %session_id, "Session registered");

        if let Some(previous) = replaced {
            previous.timer.abort();
            if !Arc::ptr_eq(&previous.handle, &handle) {
                previous.handle.close();
            }
        }
    }

    /// Return the session's handle and push its expiry out by a full timeout.
    ///
    /// Unknown or already-expired ids return `None`.
    pub fn lookup(&self, session_id: &str) -> Option<Arc<H>> {
        let now = Instant::now();
        let mut sessions = self.inner.sessions();

        let expired = match sessions.get(session_id) {
            None => return None,
            Some(entry) => entry.deadline <= now,
        };

        if expired {
            // The timer has not run yet; evict on its behalf.
            let entry = sessions.remove(session_id)?;
            drop(sessions);
            entry.timer.abort();
            tracing::info!(session_id = %session_id, "Session expired after inactivity");
            self.inner.metrics.record_session_expired();
            entry.handle.close();
            return None;
        }

        let (generation, timer) = self.schedule(session_id);
        let entry = sessions.get_mut(session_id)?;
        entry.timer.abort();
        entry.timer = timer;
        entry.generation = generation;
        entry.deadline = deadline_after(now, self.inner.timeout);
        Some(entry.handle.clone())
    }

    /// Remove a session, cancel its timer and close its handle.
    ///
    /// Removing an unknown id is a no-op. Returns whether a session was removed.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.inner.sessions().remove(session_id);
        match removed {
            Some(entry) => {
                entry.timer.abort();
                entry.handle.close();
                tracing::debug!(session_id = %session_id, "Session removed");
                true
            }
            None => false,
        }
    }

    /// Number of registered sessions.
    pub fn count(&self) -> usize {
        self.inner.sessions().len()
    }

    /// Ids of all registered sessions, sorted.
    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.sessions().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Cancel every timer, then drop every session, closing each handle.
    pub fn clear(&self) {
        let drained: Vec<SessionEntry<H>> = {
            let mut sessions = self.inner.sessions();
            for entry in sessions.values() {
                entry.timer.abort();
            }
            sessions.drain().map(|(_, entry)| entry).collect()
        };

        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "Clearing all sessions");
        }
        for entry in drained {
            entry.handle.close();
        }
    }

    fn schedule(&self, session_id: &str) -> (u64, JoinHandle<()>) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let inner: Weak<Inner<H>> = Arc::downgrade(&self.inner);
        let timeout = self.inner.timeout;
        let session_id = session_id.to_string();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = inner.upgrade() {
                inner.expire(&session_id, generation);
            }
        });
        (generation, timer)
    }
}

impl<H: ConnectionHandle> std::fmt::Debug for SessionRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("timeout", &self.inner.timeout)
            .field("sessions", &self.count())
            .finish()
    }
}
