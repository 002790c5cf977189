use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::session::session::Session;
use crate::session::types::{FileDescriptor, SessionId};

/// Process-wide `id -> Session` map. Allocates monotonic ids and reaps
/// entries once their session task completes.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, Arc<Session>>>,
    next_id: Arc<AtomicU64>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate an id, spawn the session, and arrange for its removal once
    /// its background task terminates.
    pub fn create(&self, file: FileDescriptor) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Session::spawn(id, file);
        self.sessions.insert(id, session.clone());

        let sessions = self.sessions.clone();
        tokio::spawn(async move {
            session.wait_done().await;
            sessions.remove(&id);
        });

        id
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| entry.clone())
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
