// libs/conversation-cell/src/services/session.rs
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::BookingSession;

/// In-flight booking sessions keyed by customer id. One session per customer;
/// a customer's turns are processed in order, so writers for the same key
/// never interleave. Idle expiry is the transport's job, not ours.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, BookingSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, customer_id: Uuid) -> Option<BookingSession> {
        self.sessions.read().await.get(&customer_id).cloned()
    }

    /// Insert or replace the customer's session.
    pub async fn put(&self, session: BookingSession) {
        self.sessions
            .write()
            .await
            .insert(session.customer_id, session);
    }

    pub async fn remove(&self, customer_id: Uuid) -> Option<BookingSession> {
        self.sessions.write().await.remove(&customer_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
