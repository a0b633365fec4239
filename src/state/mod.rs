//! Session state
//!
//! Each conversation owns one `ConversationContext`. The store hands out
//! the context behind an async mutex, so turns of the same session run one
//! after another while different sessions proceed independently.
//! Currently in-memory only.

use crate::conversational::{Compass, ConversationContext};
use crate::models::TurnOutcome;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SharedContext = Arc<Mutex<ConversationContext>>;

/// Trait for conversation state ownership
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Existing session, or a fresh one with the welcome message
    async fn get_or_create(&self, session_id: Uuid) -> SharedContext;
    async fn get(&self, session_id: Uuid) -> Option<SharedContext>;
    /// Discard a session; true when it existed
    async fn remove(&self, session_id: Uuid) -> bool;
    async fn session_count(&self) -> usize;
}

/// In-memory session store for development
///
/// Sessions are never evicted; the map only shrinks through `remove`.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, SharedContext>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_id: Uuid) -> SharedContext {
        {
            let sessions = self.sessions.read().await;
            if let Some(context) = sessions.get(&session_id) {
                return Arc::clone(context);
            }
        }

        let mut sessions = self.sessions.write().await;
        let context = sessions
            .entry(session_id)
            .or_insert_with(|| Arc::new(Mutex::new(ConversationContext::new(session_id))));
        Arc::clone(context)
    }

    async fn get(&self, session_id: Uuid) -> Option<SharedContext> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).cloned()
    }

    async fn remove(&self, session_id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&session_id).is_some()
    }

    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Run one turn against a stored session and commit the result
///
/// The session lock is held for the whole turn; the new context replaces
/// the old one only after the turn completed.
pub async fn run_session_turn(
    compass: &Compass,
    session: &Mutex<ConversationContext>,
    message: &str,
) -> (TurnOutcome, ConversationContext) {
    let mut guard = session.lock().await;
    let (next, outcome) = compass.process_turn(&guard, message).await;
    *guard = next.clone();
    (outcome, next)
}
