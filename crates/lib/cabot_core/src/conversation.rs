//! Conversation turns, per-session logs and the in-memory session store.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation, serialized as `{"role", "content"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, ordered history of one session.
///
/// Turns are only ever added in user/assistant pairs.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The message list to send for a new prompt: full history followed by
    /// the prompt as a user turn. The log itself is not modified.
    pub fn messages_with(&self, prompt: &str) -> Vec<ConversationTurn> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        messages.extend(self.turns.iter().cloned());
        messages.push(ConversationTurn::user(prompt));
        messages
    }

    /// Record a completed exchange.
    pub fn append_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.turns.push(ConversationTurn::user(prompt));
        self.turns.push(ConversationTurn::assistant(reply));
    }
}

/// Shared handle to one session's log.
///
/// The async mutex is held for a whole retrieve/complete/append sequence so
/// turns from concurrent requests of the same session cannot interleave.
pub type SessionLog = Arc<Mutex<ConversationLog>>;

/// In-memory map of session id to conversation log.
///
/// Sessions are never evicted and logs are never reset.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionLog>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the log for `id`, creating an empty one on first use.
    pub fn log(&self, id: Uuid) -> SessionLog {
        self.sessions
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(ConversationLog::new())))
            .clone()
    }

    /// Copy of a session's turns, `None` if the session has never been used.
    pub async fn snapshot(&self, id: Uuid) -> Option<Vec<ConversationTurn>> {
        // Clone the Arc out first so no map shard lock is held across the await.
        let log = self.sessions.get(&id).map(|entry| entry.value().clone())?;
        let guard = log.lock().await;
        Some(guard.turns().to_vec())
    }

    /// Ids of all sessions that have a log.
    pub fn session_ids(&self) -> Vec<Uuid> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of sessions that have a log.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let json = serde_json::to_value(ConversationTurn::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }

    #[test]
    fn messages_with_appends_prompt_without_mutating() {
        let mut log = ConversationLog::new();
        log.append_exchange("first prompt", "first reply");

        let messages = log.messages_with("second prompt");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], ConversationTurn::user("second prompt"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn append_exchange_keeps_user_then_assistant_order() {
        let mut log = ConversationLog::new();
        log.append_exchange("q1", "a1");
        log.append_exchange("q2", "a2");

        let roles: Vec<Role> = log.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(log.turns()[3].content, "a2");
    }

    #[tokio::test]
    async fn store_returns_same_log_for_same_session() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();

        store.log(id).lock().await.append_exchange("q", "a");

        assert_eq!(store.snapshot(id).await.unwrap().len(), 2);
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.log(a).lock().await.append_exchange("q", "a");
        let _ = store.log(b);

        assert_eq!(store.snapshot(a).await.unwrap().len(), 2);
        assert!(store.snapshot(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_session_has_no_snapshot() {
        let store = SessionStore::new();
        assert!(store.snapshot(Uuid::new_v4()).await.is_none());
    }
}
