//! Chat Memory Store (4.G): per-session append-only message log with a
//! token budget, evicting the oldest non-system messages first once the
//! budget is exceeded. Same `DashMap` + TTL mechanism as the Progress
//! Store, independent TTL per session.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use docurag_extract::chunking::TiktokenCounter;

use crate::ttl::{Entry, spawn_sweeper};

const DEFAULT_TTL: Duration = Duration::from_secs(3600);
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_BUDGET: usize = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
struct SessionLog {
    messages: Vec<ChatMessage>,
}

/// Per-session message buffer, bounded by a token budget enforced on every
/// append.
pub struct ChatMemoryStore {
    sessions: Arc<DashMap<String, Entry<SessionLog>>>,
    counter: TiktokenCounter,
    token_budget: usize,
    _sweeper: tokio::task::JoinHandle<()>,
}

impl ChatMemoryStore {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_budget(DEFAULT_TOKEN_BUDGET, DEFAULT_TTL)
    }

    pub fn with_budget(token_budget: usize, ttl: Duration) -> anyhow::Result<Self> {
        let sessions = Arc::new(DashMap::new());
        let sweeper = spawn_sweeper(Arc::clone(&sessions), ttl, SWEEP_INTERVAL);
        Ok(Self {
            sessions,
            counter: TiktokenCounter::new()?,
            token_budget,
            _sweeper: sweeper,
        })
    }

    fn key(session_id: &str) -> String {
        format!("session:{session_id}")
    }

    /// Ensure a session exists, creating an empty log if this is the first
    /// time it's seen.
    pub fn get_or_create(&self, session_id: &str) {
        self.sessions
            .entry(Self::key(session_id))
            .or_insert_with(|| Entry::new(SessionLog::default()));
    }

    pub fn append(&self, session_id: &str, message: ChatMessage) {
        let mut entry = self
            .sessions
            .entry(Self::key(session_id))
            .or_insert_with(|| Entry::new(SessionLog::default()));
        entry.value.messages.push(message);
        self.enforce_budget(&mut entry.value);
        entry.touch();
    }

    pub fn get_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .get(&Self::key(session_id))
            .map(|e| e.value.messages.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, session_id: &str) {
        self.sessions.remove(&Self::key(session_id));
    }

    /// Evict the oldest non-system message until the log's total token
    /// count fits the budget. System messages are never evicted; if they
    /// alone exceed the budget, the log is left over-budget rather than
    /// dropping instructions the caller relies on.
    fn enforce_budget(&self, log: &mut SessionLog) {
        loop {
            let total: usize = log.messages.iter().map(|m| self.counter.count(&m.content)).sum();
            if total <= self.token_budget {
                return;
            }
            let Some(oldest_non_system) =
                log.messages.iter().position(|m| m.role != MessageRole::System)
            else {
                return;
            };
            log.messages.remove(oldest_non_system);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: MessageRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn append_and_read_back_preserves_order() {
        let store = ChatMemoryStore::new().unwrap();
        store.append("s1", message(MessageRole::User, "hello"));
        store.append("s1", message(MessageRole::Assistant, "hi there"));

        let messages = store.get_messages("s1");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "hello");
        assert_eq!(messages[1].content, "hi there");
    }

    #[test]
    fn unknown_session_returns_empty_log() {
        let store = ChatMemoryStore::new().unwrap();
        assert!(store.get_messages("never-seen").is_empty());
    }

    #[test]
    fn clear_removes_the_session() {
        let store = ChatMemoryStore::new().unwrap();
        store.append("s1", message(MessageRole::User, "hello"));
        store.clear("s1");
        assert!(store.get_messages("s1").is_empty());
    }

    #[test]
    fn budget_evicts_oldest_non_system_message_first() {
        let store = ChatMemoryStore::with_budget(5, Duration::from_secs(60)).unwrap();
        store.append("s1", message(MessageRole::System, "be concise"));
        store.append("s1", message(MessageRole::User, "one two three four five six seven"));
        store.append("s1", message(MessageRole::Assistant, "ok"));

        let messages = store.get_messages("s1");
        // the oversized user message is evicted before the system prompt
        assert!(messages.iter().any(|m| m.role == MessageRole::System));
        assert!(!messages.iter().any(|m| m.content.starts_with("one two")));
    }
}
