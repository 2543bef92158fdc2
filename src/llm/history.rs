//! Per-session conversation history.
//!
//! [`ConversationHistory`] is append-only during a session: the orchestrator
//! adds one user entry when a turn starts and one model entry when it
//! completes.  The only removal is [`truncate`](ConversationHistory::truncate),
//! used to undo the user entry of a turn whose generation failed.

use serde::{Deserialize, Serialize};

/// Who authored a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    /// Role name as used by the Gemini `contents` array.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One `(role, content)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// Ordered history of a channel session.  Discarded with the session.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    entries: Vec<HistoryEntry>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.entries.push(HistoryEntry::user(content));
    }

    pub fn push_model(&mut self, content: impl Into<String>) {
        self.entries.push(HistoryEntry::model(content));
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry at index `len` and beyond.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}
