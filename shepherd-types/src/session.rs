use crate::message::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted multi-turn conversation state, keyed by an opaque id.
///
/// Created on first reference with a client-supplied id, or a fresh UUID
/// when none is supplied. Mutated only by appending messages; destroyed
/// only by an explicit delete; pruned when `updated_at` ages out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session id, also the filename stem it persists under.
    pub id: String,
    /// When this session was first created.
    pub created_at: DateTime<Utc>,
    /// When this session was last saved.
    pub updated_at: DateTime<Utc>,
    /// Full message history, oldest first.
    pub messages: Vec<Message>,
}

impl Session {
    /// Construct an empty session with the given id, stamped at `now`.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            messages: Vec::new(),
        }
    }

    /// Append a message to the history.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Refresh `updated_at` to now. Called by the store on every save.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Number of messages in this session.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

/// Lightweight metadata about a stored session, as returned by a store's
/// `list` operation. Fields beyond `id`/`path`/`size` are best-effort —
/// absent when the underlying document could not be parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session id (filename stem).
    pub id: String,
    /// Path to the backing document.
    pub path: String,
    /// Size of the backing document, in bytes.
    pub size: u64,
    /// Creation timestamp, if the document parsed.
    pub created_at: Option<DateTime<Utc>>,
    /// Last-saved timestamp, if the document parsed.
    pub updated_at: Option<DateTime<Utc>>,
    /// Message count, if the document parsed.
    pub message_count: Option<usize>,
}
