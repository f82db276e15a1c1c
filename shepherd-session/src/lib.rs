#![deny(missing_docs)]
//! Persists multi-turn conversation state keyed by session id.
//!
//! One JSON document per session, written under a fixed root directory as
//! `<id>.json`. [`FsSessionStore`] is the persistent backend; the `save`
//! path is the only writer and always rewrites the document atomically via
//! write-to-temp-then-rename, so a reader never observes a partial file.
//! [`MemorySessionStore`] backs tests and ephemeral runs with the same
//! contract minus the filesystem.

mod fs_store;
mod memory_store;

pub use fs_store::FsSessionStore;
pub use memory_store::MemorySessionStore;

use async_trait::async_trait;
use shepherd_types::{Session, SessionSummary};

/// Failure modes surfaced by a [`SessionStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Underlying I/O failure (anything but a missing file, which callers
    /// see as `Ok(None)`).
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored document did not parse as a [`Session`].
    #[error("session document did not parse: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backing store for [`Session`] documents.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// If `id` is given and a document exists under it, load and return it.
    /// Otherwise construct a fresh, unsaved session under `id` (or a new
    /// UUID when `id` is `None`).
    async fn get_or_create(&self, id: Option<String>) -> Result<Session, SessionError>;

    /// Persist `session`, refreshing `updated_at` first. The only writer;
    /// always rewrites the whole document.
    async fn save(&self, session: &mut Session) -> Result<(), SessionError>;

    /// Load a session by id. `Ok(None)` means no such document; any other
    /// I/O failure propagates.
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// Remove a session's document. Deleting an absent session is not an
    /// error.
    async fn delete(&self, id: &str) -> Result<(), SessionError>;

    /// Enumerate stored sessions, best-effort, sorted by `updated_at`
    /// descending (unparseable documents sort last, as `None`).
    async fn list(&self) -> Result<Vec<SessionSummary>, SessionError>;

    /// Render a human-readable transcript for a session, or `None` if it
    /// does not exist.
    async fn export_markdown(&self, id: &str) -> Result<Option<String>, SessionError>;

    /// Delete every session whose `updated_at` is older than `days` days
    /// ago, returning the deleted ids.
    async fn prune_older_than(&self, days: i64) -> Result<Vec<String>, SessionError>;
}

/// Render a session's transcript in the shared markdown format, used by
/// both store implementations so their output is identical.
fn render_markdown(session: &Session) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    let _ = writeln!(out, "# Session {}", session.id);
    let _ = writeln!(out, "- created_at: {}", session.created_at.to_rfc3339());
    let _ = writeln!(out, "- updated_at: {}", session.updated_at.to_rfc3339());
    let _ = writeln!(out, "- message_count: {}", session.message_count());
    out.push('\n');

    for message in &session.messages {
        let _ = writeln!(out, "## {}", message.role().to_uppercase());
        out.push_str(message.content().trim());
        out.push_str("\n\n");
    }

    out
}
