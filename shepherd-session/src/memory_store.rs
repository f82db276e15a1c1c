use crate::{render_markdown, SessionError, SessionStore};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use shepherd_types::{Session, SessionSummary};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory backend with the same contract as [`crate::FsSessionStore`],
/// used for tests and the CLI's ephemeral dev mode. Nothing survives
/// process exit.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Build an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().expect("session map lock poisoned")
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_or_create(&self, id: Option<String>) -> Result<Session, SessionError> {
        match id {
            Some(id) => Ok(self.lock().get(&id).cloned().unwrap_or_else(|| Session::new(id))),
            None => Ok(Session::new(uuid::Uuid::new_v4().to_string())),
        }
    }

    async fn save(&self, session: &mut Session) -> Result<(), SessionError> {
        session.touch();
        self.lock().insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.lock().remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut summaries: Vec<SessionSummary> = self
            .lock()
            .values()
            .map(|session| {
                let size = serde_json::to_vec(session).map(|v| v.len() as u64).unwrap_or(0);
                SessionSummary {
                    id: session.id.clone(),
                    path: format!("memory://{}", session.id),
                    size,
                    created_at: Some(session.created_at),
                    updated_at: Some(session.updated_at),
                    message_count: Some(session.message_count()),
                }
            })
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn export_markdown(&self, id: &str) -> Result<Option<String>, SessionError> {
        Ok(self.load(id).await?.map(|session| render_markdown(&session)))
    }

    async fn prune_older_than(&self, days: i64) -> Result<Vec<String>, SessionError> {
        let threshold = Utc::now() - Duration::days(days);
        let stale: Vec<String> = self
            .lock()
            .values()
            .filter(|s| s.updated_at < threshold)
            .map(|s| s.id.clone())
            .collect();
        for id in &stale {
            self.lock().remove(id);
        }
        Ok(stale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::Message;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let store = MemorySessionStore::new();
        let mut session = Session::new("s1");
        session.push(Message::user("hi"));
        store.save(&mut session).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.messages.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_session() {
        let store = MemorySessionStore::new();
        let mut session = Session::new("s1");
        store.save(&mut session).await.unwrap();
        store.delete("s1").await.unwrap();
        assert!(store.load("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prune_older_than_removes_only_stale_sessions() {
        let store = MemorySessionStore::new();
        let mut stale = Session::new("stale");
        stale.updated_at = Utc::now() - Duration::days(10);
        store.lock().insert(stale.id.clone(), stale);

        let mut fresh = Session::new("fresh");
        store.save(&mut fresh).await.unwrap();

        let deleted = store.prune_older_than(5).await.unwrap();
        assert_eq!(deleted, vec!["stale".to_string()]);
        assert!(store.load("fresh").await.unwrap().is_some());
    }
}
