use crate::{render_markdown, SessionError, SessionStore};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use shepherd_types::{Session, SessionSummary};
use std::path::{Path, PathBuf};

/// One JSON document per session under `root`, named `<id>.json`.
///
/// Directory layout:
/// ```text
/// root/
///   <id>.json
/// ```
pub struct FsSessionStore {
    root: PathBuf,
}

impl FsSessionStore {
    /// Create a store rooted at the given directory. The directory is
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}.json"))
    }

    async fn read_session(&self, path: &Path) -> Result<Option<Session>, SessionError> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write `contents` to `path`, never leaving a reader able to observe a
    /// partial document: write to a sibling temp file, then rename into
    /// place (atomic on the same filesystem).
    async fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), SessionError> {
        let dir = path.parent().expect("session path always has a parent");
        tokio::fs::create_dir_all(dir).await?;
        let tmp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp_path, contents).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn get_or_create(&self, id: Option<String>) -> Result<Session, SessionError> {
        match id {
            Some(id) => {
                let path = self.path_for(&id);
                match self.read_session(&path).await? {
                    Some(session) => Ok(session),
                    None => Ok(Session::new(id)),
                }
            }
            None => Ok(Session::new(uuid::Uuid::new_v4().to_string())),
        }
    }

    async fn save(&self, session: &mut Session) -> Result<(), SessionError> {
        session.touch();
        let path = self.path_for(&session.id);
        let contents = serde_json::to_string_pretty(session)?;
        self.write_atomic(&path, &contents).await
    }

    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        self.read_session(&self.path_for(id)).await
    }

    async fn delete(&self, id: &str) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.path_for(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|_| path.extension().and_then(|e| e.to_str()) == Some("json"))
            else {
                continue;
            };
            let metadata = entry.metadata().await?;
            let parsed = self.read_session(&path).await.ok().flatten();
            summaries.push(SessionSummary {
                id: id.to_string(),
                path: path.to_string_lossy().into_owned(),
                size: metadata.len(),
                created_at: parsed.as_ref().map(|s| s.created_at),
                updated_at: parsed.as_ref().map(|s| s.updated_at),
                message_count: parsed.as_ref().map(Session::message_count),
            });
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn export_markdown(&self, id: &str) -> Result<Option<String>, SessionError> {
        Ok(self.load(id).await?.map(|session| render_markdown(&session)))
    }

    async fn prune_older_than(&self, days: i64) -> Result<Vec<String>, SessionError> {
        let threshold = Utc::now() - Duration::days(days);
        let mut deleted = Vec::new();
        for summary in self.list().await? {
            if let Some(updated_at) = summary.updated_at {
                if updated_at < threshold {
                    self.delete(&summary.id).await?;
                    deleted.push(summary.id);
                }
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_types::Message;

    #[tokio::test]
    async fn get_or_create_without_id_makes_a_fresh_uuid_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let session = store.get_or_create(None).await.unwrap();
        assert!(uuid::Uuid::parse_str(&session.id).is_ok());
        assert!(session.messages.is_empty());
    }

    #[tokio::test]
    async fn get_or_create_with_unknown_id_constructs_empty_unsaved_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let session = store.get_or_create(Some("s1".into())).await.unwrap();
        assert_eq!(session.id, "s1");
        assert!(store.load("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let mut session = Session::new("s1");
        session.push(Message::user("hello"));
        store.save(&mut session).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.id, "s1");
        assert_eq!(loaded.messages.len(), 1);
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        let mut session = Session::new("s1");
        store.save(&mut session).await.unwrap();

        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["s1.json"]);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        store.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn list_sorts_by_updated_at_descending() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());

        let mut older = Session::new("older");
        older.updated_at = Utc::now() - Duration::days(2);
        tokio::fs::write(
            dir.path().join("older.json"),
            serde_json::to_string(&older).unwrap(),
        )
        .await
        .unwrap();

        let mut newer = Session::new("newer");
        store.save(&mut newer).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries[0].id, "newer");
        assert_eq!(summaries[1].id, "older");
    }

    #[tokio::test]
    async fn export_markdown_is_none_for_missing_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());
        assert!(store.export_markdown("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prune_older_than_deletes_stale_sessions_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());

        let mut stale = Session::new("stale");
        stale.updated_at = Utc::now() - Duration::days(40);
        tokio::fs::write(
            dir.path().join("stale.json"),
            serde_json::to_string(&stale).unwrap(),
        )
        .await
        .unwrap();

        let mut fresh = Session::new("fresh");
        store.save(&mut fresh).await.unwrap();

        let deleted = store.prune_older_than(30).await.unwrap();
        assert_eq!(deleted, vec!["stale".to_string()]);
        assert!(store.load("stale").await.unwrap().is_none());
        assert!(store.load("fresh").await.unwrap().is_some());
    }
}
