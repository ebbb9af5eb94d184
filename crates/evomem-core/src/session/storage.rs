//! Durable storage for session records.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::types::SessionRecord;
use crate::error::{Error, Result};

const MAX_SESSION_ID_LEN: usize = 128;

/// Check that an id is usable as a storage key.
///
/// Rejects ids that could name a path outside the storage directory.
pub fn validate_session_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_argument("session_id", "cannot be empty"));
    }

    if id.len() > MAX_SESSION_ID_LEN {
        return Err(Error::invalid_argument(
            "session_id",
            format!("must be {} characters or less", MAX_SESSION_ID_LEN),
        ));
    }

    if id == "." || id == ".." {
        return Err(Error::invalid_argument("session_id", "cannot be '.' or '..'"));
    }

    if let Some(c) = id
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(Error::invalid_argument(
            "session_id",
            format!("invalid character {:?}", c),
        ));
    }

    Ok(())
}

/// Keyed store for persisted sessions.
///
/// Implementations perform blocking I/O; callers own any timeout or retry
/// policy.
pub trait SessionStorage: Send + Sync {
    /// Write or replace the record for `record.session_id`.
    fn save(&self, record: &SessionRecord) -> Result<()>;

    /// Read a record. `Ok(None)` when nothing is stored under the id;
    /// an error when the stored data cannot be read or decoded.
    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Remove a record. Removing a missing record is not an error.
    fn delete(&self, session_id: &str) -> Result<()>;

    /// Ids of all stored records, sorted.
    fn list_ids(&self) -> Result<Vec<String>>;

    /// Human-readable location, for stats and logs.
    fn describe(&self) -> String;
}

/// One pretty-printed JSON file per session, `<dir>/<session_id>.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    /// Store records under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for a session.
    pub fn record_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

impl SessionStorage for FileSessionStorage {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.record_path(&record.session_id)?;
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&path, content)?;
        debug!("Saved session record to {:?}", path);
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let path = self.record_path(session_id)?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        match fs::remove_file(self.record_path(session_id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                if let Some(stem) = path.file_stem() {
                    ids.push(stem.to_string_lossy().to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// In-process storage keeping serialized records in a map.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under an id, bypassing serialization.
    pub fn insert_raw(&self, session_id: impl Into<String>, raw: impl Into<String>) {
        self.lock().insert(session_id.into(), raw.into());
    }

    /// Check whether anything is stored under an id.
    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStorage for MemorySessionStorage {
    fn save(&self, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record)?;
        self.lock().insert(record.session_id.clone(), raw);
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        match self.lock().get(session_id) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        self.lock().remove(session_id);
        Ok(())
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ConversationWindow, Role};
    use tempfile::tempdir;

    fn sample_record(id: &str) -> SessionRecord {
        let mut window = ConversationWindow::new(10);
        window.append(Role::System, "system");
        window.append(Role::User, "hello");
        SessionRecord::capture(id, &window)
    }

    #[test]
    fn test_file_storage_save_and_load() {
        let temp = tempdir().expect("Failed to create temp dir");
        let storage = FileSessionStorage::new(temp.path().join("sessions"));

        let record = sample_record("s1");
        storage.save(&record).expect("Failed to save record");
        assert!(storage.record_path("s1").unwrap().exists());

        let loaded = storage.load("s1").unwrap().unwrap();
        assert_eq!(loaded, record);
        assert_eq!(storage.list_ids().unwrap(), vec!["s1".to_string()]);
    }

    #[test]
    fn test_file_storage_missing_and_corrupt() {
        let temp = tempdir().expect("Failed to create temp dir");
        let storage = FileSessionStorage::new(temp.path());

        assert!(storage.load("absent").unwrap().is_none());

        fs::write(storage.record_path("broken").unwrap(), "{ not json").unwrap();
        assert!(storage.load("broken").is_err());
    }

    #[test]
    fn test_file_storage_list_ignores_other_files() {
        let temp = tempdir().expect("Failed to create temp dir");
        let storage = FileSessionStorage::new(temp.path());

        storage.save(&sample_record("b")).unwrap();
        storage.save(&sample_record("a")).unwrap();
        fs::write(temp.path().join("notes.txt"), "ignore me").unwrap();

        assert_eq!(storage.list_ids().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_file_storage_missing_dir_lists_nothing() {
        let temp = tempdir().expect("Failed to create temp dir");
        let storage = FileSessionStorage::new(temp.path().join("never-created"));
        assert!(storage.list_ids().unwrap().is_empty());
    }

    #[test]
    fn test_file_storage_delete_is_idempotent() {
        let temp = tempdir().expect("Failed to create temp dir");
        let storage = FileSessionStorage::new(temp.path());

        storage.save(&sample_record("gone")).unwrap();
        storage.delete("gone").unwrap();
        storage.delete("gone").unwrap();
        assert!(storage.load("gone").unwrap().is_none());
    }

    #[test]
    fn test_file_storage_rejects_path_like_ids() {
        let temp = tempdir().expect("Failed to create temp dir");
        let storage = FileSessionStorage::new(temp.path().join("sessions"));
        let outside = temp.path().join("escape.json");
        fs::write(&outside, "{}").unwrap();

        for id in ["../escape", "a/b", "..", ""] {
            assert!(storage.record_path(id).unwrap_err().is_invalid_argument());
        }
        assert!(storage.delete("../escape").is_err());
        assert!(storage.load("../escape").is_err());
        assert!(outside.exists());
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemorySessionStorage::new();
        let record = sample_record("m");

        storage.save(&record).unwrap();
        assert!(storage.contains("m"));
        assert_eq!(storage.load("m").unwrap().unwrap(), record);

        storage.insert_raw("junk", "???");
        assert!(storage.load("junk").is_err());

        storage.delete("m").unwrap();
        assert_eq!(storage.list_ids().unwrap(), vec!["junk".to_string()]);
    }
}
