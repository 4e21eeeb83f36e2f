use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use serde_json::{Map, Value};

/// Persisted key-value settings for the desktop client: auth tokens, the API
/// base URL, the auto-start flag, and the offline write queue. Backed by a
/// single JSON object document; every mutation rewrites the whole document
/// under the store lock, so writes to the same key never interleave.
#[derive(Debug)]
pub(crate) struct PreferenceStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl PreferenceStore {
    /// Loads the store from disk. A missing file opens an empty store; an
    /// unreadable or corrupt file is an initialization failure, which is the
    /// one fatal error class in this process.
    pub(crate) fn open(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => {
                let parsed: Value = serde_json::from_str(&raw).map_err(|error| {
                    format!(
                        "Failed to parse preference store {}: {}",
                        path.display(),
                        error
                    )
                })?;
                match parsed {
                    Value::Object(map) => map,
                    _ => {
                        return Err(format!(
                            "Preference store {} has a non-object root.",
                            path.display()
                        ));
                    }
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(error) => {
                return Err(format!(
                    "Failed to read preference store {}: {}",
                    path.display(),
                    error
                ));
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub(crate) fn set(&self, key: &str, value: Value) -> Result<(), String> {
        let mut entries = self.lock_entries()?;
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    pub(crate) fn delete(&self, key: &str) -> Result<(), String> {
        let mut entries = self.lock_entries()?;
        entries.remove(key);
        self.persist(&entries)
    }

    pub(crate) fn clear(&self) -> Result<(), String> {
        let mut entries = self.lock_entries()?;
        entries.clear();
        self.persist(&entries)
    }

    fn lock_entries(&self) -> Result<MutexGuard<'_, Map<String, Value>>, String> {
        self.entries
            .lock()
            .map_err(|_| "Preference store lock poisoned.".to_string())
    }

    fn persist(&self, entries: &Map<String, Value>) -> Result<(), String> {
        if let Some(parent_dir) = self.path.parent() {
            fs::create_dir_all(parent_dir).map_err(|error| {
                format!(
                    "Failed to create preference directory {}: {}",
                    parent_dir.display(),
                    error
                )
            })?;
        }

        let serialized = serde_json::to_string_pretty(entries)
            .map_err(|error| format!("Failed to serialize preference store: {error}"))?;
        fs::write(&self.path, serialized).map_err(|error| {
            format!(
                "Failed to write preference store {}: {}",
                self.path.display(),
                error
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &Path) -> PreferenceStore {
        PreferenceStore::open(dir.join("data").join("preferences.json"))
            .expect("store should open in a fresh directory")
    }

    #[test]
    fn set_then_get_round_trips_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());

        store.set("api-url", json!("http://example.test/api")).expect("set");
        store
            .set("user", json!({ "id": 3, "is_host": true }))
            .expect("set");

        assert_eq!(store.get("api-url"), Some(json!("http://example.test/api")));
        assert_eq!(store.get("user"), Some(json!({ "id": 3, "is_host": true })));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn delete_removes_only_the_named_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());

        store.set("auth_token", json!("jwt")).expect("set");
        store.set("refresh_token", json!("jwt-refresh")).expect("set");
        store.delete("auth_token").expect("delete");

        assert_eq!(store.get("auth_token"), None);
        assert_eq!(store.get("refresh_token"), Some(json!("jwt-refresh")));
    }

    #[test]
    fn clear_erases_every_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(dir.path());

        store.set("a", json!(1)).expect("set");
        store.set("b", json!(2)).expect("set");
        store.clear().expect("clear");

        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data").join("preferences.json");

        {
            let store = PreferenceStore::open(&path).expect("open");
            store.set("auto-start", json!(true)).expect("set");
        }

        let reopened = PreferenceStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("auto-start"), Some(json!(true)));
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = PreferenceStore::open(dir.path().join("never-written.json")).expect("open");
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn corrupt_document_fails_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{not json").expect("write");

        let error = PreferenceStore::open(&path).expect_err("corrupt store should not open");
        assert!(error.contains("Failed to parse preference store"));
    }

    #[test]
    fn non_object_root_fails_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("preferences.json");
        fs::write(&path, "[1, 2, 3]").expect("write");

        let error = PreferenceStore::open(&path).expect_err("array root should not open");
        assert!(error.contains("non-object root"));
    }
}
