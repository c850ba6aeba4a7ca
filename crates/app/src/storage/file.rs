//! JSON file backed key/value store.

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

const STATE_FILE: &str = "state.json";
const CORRUPT_EXTENSION: &str = "json.corrupt";

/// Persists every entry in a single JSON object on disk.
///
/// The whole map is rewritten on each change through a temporary file and a
/// rename, so a crash mid-write leaves the previous state intact.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error when an existing state file cannot be read. A file
    /// that cannot be parsed is moved aside and the store starts empty.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        let path = dir.join(STATE_FILE);

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(entries) => entries,
                Err(error) => {
                    let aside = path.with_extension(CORRUPT_EXTENSION);

                    warn!(%error, path = %path.display(), "discarding unreadable state file");

                    fs::rename(&path, &aside)?;

                    BTreeMap::new()
                }
            },
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(error.into()),
        };

        debug!(path = %path.display(), "opened state file");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;

        Ok(())
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();

        entries.insert(key.to_string(), value.to_string());

        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();

        if entries.remove(key).is_none() {
            return Ok(());
        }

        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn values_survive_reopen() -> TestResult {
        let dir = tempfile::tempdir()?;

        let store = FileStore::open(dir.path())?;
        store.set("emailForSignIn", "someone@example.com")?;
        drop(store);

        let reopened = FileStore::open(dir.path())?;

        assert_eq!(
            reopened.get("emailForSignIn")?.as_deref(),
            Some("someone@example.com")
        );

        Ok(())
    }

    #[test]
    fn remove_is_persisted() -> TestResult {
        let dir = tempfile::tempdir()?;

        let store = FileStore::open(dir.path())?;
        store.set("redirectAfterLogin", "/favorites")?;
        store.remove("redirectAfterLogin")?;
        drop(store);

        let reopened = FileStore::open(dir.path())?;

        assert!(reopened.get("redirectAfterLogin")?.is_none());

        Ok(())
    }

    #[test]
    fn remove_missing_key_is_ok() -> TestResult {
        let dir = tempfile::tempdir()?;
        let store = FileStore::open(dir.path())?;

        store.remove("never-set")?;

        assert!(!dir.path().join(STATE_FILE).exists());

        Ok(())
    }

    #[test]
    fn corrupt_state_file_is_moved_aside() -> TestResult {
        let dir = tempfile::tempdir()?;
        let state = dir.path().join(STATE_FILE);
        fs::write(&state, "{truncated")?;

        let store = FileStore::open(dir.path())?;

        assert!(store.get("language-storage")?.is_none());
        assert!(!state.exists());
        assert_eq!(
            fs::read_to_string(state.with_extension(CORRUPT_EXTENSION))?,
            "{truncated"
        );

        store.set("language-storage", "{\"language\":\"ar\",\"direction\":\"rtl\"}")?;
        drop(store);

        let reopened = FileStore::open(dir.path())?;

        assert!(reopened.get("language-storage")?.is_some());

        Ok(())
    }
}
