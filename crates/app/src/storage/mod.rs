//! Client-side persisted state.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key holding the persisted language/direction pair.
pub const LANGUAGE_KEY: &str = "language-storage";

/// Key holding the email address of a pending passwordless sign-in.
pub const PENDING_EMAIL_KEY: &str = "emailForSignIn";

/// Key holding the path to return to once an auth redirect completes.
pub const REDIRECT_KEY: &str = "redirectAfterLogin";

/// Key holding the signed-in user's session.
pub const SESSION_KEY: &str = "authSession";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error")]
    Io(#[from] std::io::Error),

    #[error("stored value could not be encoded or decoded")]
    Encoding(#[from] serde_json::Error),
}

/// String key/value persistence, the shape of browser local storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value stored under `key`.
///
/// # Errors
///
/// Returns an error when the store fails or the value is not valid JSON for `T`.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(StorageError::from)
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error when encoding or the store write fails.
pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;

    store.set(key, &raw)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use testresult::TestResult;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pair {
        left: String,
        right: u8,
    }

    #[test]
    fn load_json_missing_key_is_none() -> TestResult {
        let store = MemoryStore::new();

        let value: Option<Pair> = load_json(&store, "missing")?;

        assert!(value.is_none());

        Ok(())
    }

    #[test]
    fn save_then_load_json_returns_value() -> TestResult {
        let store = MemoryStore::new();
        let pair = Pair {
            left: "a".to_string(),
            right: 2,
        };

        save_json(&store, "pair", &pair)?;

        assert_eq!(load_json::<Pair>(&store, "pair")?, Some(pair));

        Ok(())
    }

    #[test]
    fn load_json_rejects_garbage() -> TestResult {
        let store = MemoryStore::new();
        store.set("pair", "{not json")?;

        let result = load_json::<Pair>(&store, "pair");

        assert!(
            matches!(result, Err(StorageError::Encoding(_))),
            "expected Encoding, got {result:?}"
        );

        Ok(())
    }
}
