//! Key-value persistence backends
//!
//! The game stores small JSON blobs (high scores, settings) under fixed keys.
//! Backends:
//! - `MemoryStore`: in-process map (tests, headless runs)
//! - `FileStore`: one JSON file per key (native)
//! - `LocalStorageStore`: browser LocalStorage (wasm32)
//!
//! Callers treat every failure as recoverable: a failed read means "nothing
//! saved yet", a failed write is logged and dropped.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Minimal string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value; `Ok(None)` if the key was never written
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.get(key)? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Encode and write a JSON value
pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::PathBuf;

    use super::{KeyValueStore, StorageError};

    /// One `<key>.json` file per key inside a directory
    #[derive(Debug, Clone)]
    pub struct FileStore {
        dir: PathBuf,
    }

    impl FileStore {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        fn path(&self, key: &str) -> PathBuf {
            self.dir.join(format!("{key}.json"))
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            match fs::read_to_string(self.path(key)) {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            fs::create_dir_all(&self.dir)?;
            // Write to a temp file then rename so a crash never leaves half a file
            let tmp = self.dir.join(format!("{key}.json.tmp"));
            fs::write(&tmp, value)?;
            fs::rename(&tmp, self.path(key))?;
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::{KeyValueStore, StorageError};

    /// Browser LocalStorage
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorageStore;

    impl LocalStorageStore {
        fn storage() -> Result<web_sys::Storage, StorageError> {
            web_sys::window()
                .and_then(|w| w.local_storage().ok())
                .flatten()
                .ok_or_else(|| StorageError::Unavailable("LocalStorage not accessible".into()))
        }
    }

    impl KeyValueStore for LocalStorageStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Self::storage()?
                .get_item(key)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            Self::storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_load_json_reports_corruption() {
        let mut store = MemoryStore::new();
        store.set("scores", "{not json").unwrap();
        let loaded: Result<Option<Vec<u32>>, _> = load_json(&store, "scores");
        assert!(matches!(loaded, Err(StorageError::Serialize(_))));
    }

    #[test]
    fn test_json_helpers() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "nums", &vec![3u32, 1, 2]).unwrap();
        let loaded: Option<Vec<u32>> = load_json(&store, "nums").unwrap();
        assert_eq!(loaded, Some(vec![3, 1, 2]));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_store_creates_dir_and_reads_back() {
        let dir = std::env::temp_dir().join(format!(
            "robot-runner-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_dir_all(&dir);

        let mut store = FileStore::new(&dir);
        assert!(store.get("scores").unwrap().is_none());
        store.set("scores", "[1,2]").unwrap();
        assert_eq!(store.get("scores").unwrap().as_deref(), Some("[1,2]"));
        assert!(!dir.join("scores.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
