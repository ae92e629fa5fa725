//! Key-value persistence for store snapshots
//!
//! Each store serializes its whole document as JSON and overwrites one fixed
//! key after every mutation. Reads fall back to the default document when the
//! key is missing or does not deserialize.

use crate::{MtgError, Result};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key holding the collection document
pub const COLLECTION_KEY: &str = "mtg-collection";

/// Key holding the deck list document
pub const DECKS_KEY: &str = "mtg-decks";

/// Scoped string-keyed blob store
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: Mutex<FxHashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| MtgError::Storage("memory store lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| MtgError::Storage("memory store lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(FileKv { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MtgError::IoError(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Write beside the target and rename so a crash never leaves half a document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Read and deserialize the document under `key`
///
/// Missing and malformed documents both yield `T::default()`.
pub fn read_document<T>(kv: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match kv.get(key) {
        Ok(Some(contents)) => match serde_json::from_str(&contents) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(key, error = %e, "stored document is malformed, starting empty");
                T::default()
            }
        },
        Ok(None) => {
            tracing::debug!(key, "no stored document, starting empty");
            T::default()
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read stored document, starting empty");
            T::default()
        }
    }
}

/// Serialize `doc` and overwrite `key`
///
/// Failures are logged and swallowed: the caller's in-memory state stays
/// authoritative and the next successful write catches the snapshot up.
pub fn write_document<T: Serialize>(kv: &dyn KeyValueStore, key: &str, doc: &T) -> bool {
    let result = serde_json::to_string(doc)
        .map_err(MtgError::from)
        .and_then(|json| kv.set(key, &json));

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to persist document");
            false
        }
    }
}
