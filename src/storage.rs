//! Durable key-value persistence.
//!
//! All client state (the active session, the CRM mirror, the marketplace
//! collections) lives behind the [`Storage`] trait so stores depend on the
//! abstraction, not a concrete backend. [`FileStorage`] keeps one JSON file
//! per key under a directory; [`MemoryStorage`] is the non-persisted mode
//! and the test substrate.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::Error;

/// Storage key for the active session record.
pub const SESSION_KEY: &str = "session";
/// Storage key for the CRM mirror database.
pub const CRM_KEY: &str = "crm_mirror";
/// Storage key for the listings collection.
pub const LISTINGS_KEY: &str = "listings";
/// Storage key for the jobs collection.
pub const JOBS_KEY: &str = "jobs";
/// Storage key for the blog posts collection.
pub const POSTS_KEY: &str = "posts";

/// Abstraction over a durable key-value backend.
///
/// Reads are fail-safe: a missing, unreadable, or corrupt record is `None`,
/// never an error. Writes report failure so the single writer of a record
/// can decide whether to surface it.
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn read(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove the value stored under `key`. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Read and deserialize the record under `key`.
///
/// An unparsable record reads as `None`, per the fail-safe policy.
pub fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = storage.read(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(key, %err, "discarding unparsable stored record");
            None
        }
    }
}

/// Serialize and write `value` under `key`.
pub fn write_json<T: Serialize>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), Error> {
    let raw = serde_json::to_string(value)?;
    storage.write(key, &raw)
}

/// File-backed storage: one `<key>.json` file per key under a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (creating if necessary) a storage directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|err| Error::storage(format!("create {}: {}", dir.display(), err)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        fs::write(self.path_for(key), value)
            .map_err(|err| Error::storage(format!("write {}: {}", key, err)))
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::storage(format!("remove {}: {}", key, err))),
        }
    }
}

/// In-memory storage. State lasts for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<(), Error> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("session", r#"{"id":"u1"}"#).unwrap();
        assert_eq!(storage.read("session").unwrap(), r#"{"id":"u1"}"#);

        storage.remove("session").unwrap();
        assert!(storage.read("session").is_none());
        // removing twice is fine
        storage.remove("session").unwrap();
    }

    #[test]
    fn corrupt_record_reads_as_none() {
        let storage = MemoryStorage::new();
        storage.write("session", "{not json").unwrap();

        let parsed: Option<serde_json::Value> = read_json(&storage, "session");
        assert!(parsed.is_none());
    }
}
