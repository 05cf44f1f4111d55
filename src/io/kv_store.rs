use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

/// Error type for key-value persistence
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("could not encode value for {key}: {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable key-value backend.
///
/// Missing keys read as `Ok(None)`. Callers decide how to degrade on `Err`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError>;
}

/// Key for a window's session record
pub fn session_key(window_id: u64) -> String {
    format!("tabfold.sessions.{}", window_id)
}

/// Key for a window's collapse record
pub fn collapse_key(window_id: u64) -> String {
    format!("tabfold.collapse.{}", window_id)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory store with switchable read/write failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw value, bypassing failure injection
    pub fn insert_raw(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Unavailable(format!("read of {} refused", key)));
        }
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable(format!("write of {} refused", key)));
        }
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '.'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };
        serde_json::from_str(&content).map(Some).map_err(|e| StoreError::Io {
            path,
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(value).map_err(|e| StoreError::Serialize {
            key: key.to_string(),
            source: e,
        })?;
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        let path = self.path_for(key);
        atomic_write(&path, content.as_bytes()).map_err(|e| StoreError::Io { path, source: e })
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = FileStore::new(dir.path().join("store"));
        let value = json!({"github.com": true});

        store.set(&collapse_key(7), &value).unwrap();
        assert_eq!(store.get(&collapse_key(7)).unwrap(), Some(value));
        assert!(dir.path().join("store/tabfold.collapse.7.json").exists());
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("absent").unwrap().is_none());
    }

    #[test]
    fn file_store_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        fs::write(dir.path().join("tabfold.sessions.1.json"), "not json {{{").unwrap();
        assert!(store.get(&session_key(1)).is_err());
    }

    #[test]
    fn memory_store_failure_injection() {
        let mut store = MemoryStore::new();
        store.set("k", &json!(1)).unwrap();
        store.fail_reads = true;
        assert!(store.get("k").is_err());
        store.fail_reads = false;
        store.fail_writes = true;
        assert!(store.set("k", &json!(2)).is_err());
        assert_eq!(store.get("k").unwrap(), Some(json!(1)));
    }
}
