//! Per-window persisted organization state.
//!
//! Both stores keep their in-memory copy authoritative. Persistence failures
//! are recorded as status values and logged, never returned as errors.

pub mod collapse;
pub mod session;

pub use collapse::CollapseStore;
pub use session::{SessionError, SessionStore};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::io::kv_store::KeyValueStore;

/// Result of reading a persisted record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    /// Nothing stored under the key yet
    Missing,
    /// Stored value could not be decoded; defaults substituted
    Corrupt(String),
    /// Backend read failed; defaults substituted
    Unavailable(String),
}

/// Result of the most recent best-effort write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// No write attempted yet
    Clean,
    Saved,
    Failed(String),
}

impl SaveStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SaveStatus::Failed(_))
    }
}

/// Read and decode `key`, falling back to `T::default()` on any failure.
pub(crate) fn load_record<T>(kv: &dyn KeyValueStore, key: &str) -> (T, LoadStatus)
where
    T: DeserializeOwned + Default,
{
    match kv.get(key) {
        Ok(None) => (T::default(), LoadStatus::Missing),
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(record) => (record, LoadStatus::Loaded),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable record");
                (T::default(), LoadStatus::Corrupt(e.to_string()))
            }
        },
        Err(e) => {
            warn!(key, error = %e, "store read failed, using defaults");
            (T::default(), LoadStatus::Unavailable(e.to_string()))
        }
    }
}

/// Encode and write `record` under `key`, reporting rather than propagating failure.
pub(crate) fn save_record<T: Serialize>(
    kv: &mut dyn KeyValueStore,
    key: &str,
    record: &T,
) -> SaveStatus {
    let value = match serde_json::to_value(record) {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "could not encode record");
            return SaveStatus::Failed(e.to_string());
        }
    };
    match kv.set(key, &value) {
        Ok(()) => SaveStatus::Saved,
        Err(e) => {
            warn!(key, error = %e, "store write failed");
            SaveStatus::Failed(e.to_string())
        }
    }
}
