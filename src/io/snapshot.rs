//! The simulated browser's state on disk (`browser.json`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::host::BrowserSnapshot;
use crate::io::kv_store::atomic_write;

pub const SNAPSHOT_FILE: &str = "browser.json";

/// Error type for reading or writing the browser snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path} is not a valid browser snapshot: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub fn snapshot_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SNAPSHOT_FILE)
}

/// Load the snapshot. A missing file is an empty browser.
pub fn load_snapshot(state_dir: &Path) -> Result<BrowserSnapshot, SnapshotError> {
    let path = snapshot_path(state_dir);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(BrowserSnapshot::default());
        }
        Err(e) => return Err(SnapshotError::Read { path, source: e }),
    };
    serde_json::from_str(&text).map_err(|e| SnapshotError::Parse { path, source: e })
}

pub fn save_snapshot(state_dir: &Path, snapshot: &BrowserSnapshot) -> Result<(), SnapshotError> {
    let path = snapshot_path(state_dir);
    let mut text = serde_json::to_string_pretty(snapshot).map_err(|e| SnapshotError::Parse {
        path: path.clone(),
        source: e,
    })?;
    text.push('\n');
    atomic_write(&path, text.as_bytes()).map_err(|e| SnapshotError::Write { path, source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryBrowser;
    use tempfile::TempDir;

    #[test]
    fn missing_snapshot_is_empty_browser() {
        let tmp = TempDir::new().unwrap();
        let snapshot = load_snapshot(tmp.path()).unwrap();
        assert!(snapshot.windows.is_empty());
        assert_eq!(snapshot.next_id, 1);
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let tmp = TempDir::new().unwrap();
        let mut browser = MemoryBrowser::new();
        let w = browser.external_open_window();
        browser.external_open_tab(w, "https://github.com/", "GitHub");

        save_snapshot(tmp.path(), browser.snapshot()).unwrap();
        let loaded = load_snapshot(tmp.path()).unwrap();
        assert_eq!(&loaded, browser.snapshot());
    }

    #[test]
    fn hand_written_snapshot_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            snapshot_path(tmp.path()),
            r#"{"windows":[{"id":1,"tabs":[{"id":2,"windowId":1,"index":0,"url":"https://a.com/","title":"A"}]}]}"#,
        )
        .unwrap();
        let snapshot = load_snapshot(tmp.path()).unwrap();
        assert_eq!(snapshot.windows[0].tabs[0].title, "A");
        assert!(!snapshot.windows[0].tabs[0].pinned);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(snapshot_path(tmp.path()), "{").unwrap();
        assert!(matches!(
            load_snapshot(tmp.path()),
            Err(SnapshotError::Parse { .. })
        ));
    }
}
