use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches the browser snapshot file for edits made by other processes.
pub struct SnapshotWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<()>,
}

impl SnapshotWatcher {
    /// Watch `snapshot`. The parent directory is watched so that atomic
    /// replace-by-rename writes are seen too.
    pub fn start(snapshot: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let target: PathBuf = snapshot.to_path_buf();
        let dir = snapshot
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                if event.paths.iter().any(|p| p.file_name() == target.file_name()) {
                    let _ = tx.send(());
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(SnapshotWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Block up to `timeout` for a change, then swallow the rest of the burst
    /// arriving within `debounce`. Returns whether anything changed.
    pub fn wait(&self, timeout: Duration, debounce: Duration) -> bool {
        if self.rx.recv_timeout(timeout).is_err() {
            return false;
        }
        while self.rx.recv_timeout(debounce).is_ok() {}
        true
    }
}
