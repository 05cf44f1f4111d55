use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Advisory lock on a state directory.
///
/// Held for the duration of one `tf` command so that two invocations never
/// interleave writes to the snapshot or the key-value files. The lock file is
/// left in place; the flock is released when the descriptor closes on drop.
pub struct StateLock {
    _file: File,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("state directory {path} is busy: another tf process holds the lock")]
    Busy { path: PathBuf },
}

impl StateLock {
    /// Lock `state_dir`, retrying until `timeout` elapses.
    pub fn acquire(state_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = state_dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::Create {
                path: path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Busy { path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(StateLock { _file: file })
    }

    pub fn acquire_default(state_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(state_dir, Duration::from_secs(5))
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
