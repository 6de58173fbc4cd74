//! Watching the previewed source file.
//!
//! Native filesystem notifications are used when the platform provides them,
//! otherwise the file is polled. Editors that save by writing a temporary
//! file and renaming it over the original are handled by watching the parent
//! directory and filtering on the file name.

use notify::{Event as NotifyEvent, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("can not watch {0}: not a file path")]
    InvalidPath(PathBuf),
    #[error(transparent)]
    Notify(#[from] notify::Error),
}

/// A change to the watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Written, or replaced by a rename.
    Modified(PathBuf),
    Removed(PathBuf),
}

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Interval of the polling fallback.
    pub poll_interval_ms: u64,
    /// Skip native notifications and always poll.
    pub force_polling: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            force_polling: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Native,
    Polling,
}

/// Watches one source file until dropped.
#[derive(Debug)]
pub struct SourceWatcher {
    path: PathBuf,
    backend: Backend,
    events: watch::Receiver<Option<WatchEvent>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl SourceWatcher {
    pub fn new(path: &Path, config: WatcherConfig) -> Result<Self, WatchError> {
        let path = path.to_path_buf();
        let (Some(dir), Some(file_name)) = (path.parent(), path.file_name()) else {
            return Err(WatchError::InvalidPath(path.clone()));
        };
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".").to_path_buf()
        } else {
            dir.to_path_buf()
        };
        let file_name = file_name.to_os_string();

        let (event_tx, events) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let backend = if config.force_polling {
            spawn_polling(path.clone(), &config, event_tx, shutdown_rx);
            Backend::Polling
        } else {
            match spawn_native(path.clone(), dir, file_name) {
                Ok(native) => {
                    forward_native(native, event_tx, shutdown_rx);
                    Backend::Native
                }
                Err(err) => {
                    tracing::warn!(?err, path = ?path, "Native file watcher failed, falling back to polling");
                    spawn_polling(path.clone(), &config, event_tx, shutdown_rx);
                    Backend::Polling
                }
            }
        };

        tracing::info!(path = ?path, ?backend, "Watching source file");

        Ok(Self {
            path,
            backend,
            events,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Wait for the next change.
    ///
    /// Changes that happen while nobody waits are coalesced into the latest
    /// one. Returns `None` once the watcher stopped.
    pub async fn changed(&mut self) -> Option<WatchEvent> {
        loop {
            self.events.changed().await.ok()?;
            if let Some(event) = self.events.borrow_and_update().clone() {
                return Some(event);
            }
        }
    }
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

struct NativeWatcher {
    watcher: RecommendedWatcher,
    raw_rx: mpsc::Receiver<WatchEvent>,
}

fn spawn_native(
    path: PathBuf,
    dir: PathBuf,
    file_name: std::ffi::OsString,
) -> Result<NativeWatcher, WatchError> {
    let (raw_tx, raw_rx) = mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| match res {
            Ok(event) => {
                if !event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()))
                {
                    return;
                }
                let change = if event.kind.is_remove() {
                    WatchEvent::Removed(path.clone())
                } else if event.kind.is_modify() || event.kind.is_create() {
                    WatchEvent::Modified(path.clone())
                } else {
                    return;
                };
                let _ = raw_tx.send(change);
            }
            Err(err) => tracing::error!(?err, "File watcher error"),
        },
        notify::Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;

    Ok(NativeWatcher { watcher, raw_rx })
}

// The notify watcher lives on this thread until shutdown.
fn forward_native(
    native: NativeWatcher,
    event_tx: watch::Sender<Option<WatchEvent>>,
    shutdown_rx: mpsc::Receiver<()>,
) {
    std::thread::spawn(move || {
        let NativeWatcher { watcher, raw_rx } = native;
        loop {
            match raw_rx.recv_timeout(Duration::from_millis(200)) {
                Ok(event) => {
                    if event_tx.send(Some(event)).is_err() {
                        break;
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
            match shutdown_rx.try_recv() {
                Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
                Err(mpsc::TryRecvError::Empty) => {}
            }
        }
        drop(watcher);
        tracing::debug!("Native file watcher stopped");
    });
}

/// Modification time and length, `None` while the file is missing.
fn fingerprint(path: &Path) -> Option<(Option<SystemTime>, u64)> {
    let metadata = std::fs::metadata(path).ok()?;
    Some((metadata.modified().ok(), metadata.len()))
}

fn spawn_polling(
    path: PathBuf,
    config: &WatcherConfig,
    event_tx: watch::Sender<Option<WatchEvent>>,
    shutdown_rx: mpsc::Receiver<()>,
) {
    let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));

    std::thread::spawn(move || {
        let mut last = fingerprint(&path);
        loop {
            match shutdown_rx.recv_timeout(poll_interval) {
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {}
            }

            let current = fingerprint(&path);
            if current == last {
                continue;
            }
            let event = match current {
                Some(_) => WatchEvent::Modified(path.clone()),
                None => WatchEvent::Removed(path.clone()),
            };
            last = current;
            if event_tx.send(Some(event)).is_err() {
                break;
            }
        }
        tracing::debug!(path = ?path, "Polling file watcher stopped");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_config_default() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval_ms, 1000);
        assert!(!config.force_polling);
    }

    #[test]
    fn test_invalid_path() {
        let err = SourceWatcher::new(Path::new("/"), WatcherConfig::default()).unwrap_err();
        assert!(matches!(err, WatchError::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_polling_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# one").unwrap();

        let config = WatcherConfig {
            poll_interval_ms: 10,
            force_polling: true,
        };
        let mut watcher = SourceWatcher::new(&path, config).unwrap();
        assert_eq!(watcher.backend(), Backend::Polling);
        assert_eq!(watcher.path(), path);

        std::fs::write(&path, "# one\n\nand two").unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), watcher.changed())
            .await
            .unwrap();
        assert_eq!(event, Some(WatchEvent::Modified(path.clone())));

        std::fs::remove_file(&path).unwrap();
        let event = tokio::time::timeout(Duration::from_secs(5), watcher.changed())
            .await
            .unwrap();
        assert_eq!(event, Some(WatchEvent::Removed(path)));
    }
}
