//! The notification source: raw filesystem events bridged to tokio.
//!
//! The watcher loop consumes notifications through two small traits so it
//! can be driven by synthetic events in tests:
//!
//! - [`Connect`] establishes a watch on a directory and yields a source
//! - [`EventSource`] yields [`Notification`]s and can be closed
//!
//! [`NotifyConnector`] / [`NotificationSource`] are the production
//! implementations backed by the `notify` crate.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              Blocking Thread (spawn_blocking)                │
//! │  ┌────────────────────┐        ┌─────────────────────────┐  │
//! │  │ RecommendedWatcher │  ───►  │ Callback                │  │
//! │  │ (notify)           │        │ (kind + UTF-8 mapping)  │  │
//! │  └────────────────────┘        └──────┬──────────┬───────┘  │
//! └───────────────────────────────────────│──────────│──────────┘
//!                              events     │          │ errors
//!                                         ▼          ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  NotificationSource::next()  (errors take priority)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;

use camino::{Utf8Path, Utf8PathBuf};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::WatchError;
use crate::events::{ChangeKind, FileEvent};

/// Default channel capacity for file events.
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Capacity of the error channel. Any error is fatal, so one slot suffices
/// in practice; a few more keep the backend from blocking on a burst.
const ERROR_CHANNEL_CAPACITY: usize = 4;

/// One item delivered by an [`EventSource`].
#[derive(Debug)]
pub enum Notification {
    /// A file changed.
    Changed(FileEvent),
    /// The backend failed to deliver events.
    Failed(WatchError),
}

/// A stream of notifications for one watched directory.
pub trait EventSource: Send + 'static {
    /// Waits for the next notification.
    ///
    /// Returns `None` once the backend has stopped and every pending
    /// notification has been drained.
    fn next(&mut self) -> impl Future<Output = Option<Notification>> + Send;

    /// Stops watching and releases the backend.
    fn close(self) -> impl Future<Output = Result<(), WatchError>> + Send
    where
        Self: Sized;
}

/// Establishes a watch and produces an [`EventSource`].
pub trait Connect: Send + 'static {
    /// The source produced on success.
    type Source: EventSource;

    /// Starts watching `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch cannot be established.
    fn connect(self, path: &Utf8Path)
    -> impl Future<Output = Result<Self::Source, WatchError>> + Send;
}

/// Connects a [`NotificationSource`] with the given recursion mode.
#[derive(Debug, Clone, Copy)]
pub struct NotifyConnector {
    /// Whether subdirectories are watched too.
    pub recursive: bool,
}

impl Connect for NotifyConnector {
    type Source = NotificationSource;

    async fn connect(self, path: &Utf8Path) -> Result<NotificationSource, WatchError> {
        NotificationSource::watch(path, self.recursive).await
    }
}

/// A `notify`-backed [`EventSource`].
///
/// # Lifecycle
///
/// 1. [`NotificationSource::watch`] validates the path, spawns the backend on
///    the blocking pool and waits until the watch is established.
/// 2. [`EventSource::next`] yields notifications; backend errors are yielded
///    before any pending events.
/// 3. [`EventSource::close`] stops the backend and awaits it. Dropping the
///    source also signals the backend to stop, without waiting.
///
/// # Examples
///
/// ```no_run
/// use pta_watcher::{EventSource, Notification, NotificationSource};
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), pta_watcher::WatchError> {
/// let mut source = NotificationSource::watch(Utf8Path::new("./"), true).await?;
/// while let Some(notification) = source.next().await {
///     match notification {
///         Notification::Changed(event) => println!("changed: {}", event.path),
///         Notification::Failed(error) => return Err(error),
///     }
/// }
/// source.close().await
/// # }
/// ```
pub struct NotificationSource {
    /// Signals the backend thread to stop. `None` once shutdown started.
    shutdown_tx: Option<oneshot::Sender<()>>,

    /// Handle to the blocking backend task.
    task_handle: Option<JoinHandle<()>>,

    event_rx: mpsc::Receiver<FileEvent>,
    error_rx: mpsc::Receiver<WatchError>,

    /// The canonical path being watched.
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for NotificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSource")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl NotificationSource {
    /// Starts watching `path` and waits until the watch is established.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PathNotFound`] if the path doesn't exist,
    /// [`WatchError::Notify`] if the backend refuses the watch, and
    /// [`WatchError::ChannelClosed`] if the backend died during startup.
    pub async fn watch(path: &Utf8Path, recursive: bool) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::path_not_found(path));
        }
        let watch_path = path.canonicalize_utf8()?;

        let (event_tx, event_rx) = mpsc::channel(DEFAULT_CHANNEL_CAPACITY);
        let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let task_path = watch_path.clone();
        let task_handle = tokio::task::spawn_blocking(move || {
            run_backend(
                &task_path,
                recursive,
                event_tx,
                error_tx,
                ready_tx,
                shutdown_rx,
            );
        });

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => return Err(error),
            Err(_) => return Err(WatchError::ChannelClosed),
        }

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            event_rx,
            error_rx,
            watch_path,
        })
    }

    /// Returns the canonical path being watched.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` while the backend thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl EventSource for NotificationSource {
    async fn next(&mut self) -> Option<Notification> {
        tokio::select! {
            biased;
            Some(error) = self.error_rx.recv() => Some(Notification::Failed(error)),
            Some(event) = self.event_rx.recv() => Some(Notification::Changed(event)),
            else => None,
        }
    }

    async fn close(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            // The backend may already be gone.
            let _ = tx.send(());
        }

        if let Some(handle) = self.task_handle.take() {
            handle.await.map_err(|_| WatchError::ChannelClosed)?;
        }

        Ok(())
    }
}

impl Drop for NotificationSource {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Runs the notify watcher on the blocking pool until shutdown.
fn run_backend(
    path: &Utf8Path,
    recursive: bool,
    event_tx: mpsc::Sender<FileEvent>,
    error_tx: mpsc::Sender<WatchError>,
    ready_tx: oneshot::Sender<Result<(), WatchError>>,
    shutdown_rx: oneshot::Receiver<()>,
) {
    let handler = move |result: notify::Result<notify::Event>| match result {
        Ok(event) => {
            let kind = ChangeKind::from_notify(&event.kind);
            for path in event.paths {
                let path = match Utf8PathBuf::try_from(path) {
                    Ok(path) => path,
                    Err(e) => {
                        let error = WatchError::non_utf8_path(e.into_path_buf());
                        tracing::warn!(error = %error, "Skipping notification");
                        continue;
                    }
                };

                tracing::trace!(path = %path, kind = ?kind, "Raw notification");
                if event_tx.blocking_send(FileEvent::new(path, kind)).is_err() {
                    tracing::debug!("Event channel closed, dropping notification");
                    return;
                }
            }
        }
        Err(error) => {
            let _ = error_tx.blocking_send(WatchError::Notify(error));
        }
    };

    let mut watcher = match RecommendedWatcher::new(handler, notify::Config::default()) {
        Ok(watcher) => watcher,
        Err(error) => {
            let _ = ready_tx.send(Err(error.into()));
            return;
        }
    };

    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    if let Err(error) = watcher.watch(path.as_std_path(), mode) {
        let _ = ready_tx.send(Err(error.into()));
        return;
    }

    tracing::debug!(path = %path, recursive, "Notification backend started");
    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    // Hold the watcher alive until shutdown; dropping it closes the watch.
    let _ = shutdown_rx.blocking_recv();
    drop(watcher);

    tracing::debug!(path = %path, "Notification backend stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn temp_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("Invalid path");
        (dir, path)
    }

    #[tokio::test]
    async fn test_watch_establishes_and_closes() {
        let (_dir, path) = temp_dir();

        let source = NotificationSource::watch(&path, true)
            .await
            .expect("Watch should be established");
        assert!(source.is_running());
        assert!(!source.watch_path().as_str().is_empty());

        assert!(source.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_watch_missing_path_fails() {
        let result =
            NotificationSource::watch(Utf8Path::new("/nonexistent/pta/watch/path"), true).await;

        match result {
            Err(WatchError::PathNotFound(_)) => {}
            other => panic!("Expected PathNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connector_produces_source() {
        let (_dir, path) = temp_dir();

        let source = NotifyConnector { recursive: false }
            .connect(&path)
            .await
            .expect("Connector should watch");
        source.close().await.expect("Close failed");
    }

    #[tokio::test]
    async fn test_write_yields_notification_for_file() {
        let (dir, path) = temp_dir();
        let file = dir.path().join("main.go");
        fs::write(&file, "package main\n").expect("Failed to write file");

        let mut source = NotificationSource::watch(&path, true)
            .await
            .expect("Watch should be established");

        fs::write(&file, "package main\n\nfunc main() {}\n").expect("Failed to write file");

        let notification = tokio::time::timeout(Duration::from_secs(2), source.next()).await;
        source.close().await.expect("Close failed");

        // Backends differ in timing and kind granularity; only check what
        // every platform guarantees.
        if let Ok(Some(Notification::Changed(event))) = notification {
            assert!(event.path.as_str().ends_with("main.go"));
        }
    }
}
