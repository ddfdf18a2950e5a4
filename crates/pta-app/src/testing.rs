//! Fakes shared by the unit tests of this crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use camino::Utf8Path;
use pta_runner::RunTrigger;
use pta_watcher::{Connect, EventSource, Notification, WatchError};
use tokio::sync::mpsc;

/// Counts trigger calls and always reports a started run.
#[derive(Debug, Default)]
pub(crate) struct CountingTrigger {
    count: AtomicUsize,
}

impl CountingTrigger {
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RunTrigger for CountingTrigger {
    fn trigger(&self) -> bool {
        self.count.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// An event source fed by a channel.
#[derive(Debug)]
pub(crate) struct FakeSource {
    rx: mpsc::Receiver<Notification>,
    closed: Arc<AtomicBool>,
}

impl EventSource for FakeSource {
    async fn next(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    async fn close(self) -> Result<(), WatchError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out one [`FakeSource`], or refuses to watch.
#[derive(Debug)]
pub(crate) enum FakeConnector {
    Ready(FakeSource),
    Refuse,
}

impl FakeConnector {
    /// Returns a connector, the sender feeding its source, and a flag set
    /// when the source is closed.
    pub(crate) fn ready() -> (Self, mpsc::Sender<Notification>, Arc<AtomicBool>) {
        let (tx, rx) = mpsc::channel(16);
        let closed = Arc::new(AtomicBool::new(false));
        let source = FakeSource {
            rx,
            closed: Arc::clone(&closed),
        };
        (Self::Ready(source), tx, closed)
    }
}

impl Connect for FakeConnector {
    type Source = FakeSource;

    async fn connect(self, path: &Utf8Path) -> Result<FakeSource, WatchError> {
        match self {
            Self::Ready(source) => Ok(source),
            Self::Refuse => Err(WatchError::path_not_found(path)),
        }
    }
}
