//! The watcher loop: baseline run, then one run per accepted change.
//!
//! ```text
//!   start ──► trigger (baseline) ──► connect ──► Start watching path
//!                                       │
//!                                       ▼
//!          ┌──────────── select ◄───────────────┐
//!          │ terminate │ notification │ pause   │
//!          ▼           ▼              ▼         │
//!     close source  debounce ──► trigger   ack ─┘
//!     ack, return
//! ```
//!
//! Failing to establish the watch, a backend error, or the source closing on
//! its own are fatal to the loop and end the application.

use camino::Utf8PathBuf;
use futures_util::future::BoxFuture;
use pta_runner::RunTrigger;
use pta_watcher::{Connect, DebounceFilter, EventSource, FileFilter, Notification, WatchError};

use crate::error::AppError;
use crate::lifecycle::{ControlReceivers, LoopControl, Runnable, control_channel};

/// Runs the tests whenever a tracked file under the watched path changes.
pub struct WatcherLoop<T, C, F> {
    watch_path: Utf8PathBuf,
    trigger: T,
    connector: C,
    debounce: DebounceFilter<F>,
    control: LoopControl,
    receivers: ControlReceivers,
}

impl<T, C, F> std::fmt::Debug for WatcherLoop<T, C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherLoop")
            .field("watch_path", &self.watch_path)
            .finish_non_exhaustive()
    }
}

impl<T, C, F> WatcherLoop<T, C, F>
where
    T: RunTrigger,
    C: Connect,
    F: FileFilter,
{
    /// Creates a loop watching `watch_path` through `connector`.
    pub fn new(
        watch_path: impl Into<Utf8PathBuf>,
        trigger: T,
        connector: C,
        debounce: DebounceFilter<F>,
    ) -> Self {
        let (control, receivers) = control_channel();
        Self {
            watch_path: watch_path.into(),
            trigger,
            connector,
            debounce,
            control,
            receivers,
        }
    }

    async fn run_loop(self) -> Result<(), AppError> {
        let Self {
            watch_path,
            trigger,
            connector,
            debounce,
            mut receivers,
            ..
        } = self;

        // Baseline run so the developer sees the current state immediately.
        trigger.trigger();

        let mut source = connector.connect(&watch_path).await?;
        tracing::info!(path = %watch_path, "Start watching path");

        loop {
            tokio::select! {
                biased;

                Some(ack) = receivers.terminate.recv() => {
                    source.close().await?;
                    ack.acknowledge();
                    tracing::debug!(path = %watch_path, "Stopped watching path");
                    return Ok(());
                }

                notification = source.next() => match notification {
                    Some(Notification::Changed(event)) => {
                        if debounce.evaluate(&event).is_accepted() {
                            tracing::info!(path = %event.path, "Run the tests");
                            trigger.trigger();
                        }
                    }
                    Some(Notification::Failed(error)) if error.is_recoverable() => {
                        tracing::warn!(%error, "Skipping notification");
                    }
                    Some(Notification::Failed(error)) => return Err(error.into()),
                    None => return Err(WatchError::ChannelClosed.into()),
                },

                Some(ack) = receivers.pause.recv() => {
                    tracing::debug!("Watcher loop paused");
                    ack.acknowledge();
                }
            }
        }
    }
}

impl<T, C, F> Runnable for WatcherLoop<T, C, F>
where
    T: RunTrigger,
    C: Connect,
    F: FileFilter,
{
    fn control(&self) -> LoopControl {
        self.control.clone()
    }

    fn run(self: Box<Self>) -> BoxFuture<'static, Result<(), AppError>> {
        Box::pin(self.run_loop())
    }
}
