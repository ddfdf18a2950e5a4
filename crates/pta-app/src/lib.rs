//! pta-app: wiring for the pta test auto-runner.
//!
//! This crate connects the watcher, the debounce policy, and the test
//! executor into a running application:
//!
//! - [`lifecycle`]: registered units, OS signal fan-out, graceful exit
//! - [`watch_loop`]: baseline run, then one run per accepted change
//! - [`interrupt`]: first CTRL-C re-runs the tests, second one exits
//!
//! [`run`] builds the production wiring from a validated [`Config`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod interrupt;
pub mod lifecycle;
pub mod watch_loop;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use pta_core::Config;
use pta_runner::TestExecutor;
use pta_watcher::{DebounceFilter, EventStore, NotifyConnector, SuffixFilter};

pub use error::AppError;
pub use interrupt::InterruptHandler;
pub use lifecycle::{
    Ack, Application, ControlReceivers, ExitHandle, LoopControl, OsSignals, Runnable, Signal,
    SignalHandler, SignalStream, control_channel,
};
pub use watch_loop::WatcherLoop;

/// Name under which the watcher loop is registered.
pub const WATCHER_LOOP: &str = "Watcher Loop";

/// Runs the auto-runner for `config` until the developer exits.
///
/// The tests run once immediately, then again whenever a tracked file under
/// the watched path changes.
///
/// # Errors
///
/// Returns an error if the watch cannot be established, the notification
/// backend fails, or signal handlers cannot be installed. Test failures are
/// not errors.
pub async fn run(config: Config) -> Result<(), AppError> {
    let executor = TestExecutor::from_config(&config);
    let debounce = DebounceFilter::new(
        SuffixFilter::new(&config.watch.extension),
        Arc::new(EventStore::new()),
    );
    let connector = NotifyConnector {
        recursive: config.watch.recursive,
    };

    let mut app = Application::new();
    let watcher = WatcherLoop::new(
        config.watch.path.clone(),
        executor.clone(),
        connector,
        debounce,
    );
    let interrupts = InterruptHandler::new(config.watch.path, executor, app.exit_handle());

    app.register(WATCHER_LOOP, watcher);
    app.install_signal_handler(interrupts);

    tracing::debug!(
        program = %config.runner.program,
        extension = %config.watch.extension,
        "Application configured"
    );
    app.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingTrigger, FakeConnector};
    use camino::Utf8PathBuf;
    use pta_watcher::{ChangeKind, FileEvent, Notification};
    use std::sync::atomic::Ordering;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_double_interrupt_shuts_down_watcher() {
        let trigger = Arc::new(CountingTrigger::default());
        let (connector, events, closed) = FakeConnector::ready();
        let debounce = DebounceFilter::new(SuffixFilter::default(), Arc::new(EventStore::new()));

        let mut app = Application::new();
        let watcher = WatcherLoop::new("./", Arc::clone(&trigger), connector, debounce);
        let interrupts = InterruptHandler::new("./", Arc::clone(&trigger), app.exit_handle());
        let control = watcher.control();
        app.register(WATCHER_LOOP, watcher);
        app.install_signal_handler(interrupts);

        let (signals, rx) = mpsc::channel(4);
        let run = tokio::spawn(app.run_with(rx));

        let event = FileEvent::with_timestamp(
            Utf8PathBuf::from("main.go"),
            ChangeKind::Modify,
            Instant::now(),
        );
        events
            .send(Notification::Changed(event))
            .await
            .expect("loop stopped");
        control.pause().await.expect("pause should be acknowledged");
        assert_eq!(trigger.count(), 2);

        signals.send(Signal::Interrupt).await.expect("app stopped");
        tokio::time::sleep(Duration::from_millis(100)).await;
        signals.send(Signal::Interrupt).await.expect("app stopped");

        run.await.expect("app panicked").expect("app failed");
        assert!(closed.load(Ordering::SeqCst));
        assert_eq!(trigger.count(), 2);
    }

    #[tokio::test]
    async fn test_missing_directory_is_fatal() {
        let mut config = Config::default();
        config.watch.path = Utf8PathBuf::from("/nonexistent/pta/project");
        config.runner.program = "true".to_owned();

        let result = run(config).await;
        assert!(matches!(result, Err(AppError::Watcher(_))));
    }
}
