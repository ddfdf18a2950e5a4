//! Two-stage CTRL-C handling.
//!
//! The first interrupt does not exit: it tells the developer the tests will
//! be re-run after [`RERUN_DELAY`] and schedules that run. A second interrupt
//! before the delay elapses exits the application, and the pending re-run is
//! abandoned.
//!
//! ```text
//!   hits=0 ──SIGINT──► prompt, hits=1 ──delay──► trigger, hits=0
//!                           │
//!                           └──SIGINT──► exit
//! ```

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use parking_lot::Mutex;
use pta_core::RERUN_DELAY;
use pta_runner::RunTrigger;

use crate::lifecycle::{ExitHandle, Signal, SignalHandler};

/// Reacts to SIGINT and SIGTERM with a delayed re-run or an exit.
pub struct InterruptHandler<T> {
    hits: Arc<Mutex<u8>>,
    watch_path: Utf8PathBuf,
    trigger: Arc<T>,
    exit: ExitHandle,
}

impl<T> std::fmt::Debug for InterruptHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptHandler")
            .field("hits", &*self.hits.lock())
            .field("watch_path", &self.watch_path)
            .finish_non_exhaustive()
    }
}

impl<T: RunTrigger> InterruptHandler<T> {
    /// Creates a handler that re-runs the tests for `watch_path` through
    /// `trigger`, and exits through `exit`.
    pub fn new(watch_path: impl Into<Utf8PathBuf>, trigger: T, exit: ExitHandle) -> Self {
        Self {
            hits: Arc::new(Mutex::new(0)),
            watch_path: watch_path.into(),
            trigger: Arc::new(trigger),
            exit,
        }
    }

    /// Returns the number of interrupts seen since the last re-run.
    #[must_use]
    pub fn hit_count(&self) -> u8 {
        *self.hits.lock()
    }

    fn schedule_rerun(&self) {
        let hits = Arc::clone(&self.hits);
        let trigger = Arc::clone(&self.trigger);
        let exit = self.exit.clone();
        let watch_path = self.watch_path.clone();

        tokio::spawn(async move {
            tokio::select! {
                () = exit.exited() => return,
                () = tokio::time::sleep(RERUN_DELAY) => {}
            }

            tracing::debug!(path = %watch_path, "Re-running tests after interrupt");
            trigger.trigger();
            *hits.lock() = 0;
        });
    }
}

impl<T: RunTrigger> SignalHandler for InterruptHandler<T> {
    fn handle_signal(&self, signal: Signal) {
        if !signal.is_interrupt() {
            tracing::debug!(?signal, "Ignoring signal");
            return;
        }

        let mut hits = self.hits.lock();
        if *hits > 0 {
            drop(hits);
            tracing::info!("Exiting");
            self.exit.exit();
            return;
        }
        *hits = 1;
        drop(hits);

        print_prompt(&rerun_prompt(RERUN_DELAY));
        self.schedule_rerun();
    }
}

/// The message shown after the first interrupt.
fn rerun_prompt(delay: Duration) -> String {
    format!(
        "Hit CTRL-C again to exit otherwise tests will be re-run in {}.",
        format_duration(delay)
    )
}

/// Formats a duration the way a developer would type it: `2s`, `1.5s`,
/// `300ms`.
fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_owned();
    }
    if duration < Duration::from_secs(1) {
        return format!("{}ms", duration.as_millis());
    }
    if duration.subsec_nanos() == 0 {
        return format!("{}s", duration.as_secs());
    }
    format!("{}s", duration.as_secs_f64())
}

fn print_prompt(prompt: &str) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{prompt}");
    let _ = handle.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingTrigger;

    fn handler() -> (InterruptHandler<Arc<CountingTrigger>>, Arc<CountingTrigger>, ExitHandle) {
        let trigger = Arc::new(CountingTrigger::default());
        let exit = ExitHandle::new();
        let handler = InterruptHandler::new("./", Arc::clone(&trigger), exit.clone());
        (handler, trigger, exit)
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_interrupt_reruns_after_delay() {
        let (handler, trigger, exit) = handler();

        handler.handle_signal(Signal::Interrupt);
        assert_eq!(handler.hit_count(), 1);

        tokio::time::sleep(RERUN_DELAY - Duration::from_millis(100)).await;
        assert_eq!(trigger.count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(trigger.count(), 1);
        assert_eq!(handler.hit_count(), 0);
        assert!(!exit.is_exiting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_interrupt_exits_without_rerun() {
        let (handler, trigger, exit) = handler();

        handler.handle_signal(Signal::Interrupt);
        tokio::time::sleep(Duration::from_millis(500)).await;
        handler.handle_signal(Signal::Interrupt);
        assert!(exit.is_exiting());

        tokio::time::sleep(RERUN_DELAY * 2).await;
        assert_eq!(trigger.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_interrupts_each_rerun() {
        let (handler, trigger, exit) = handler();

        handler.handle_signal(Signal::Interrupt);
        tokio::time::sleep(RERUN_DELAY + Duration::from_millis(500)).await;
        handler.handle_signal(Signal::Interrupt);
        tokio::time::sleep(RERUN_DELAY + Duration::from_millis(500)).await;

        assert_eq!(trigger.count(), 2);
        assert!(!exit.is_exiting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminate_behaves_like_interrupt() {
        let (handler, _trigger, exit) = handler();

        handler.handle_signal(Signal::Terminate);
        assert_eq!(handler.hit_count(), 1);
        handler.handle_signal(Signal::Terminate);
        assert!(exit.is_exiting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hangup_is_ignored() {
        let (handler, trigger, exit) = handler();

        handler.handle_signal(Signal::Hangup);
        tokio::time::sleep(RERUN_DELAY * 2).await;

        assert_eq!(handler.hit_count(), 0);
        assert_eq!(trigger.count(), 0);
        assert!(!exit.is_exiting());
    }

    #[test]
    fn test_prompt_text() {
        insta::assert_snapshot!(
            rerun_prompt(RERUN_DELAY),
            @"Hit CTRL-C again to exit otherwise tests will be re-run in 2s."
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_millis(300)), "300ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
    }
}
