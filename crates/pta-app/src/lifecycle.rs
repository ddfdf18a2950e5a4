//! Process lifecycle: registered units, OS signals, and graceful exit.
//!
//! An [`Application`] owns a set of long-running units ([`Runnable`]) and a
//! set of [`SignalHandler`]s. [`Application::run`] starts every unit, fans
//! each incoming OS signal out to the handlers, and blocks until one of:
//!
//! - [`ExitHandle::exit`] is called (normally by a signal handler)
//! - a unit fails
//! - every unit has finished on its own
//!
//! On the way out every unit still running is terminated through its
//! [`LoopControl`] and awaited.
//!
//! ```text
//!   OS signals ──► SignalStream ──► SignalHandler(s) ──► ExitHandle::exit()
//!                                                              │
//!   Application::run ◄──────────────── cancelled ──────────────┘
//!        │
//!        └──► LoopControl::terminate() ──► unit acks ──► join
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

/// A signal delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT, or CTRL-C on platforms without Unix signals.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    Hangup,
}

impl Signal {
    /// Returns `true` for signals that ask the process to stop.
    #[must_use]
    pub const fn is_interrupt(self) -> bool {
        matches!(self, Self::Interrupt | Self::Terminate)
    }
}

/// Receives every signal the application observes.
pub trait SignalHandler: Send + Sync + 'static {
    /// Reacts to `signal`. Must not block.
    fn handle_signal(&self, signal: Signal);
}

impl<T: SignalHandler + ?Sized> SignalHandler for Arc<T> {
    fn handle_signal(&self, signal: Signal) {
        (**self).handle_signal(signal);
    }
}

/// A stream of incoming signals.
pub trait SignalStream: Send {
    /// Waits for the next signal. `None` means no more signals will arrive.
    fn recv(&mut self) -> impl Future<Output = Option<Signal>> + Send;
}

impl SignalStream for mpsc::Receiver<Signal> {
    async fn recv(&mut self) -> Option<Signal> {
        mpsc::Receiver::recv(self).await
    }
}

/// Signals delivered by the operating system.
#[derive(Debug)]
pub struct OsSignals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(unix)]
    hangup: tokio::signal::unix::Signal,
}

impl OsSignals {
    /// Installs handlers for SIGINT, SIGTERM and SIGHUP.
    ///
    /// Once installed, these signals no longer terminate the process by
    /// default; they are only reported through [`SignalStream::recv`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Signal`] if a handler cannot be registered.
    #[cfg(unix)]
    pub fn new() -> Result<Self, AppError> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(AppError::Signal)?,
            terminate: signal(SignalKind::terminate()).map_err(AppError::Signal)?,
            hangup: signal(SignalKind::hangup()).map_err(AppError::Signal)?,
        })
    }

    /// Listens for CTRL-C.
    ///
    /// # Errors
    ///
    /// Never fails on this platform.
    #[cfg(not(unix))]
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {})
    }
}

impl SignalStream for OsSignals {
    #[cfg(unix)]
    async fn recv(&mut self) -> Option<Signal> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some(Signal::Interrupt),
            Some(()) = self.terminate.recv() => Some(Signal::Terminate),
            Some(()) = self.hangup.recv() => Some(Signal::Hangup),
            else => None,
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) -> Option<Signal> {
        tokio::signal::ctrl_c().await.ok().map(|()| Signal::Interrupt)
    }
}

/// Requests application shutdown. Cloning shares the same exit state.
#[derive(Debug, Clone, Default)]
pub struct ExitHandle {
    token: CancellationToken,
}

impl ExitHandle {
    /// Creates a handle that has not been triggered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the application to shut down. Idempotent.
    pub fn exit(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`exit`](Self::exit) has been called.
    #[must_use]
    pub fn is_exiting(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once [`exit`](Self::exit) has been called.
    pub async fn exited(&self) {
        self.token.cancelled().await;
    }
}

/// Acknowledges one control request. Dropping it without acknowledging
/// makes the requester see [`AppError::ChannelClosed`].
#[derive(Debug)]
pub struct Ack(oneshot::Sender<()>);

impl Ack {
    /// Tells the requester the request has been handled.
    pub fn acknowledge(self) {
        // The requester may have given up waiting.
        let _ = self.0.send(());
    }
}

/// The requesting side of a unit's pause and terminate handshakes.
#[derive(Debug, Clone)]
pub struct LoopControl {
    pause: mpsc::Sender<Ack>,
    terminate: mpsc::Sender<Ack>,
}

/// The unit side of the handshakes, polled from the unit's own loop.
#[derive(Debug)]
pub struct ControlReceivers {
    /// Pause requests.
    pub pause: mpsc::Receiver<Ack>,
    /// Terminate requests.
    pub terminate: mpsc::Receiver<Ack>,
}

/// Creates a connected [`LoopControl`] and [`ControlReceivers`] pair.
#[must_use]
pub fn control_channel() -> (LoopControl, ControlReceivers) {
    let (pause_tx, pause_rx) = mpsc::channel(1);
    let (terminate_tx, terminate_rx) = mpsc::channel(1);
    (
        LoopControl {
            pause: pause_tx,
            terminate: terminate_tx,
        },
        ControlReceivers {
            pause: pause_rx,
            terminate: terminate_rx,
        },
    )
}

impl LoopControl {
    /// Asks the unit to pause and waits for the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ChannelClosed`] if the unit has stopped.
    pub async fn pause(&self) -> Result<(), AppError> {
        request(&self.pause).await
    }

    /// Asks the unit to stop and waits until it has released its resources.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ChannelClosed`] if the unit has stopped.
    pub async fn terminate(&self) -> Result<(), AppError> {
        request(&self.terminate).await
    }
}

async fn request(tx: &mpsc::Sender<Ack>) -> Result<(), AppError> {
    let (ack_tx, ack_rx) = oneshot::channel();
    tx.send(Ack(ack_tx))
        .await
        .map_err(|_| AppError::ChannelClosed)?;
    ack_rx.await.map_err(|_| AppError::ChannelClosed)
}

/// A long-running unit owned by the [`Application`].
pub trait Runnable: Send + 'static {
    /// Returns a control handle for the unit's handshakes.
    fn control(&self) -> LoopControl;

    /// Runs the unit until it finishes, fails, or is terminated.
    fn run(self: Box<Self>) -> BoxFuture<'static, Result<(), AppError>>;
}

/// Owns the registered units and drives them until exit.
#[derive(Default)]
pub struct Application {
    units: Vec<(String, Box<dyn Runnable>)>,
    handlers: Vec<Arc<dyn SignalHandler>>,
    exit: ExitHandle,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field(
                "units",
                &self.units.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            )
            .field("handlers", &self.handlers.len())
            .field("exiting", &self.exit.is_exiting())
            .finish()
    }
}

impl Application {
    /// Creates an application with no units or handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle that makes [`run`](Self::run) return.
    #[must_use]
    pub fn exit_handle(&self) -> ExitHandle {
        self.exit.clone()
    }

    /// Adds a unit to be started by [`run`](Self::run).
    pub fn register(&mut self, name: impl Into<String>, unit: impl Runnable) {
        self.units.push((name.into(), Box::new(unit)));
    }

    /// Adds a handler that receives every observed signal.
    pub fn install_signal_handler(&mut self, handler: impl SignalHandler) {
        self.handlers.push(Arc::new(handler));
    }

    /// Runs until exit, listening to OS signals.
    ///
    /// # Errors
    ///
    /// Returns the first unit failure, or [`AppError::Signal`] if the OS
    /// signal handlers cannot be installed.
    pub async fn run(self) -> Result<(), AppError> {
        let signals = OsSignals::new()?;
        self.run_with(signals).await
    }

    /// Runs until exit, taking signals from `signals`.
    ///
    /// # Errors
    ///
    /// Returns the first unit failure.
    pub async fn run_with(self, mut signals: impl SignalStream) -> Result<(), AppError> {
        let Self {
            units,
            handlers,
            exit,
        } = self;

        let mut tasks = JoinSet::new();
        let mut controls = Vec::with_capacity(units.len());
        for (name, unit) in units {
            tracing::debug!(unit = %name, "Starting unit");
            controls.push((name.clone(), unit.control()));
            let future = AssertUnwindSafe(unit.run()).catch_unwind();
            tasks.spawn(async move {
                let result = future.await.unwrap_or_else(|_| {
                    Err(AppError::UnitAborted {
                        name: name.clone(),
                        reason: "panicked".to_owned(),
                    })
                });
                (name, result)
            });
        }

        let outcome = loop {
            tokio::select! {
                () = exit.exited() => {
                    tracing::debug!("Exit requested");
                    break Ok(());
                }
                Some(signal) = signals.recv() => {
                    tracing::debug!(?signal, "Received signal");
                    for handler in &handlers {
                        handler.handle_signal(signal);
                    }
                }
                Some(joined) = tasks.join_next() => match joined {
                    Ok((name, Ok(()))) => {
                        tracing::debug!(unit = %name, "Unit finished");
                        if tasks.is_empty() {
                            break Ok(());
                        }
                    }
                    Ok((name, Err(error))) => {
                        tracing::error!(unit = %name, %error, "Unit failed");
                        break Err(error);
                    }
                    Err(join_error) => {
                        break Err(AppError::UnitAborted {
                            name: "<cancelled>".to_owned(),
                            reason: join_error.to_string(),
                        });
                    }
                },
            }
        };

        for (name, control) in &controls {
            match control.terminate().await {
                Ok(()) => tracing::debug!(unit = %name, "Unit terminated"),
                Err(_) => tracing::trace!(unit = %name, "Unit already stopped"),
            }
        }
        while let Some(joined) = tasks.join_next().await {
            if let Ok((name, Err(error))) = joined {
                tracing::warn!(unit = %name, %error, "Unit failed during shutdown");
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A unit that idles until terminated, or fails on request.
    struct IdleUnit {
        control: LoopControl,
        receivers: ControlReceivers,
        fail: bool,
        terminated: Arc<AtomicBool>,
    }

    impl IdleUnit {
        fn new(fail: bool) -> (Self, Arc<AtomicBool>) {
            let (control, receivers) = control_channel();
            let terminated = Arc::new(AtomicBool::new(false));
            let unit = Self {
                control,
                receivers,
                fail,
                terminated: Arc::clone(&terminated),
            };
            (unit, terminated)
        }
    }

    impl Runnable for IdleUnit {
        fn control(&self) -> LoopControl {
            self.control.clone()
        }

        fn run(self: Box<Self>) -> BoxFuture<'static, Result<(), AppError>> {
            Box::pin(async move {
                let Self {
                    mut receivers,
                    fail,
                    terminated,
                    ..
                } = *self;
                if fail {
                    return Err(AppError::ChannelClosed);
                }
                loop {
                    tokio::select! {
                        Some(ack) = receivers.pause.recv() => ack.acknowledge(),
                        Some(ack) = receivers.terminate.recv() => {
                            terminated.store(true, Ordering::SeqCst);
                            ack.acknowledge();
                            return Ok(());
                        }
                        else => return Ok(()),
                    }
                }
            })
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Signal>>,
        exit_on: Option<(Signal, ExitHandle)>,
    }

    impl SignalHandler for Recorder {
        fn handle_signal(&self, signal: Signal) {
            self.seen.lock().push(signal);
            match &self.exit_on {
                Some((trigger, exit)) if *trigger == signal => exit.exit(),
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn test_exit_handle_terminates_units() {
        let mut app = Application::new();
        let (unit, terminated) = IdleUnit::new(false);
        app.register("idle", unit);

        let exit = app.exit_handle();
        let (_tx, rx) = mpsc::channel::<Signal>(1);
        let run = tokio::spawn(app.run_with(rx));

        exit.exit();
        let result = run.await.expect("run task panicked");

        assert!(result.is_ok());
        assert!(terminated.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unit_failure_is_returned() {
        let mut app = Application::new();
        let (failing, _) = IdleUnit::new(true);
        let (idle, idle_terminated) = IdleUnit::new(false);
        app.register("failing", failing);
        app.register("idle", idle);

        let (_tx, rx) = mpsc::channel::<Signal>(1);
        let result = app.run_with(rx).await;

        assert!(matches!(result, Err(AppError::ChannelClosed)));
        assert!(idle_terminated.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_signals_reach_every_handler() {
        let mut app = Application::new();
        let (unit, _) = IdleUnit::new(false);
        app.register("idle", unit);

        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            exit_on: Some((Signal::Terminate, app.exit_handle())),
        });
        app.install_signal_handler(Arc::clone(&first));
        app.install_signal_handler(Arc::clone(&second));

        let (tx, rx) = mpsc::channel(4);
        tx.send(Signal::Hangup).await.expect("send");
        tx.send(Signal::Interrupt).await.expect("send");
        tx.send(Signal::Terminate).await.expect("send");

        app.run_with(rx).await.expect("run should exit cleanly");

        let expected = [Signal::Hangup, Signal::Interrupt, Signal::Terminate];
        assert_eq!(*first.seen.lock(), expected);
        assert_eq!(*second.seen.lock(), expected);
    }

    #[tokio::test]
    async fn test_pause_handshake_is_acknowledged() {
        let (unit, _) = IdleUnit::new(false);
        let control = unit.control();
        let task = tokio::spawn(Box::new(unit).run());

        control.pause().await.expect("pause should be acknowledged");
        control.terminate().await.expect("terminate should be acknowledged");
        task.await.expect("unit panicked").expect("unit failed");

        assert!(matches!(control.pause().await, Err(AppError::ChannelClosed)));
    }

    #[test]
    fn test_interrupt_classification() {
        assert!(Signal::Interrupt.is_interrupt());
        assert!(Signal::Terminate.is_interrupt());
        assert!(!Signal::Hangup.is_interrupt());
    }

    #[test]
    fn test_exit_handle_clones_share_state() {
        let exit = ExitHandle::new();
        let clone = exit.clone();
        assert!(!clone.is_exiting());
        exit.exit();
        exit.exit();
        assert!(clone.is_exiting());
    }
}
