//! Asynchronous test command execution under the run guard.
//!
//! [`TestExecutor::try_run`] claims the [`RunGuard`], spawns a tokio task
//! that runs `<program> <args...>` in the watched directory, prints the
//! combined output when the command finishes, and releases the guard. A
//! request that finds a run in flight is dropped.
//!
//! Command failures (spawn errors, non-zero exits) are logged and reported
//! in the returned [`RunReport`]; they never propagate further.

use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use pta_core::Config;
use tokio::task::JoinHandle;

use crate::capture::{command, run_combined};
use crate::error::RunError;
use crate::guard::RunGuard;

/// Something that can be asked to start a test run.
///
/// The watcher loop and the interrupt handler only need this capability,
/// which lets tests substitute a counting fake for [`TestExecutor`].
pub trait RunTrigger: Send + Sync + 'static {
    /// Requests a run. Returns `true` if a run was started, `false` if the
    /// request was dropped because one is already in flight.
    fn trigger(&self) -> bool;
}

impl<T: RunTrigger + ?Sized> RunTrigger for Arc<T> {
    fn trigger(&self) -> bool {
        (**self).trigger()
    }
}

/// The outcome of one test command invocation.
#[derive(Debug)]
pub struct RunReport {
    /// Stdout and stderr, interleaved.
    pub output: Vec<u8>,

    /// `Ok` if the command exited successfully.
    pub result: Result<(), RunError>,
}

impl RunReport {
    /// Returns `true` if the command ran and exited successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the captured output as text, replacing invalid UTF-8.
    #[must_use]
    pub fn output_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }
}

/// Spawns the test command, at most one at a time.
///
/// Cloning is cheap; clones share the same [`RunGuard`].
///
/// # Examples
///
/// ```no_run
/// use pta_core::Config;
/// use pta_runner::TestExecutor;
///
/// # async fn example() {
/// let executor = TestExecutor::from_config(&Config::default());
/// if let Some(run) = executor.try_run() {
///     let report = run.await.expect("run task panicked");
///     println!("success: {}", report.is_success());
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TestExecutor {
    guard: Arc<RunGuard>,
    working_dir: Utf8PathBuf,
    program: Arc<str>,
    args: Arc<[String]>,
    print_output: bool,
}

impl TestExecutor {
    /// Creates an executor running `program args...` in `working_dir`.
    pub fn new(
        guard: Arc<RunGuard>,
        working_dir: impl Into<Utf8PathBuf>,
        program: &str,
        args: Vec<String>,
    ) -> Self {
        Self {
            guard,
            working_dir: working_dir.into(),
            program: Arc::from(program),
            args: Arc::from(args),
            print_output: true,
        }
    }

    /// Creates an executor for the configured test command with a fresh guard.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(RunGuard::new()),
            config.watch.path.clone(),
            &config.runner.program,
            config.runner.command_args(),
        )
    }

    /// Keeps command output out of stdout. It is still returned in the
    /// [`RunReport`].
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.print_output = false;
        self
    }

    /// Returns the guard shared by this executor and its clones.
    pub fn guard(&self) -> &Arc<RunGuard> {
        &self.guard
    }

    /// Returns the directory the command runs in.
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }

    /// Starts a run unless one is already in flight.
    ///
    /// Returns the handle of the spawned task, or `None` if the request was
    /// dropped. The guard stays held until the task finishes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn try_run(&self) -> Option<JoinHandle<RunReport>> {
        let Some(permit) = self.guard.try_acquire() else {
            tracing::debug!("Aborting run, tests not finished running");
            return None;
        };

        let cmd = command(&self.program, &self.args, &self.working_dir);
        let program = Arc::clone(&self.program);
        let print_output = self.print_output;

        Some(tokio::spawn(async move {
            let _permit = permit;

            let report = match run_combined(cmd, &program).await {
                Ok(output) => RunReport {
                    result: if output.status.success() {
                        Ok(())
                    } else {
                        Err(RunError::Failed(output.status))
                    },
                    output: output.bytes,
                },
                Err(error) => RunReport {
                    output: Vec::new(),
                    result: Err(error),
                },
            };

            match &report.result {
                Ok(()) => tracing::debug!(program = %program, "Test command succeeded"),
                Err(RunError::Failed(status)) => {
                    tracing::warn!(program = %program, %status, "Test command failed");
                }
                Err(error) => tracing::error!(program = %program, %error, "Test command error"),
            }

            if print_output {
                print_to_stdout(&report.output);
            }

            report
        }))
    }
}

impl RunTrigger for TestExecutor {
    fn trigger(&self) -> bool {
        self.try_run().is_some()
    }
}

fn print_to_stdout(bytes: &[u8]) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let _ = handle.write_all(bytes);
    let _ = handle.flush();
}
