//! Error types for the pta-runner crate.

use std::process::ExitStatus;

/// Errors from a single test command invocation.
///
/// None of these end the process: the executor logs them, prints whatever
/// output was captured, and releases the run guard.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RunError {
    /// The command could not be started.
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the command's output or waiting for it failed.
    #[error("failed to capture command output: {0}")]
    Capture(#[from] std::io::Error),

    /// The command ran and exited unsuccessfully.
    #[error("test command {0}")]
    Failed(ExitStatus),
}

impl RunError {
    /// Returns `true` if the command never started.
    #[must_use]
    pub const fn is_spawn(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}
