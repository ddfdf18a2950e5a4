//! Single-flight test command execution.
//!
//! - [`RunGuard`] / [`RunPermit`]: at most one run in flight; extra requests
//!   are dropped, never queued
//! - [`TestExecutor`]: spawns the test command under the guard, captures its
//!   combined output, prints it, and logs failures
//! - [`RunTrigger`]: the "start a run" capability the watcher loop and the
//!   interrupt handler depend on

#![deny(clippy::all)]
#![warn(missing_docs)]

mod capture;
pub mod error;
pub mod executor;
pub mod guard;

pub use error::RunError;
pub use executor::{RunReport, RunTrigger, TestExecutor};
pub use guard::{RunGuard, RunPermit};
