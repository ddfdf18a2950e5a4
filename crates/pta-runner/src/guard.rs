//! Single-flight guard for test runs.
//!
//! [`RunGuard`] owns one flag, "a run is in flight", behind a
//! [`parking_lot::Mutex`]. [`RunGuard::try_acquire`] checks and sets it in
//! one critical section and hands out a [`RunPermit`]; the flag is cleared
//! when the permit is dropped, whichever way the run ends.
//!
//! There is no queue: a request that finds the flag set gets `None` and is
//! simply dropped.

use std::sync::Arc;

use parking_lot::Mutex;

/// The single-flight lock.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use pta_runner::RunGuard;
///
/// let guard = Arc::new(RunGuard::new());
///
/// let permit = guard.try_acquire().expect("guard is free");
/// assert!(guard.is_running());
/// assert!(guard.try_acquire().is_none());
///
/// drop(permit);
/// assert!(!guard.is_running());
/// ```
#[derive(Debug, Default)]
pub struct RunGuard {
    running: Mutex<bool>,
}

impl RunGuard {
    /// Creates a guard with no run in flight.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the guard if no run is in flight.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunPermit> {
        let mut running = self.running.lock();
        if *running {
            return None;
        }
        *running = true;
        drop(running);

        Some(RunPermit {
            guard: Arc::clone(self),
        })
    }

    /// Returns `true` while a permit is held.
    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }
}

/// Proof that the holder owns the single in-flight run.
///
/// Dropping the permit releases the guard.
#[derive(Debug)]
#[must_use = "the run guard is released as soon as the permit is dropped"]
pub struct RunPermit {
    guard: Arc<RunGuard>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        *self.guard.running.lock() = false;
    }
}
