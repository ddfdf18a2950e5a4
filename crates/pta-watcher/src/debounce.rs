//! Debounce policy for modification events.
//!
//! Editors routinely emit several modify notifications for one save. The
//! [`DebounceFilter`] collapses those bursts: the first modification of a
//! tracked file is accepted immediately, and any further modification of the
//! same file is discarded until more than [`DISCARD_WINDOW`] has passed since
//! the last accepted one.
//!
//! ```text
//! a.go  t=0.0s  ──► accepted (no record)        record(a.go, 0.0)
//! a.go  t=0.5s  ──► discarded (0.5s ≤ 1s)
//! a.go  t=1.5s  ──► accepted (1.5s > 1s)        record(a.go, 1.5)
//! b.go  t=1.5s  ──► accepted (paths are independent)
//! ```

use std::sync::Arc;
use std::time::Duration;

use pta_core::DISCARD_WINDOW;

use crate::events::FileEvent;
use crate::filter::FileFilter;
use crate::store::EventStore;

/// Why an event was ignored without touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The event is not an in-place modification.
    NotModify,
    /// The path is not a tracked source file.
    Untracked,
}

/// The outcome of running one event through the [`DebounceFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The event counts as a new logical change; a run should be triggered.
    Accepted,
    /// A repeat of a recently accepted change.
    Discarded {
        /// Time since the last accepted event for the same path.
        since_last: Duration,
    },
    /// The event is irrelevant to the policy.
    Ignored(IgnoreReason),
}

impl Decision {
    /// Returns `true` if a run should be triggered.
    #[inline]
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Accepts or discards modification events against an [`EventStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
/// use camino::Utf8PathBuf;
/// use pta_watcher::{ChangeKind, DebounceFilter, Decision, EventStore, FileEvent, SuffixFilter};
///
/// let filter = DebounceFilter::new(SuffixFilter::default(), Arc::new(EventStore::new()));
/// let t0 = Instant::now();
/// let at = |offset_ms| {
///     FileEvent::with_timestamp(
///         Utf8PathBuf::from("a.go"),
///         ChangeKind::Modify,
///         t0 + Duration::from_millis(offset_ms),
///     )
/// };
///
/// assert_eq!(filter.evaluate(&at(0)), Decision::Accepted);
/// assert!(!filter.evaluate(&at(500)).is_accepted());
/// assert_eq!(filter.evaluate(&at(1500)), Decision::Accepted);
/// ```
#[derive(Debug)]
pub struct DebounceFilter<F> {
    filter: F,
    store: Arc<EventStore>,
}

impl<F: FileFilter> DebounceFilter<F> {
    /// Creates a filter that records accepted events into `store`.
    pub fn new(filter: F, store: Arc<EventStore>) -> Self {
        Self { filter, store }
    }

    /// Returns the store this filter records into.
    pub fn store(&self) -> &Arc<EventStore> {
        &self.store
    }

    /// Decides whether `event` is a new logical change.
    ///
    /// Accepted events are recorded at `event.timestamp`; discarded and
    /// ignored events leave the store untouched.
    pub fn evaluate(&self, event: &FileEvent) -> Decision {
        if !event.is_modify() {
            return Decision::Ignored(IgnoreReason::NotModify);
        }
        if !self.filter.should_process(&event.path) {
            tracing::trace!(path = %event.path, "Ignoring untracked file");
            return Decision::Ignored(IgnoreReason::Untracked);
        }

        tracing::debug!(path = %event.path, kind = ?event.kind, "Modification event");

        if let Some(previous) = self.store.lookup(&event.path) {
            let since_last = event.timestamp.saturating_duration_since(previous.occurred_at);
            if since_last <= DISCARD_WINDOW {
                tracing::debug!(
                    path = %event.path,
                    since_last_ms = since_last.as_millis(),
                    "Event was discarded"
                );
                return Decision::Discarded { since_last };
            }
        }

        self.store.record(&event.path, event.timestamp);
        Decision::Accepted
    }
}
