//! Event types for filesystem notifications.
//!
//! # Event Flow
//!
//! ```text
//! File System Change
//!        │
//!        ▼
//! notify backend (raw, one event per path)
//!        │
//!        ▼
//!   FileEvent { path, kind, timestamp }
//!        │
//!        ▼
//!   Sent via channel to the watcher loop
//! ```

use std::time::Instant;

use camino::Utf8PathBuf;
use notify::EventKind;
use notify::event::ModifyKind;

/// What happened to a file, reduced to what the debounce policy cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File contents or metadata were modified in place.
    Modify,
    /// Anything else: create, remove, rename, access.
    Other,
}

impl ChangeKind {
    /// Classifies a raw notify event kind.
    ///
    /// Renames are reported by notify as a modify of the name; they are not
    /// in-place writes and count as [`ChangeKind::Other`].
    ///
    /// # Examples
    ///
    /// ```
    /// use notify::EventKind;
    /// use notify::event::{DataChange, ModifyKind, CreateKind};
    /// use pta_watcher::ChangeKind;
    ///
    /// let write = EventKind::Modify(ModifyKind::Data(DataChange::Content));
    /// assert_eq!(ChangeKind::from_notify(&write), ChangeKind::Modify);
    ///
    /// let create = EventKind::Create(CreateKind::File);
    /// assert_eq!(ChangeKind::from_notify(&create), ChangeKind::Other);
    /// ```
    #[must_use]
    pub fn from_notify(kind: &EventKind) -> Self {
        match kind {
            EventKind::Modify(ModifyKind::Name(_)) => Self::Other,
            EventKind::Modify(_) => Self::Modify,
            _ => Self::Other,
        }
    }
}

/// A single file notification with a UTF-8 path guarantee.
///
/// # Examples
///
/// ```
/// use pta_watcher::{ChangeKind, FileEvent};
/// use camino::Utf8PathBuf;
///
/// let event = FileEvent::new(Utf8PathBuf::from("pkg/parse.go"), ChangeKind::Modify);
/// assert!(event.is_modify());
/// assert_eq!(event.extension(), Some("go"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// The path of the file that changed.
    pub path: Utf8PathBuf,

    /// The kind of change.
    pub kind: ChangeKind,

    /// When this event was received.
    ///
    /// Monotonic, used only to measure the distance between events.
    pub timestamp: Instant,
}

impl FileEvent {
    /// Creates a new event stamped with the current instant.
    #[inline]
    #[must_use]
    pub fn new(path: Utf8PathBuf, kind: ChangeKind) -> Self {
        Self {
            path,
            kind,
            timestamp: Instant::now(),
        }
    }

    /// Creates a new event with a specific timestamp.
    ///
    /// Useful for replaying bursts with controlled spacing.
    #[inline]
    #[must_use]
    pub const fn with_timestamp(path: Utf8PathBuf, kind: ChangeKind, timestamp: Instant) -> Self {
        Self {
            path,
            kind,
            timestamp,
        }
    }

    /// Returns `true` if this is an in-place modification.
    #[inline]
    #[must_use]
    pub const fn is_modify(&self) -> bool {
        matches!(self.kind, ChangeKind::Modify)
    }

    /// Returns the file extension, if any.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension()
    }
}
