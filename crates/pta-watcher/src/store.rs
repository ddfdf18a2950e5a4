//! Per-file record of the last accepted event.
//!
//! [`EventStore`] maps each tracked path to the instant its last accepted
//! modification occurred. Records are created on the first accepted event
//! for a path, refreshed on later accepted events, and never removed.
//!
//! # Locking
//!
//! A single [`parking_lot::RwLock`] guards the map: [`EventStore::lookup`]
//! takes the shared lock, [`EventStore::record`] the exclusive one. Both
//! return owned copies so no guard ever escapes the store.

use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::RwLock;
use pta_core::{FxHashMap, fx_hash_map};

/// The last accepted event for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// The tracked file.
    pub path: Utf8PathBuf,

    /// When the last accepted event for this file occurred.
    pub occurred_at: Instant,
}

/// Thread-safe map from path to [`EventRecord`].
///
/// # Examples
///
/// ```
/// use pta_watcher::EventStore;
/// use camino::Utf8Path;
/// use std::time::Instant;
///
/// let store = EventStore::new();
/// let path = Utf8Path::new("main.go");
/// assert!(store.lookup(path).is_none());
///
/// let now = Instant::now();
/// let record = store.record(path, now);
/// assert_eq!(record.occurred_at, now);
/// assert_eq!(store.lookup(path), Some(record));
/// ```
#[derive(Debug)]
pub struct EventStore {
    records: RwLock<FxHashMap<Utf8PathBuf, EventRecord>>,
}

impl EventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(fx_hash_map()),
        }
    }

    /// Inserts or refreshes the record for `path` and returns it.
    pub fn record(&self, path: &Utf8Path, occurred_at: Instant) -> EventRecord {
        let mut records = self.records.write();
        let record = records
            .entry(path.to_owned())
            .and_modify(|record| record.occurred_at = occurred_at)
            .or_insert_with(|| EventRecord {
                path: path.to_owned(),
                occurred_at,
            });
        record.clone()
    }

    /// Returns a copy of the record for `path`, if one exists.
    pub fn lookup(&self, path: &Utf8Path) -> Option<EventRecord> {
        self.records.read().get(path).cloned()
    }

    /// Returns the number of tracked paths.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns `true` if no path has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
