//! Filesystem notifications, per-file event store, and debounce policy.
//!
//! This crate turns a raw stream of filesystem notifications into a stream
//! of decisions: "this is a new logical change, run the tests" or "this is
//! noise, ignore it".
//!
//! # Overview
//!
//! - [`NotificationSource`] watches a directory with `notify` and yields
//!   [`FileEvent`]s (and fatal [`WatchError`]s) to async code
//! - [`SuffixFilter`] selects tracked source files (`.go` by default)
//! - [`EventStore`] remembers when each tracked file last changed
//! - [`DebounceFilter`] combines the two into accept/discard [`Decision`]s
//!
//! # Crate Dependencies
//!
//! ```text
//! pta-cli ──► pta-app ──► pta-runner ──► pta-core
//!                    └──► pta-watcher ──► pta-core
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use pta_watcher::{
//!     DebounceFilter, EventSource, EventStore, Notification, NotificationSource, SuffixFilter,
//! };
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), pta_watcher::WatchError> {
//! let debounce = DebounceFilter::new(SuffixFilter::default(), Arc::new(EventStore::new()));
//! let mut source = NotificationSource::watch(Utf8Path::new("./"), true).await?;
//!
//! while let Some(notification) = source.next().await {
//!     match notification {
//!         Notification::Changed(event) if debounce.evaluate(&event).is_accepted() => {
//!             println!("run the tests: {}", event.path);
//!         }
//!         Notification::Changed(_) => {}
//!         Notification::Failed(error) => return Err(error),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod debounce;
pub mod error;
pub mod events;
pub mod filter;
pub mod source;
pub mod store;

pub use debounce::{DebounceFilter, Decision, IgnoreReason};
pub use error::WatchError;
pub use events::{ChangeKind, FileEvent};
pub use filter::{FileFilter, SuffixFilter};
pub use source::{Connect, EventSource, Notification, NotificationSource, NotifyConnector};
pub use store::{EventRecord, EventStore};
