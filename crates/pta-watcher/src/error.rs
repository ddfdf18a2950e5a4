//! Error types for the pta-watcher crate.

use camino::Utf8PathBuf;

/// Errors raised by the notification source.
///
/// # Error Recovery Strategy
///
/// - **Notify errors** ([`WatchError::Notify`]): Fatal. Either the watch could
///   not be established or the backend reported a delivery failure.
/// - **Path not found** ([`WatchError::PathNotFound`]): Fatal. Nothing to watch.
/// - **Channel closed** ([`WatchError::ChannelClosed`]): Fatal. The backend
///   thread is gone.
/// - **Non-UTF-8 path** ([`WatchError::NonUtf8Path`]): Recoverable. The event
///   is skipped.
/// - **I/O errors** ([`WatchError::Io`]): Fatal.
///
/// # Examples
///
/// ```
/// use pta_watcher::WatchError;
///
/// let err = WatchError::path_not_found("./missing");
/// assert!(err.is_fatal());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The notify backend failed to start watching or to deliver events.
    #[error("notify watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// The directory to watch does not exist.
    #[error("path does not exist: {0}")]
    PathNotFound(Utf8PathBuf),

    /// The channel between the backend thread and the consumer closed.
    #[error("notification channel closed unexpectedly")]
    ChannelClosed,

    /// A notification carried a path that is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// An I/O error occurred while resolving the watch path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WatchError {
    /// Creates a new [`WatchError::PathNotFound`] error.
    #[inline]
    pub fn path_not_found(path: impl Into<Utf8PathBuf>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Creates a new [`WatchError::NonUtf8Path`] error.
    #[inline]
    pub fn non_utf8_path(path: impl Into<std::path::PathBuf>) -> Self {
        Self::NonUtf8Path(path.into())
    }

    /// Returns `true` if watching can continue after this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::NonUtf8Path(_))
    }

    /// Returns `true` if this error must end the process.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}
