//! Application-level error types.

use thiserror::Error;

/// Errors that end the application.
///
/// Test command failures are not here: they are logged by the executor and
/// never reach the lifecycle.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// The notification source failed to start or to deliver events.
    #[error("watcher error: {0}")]
    Watcher(#[from] pta_watcher::WatchError),

    /// OS signal handlers could not be installed.
    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// A pause or terminate handshake could not complete because the unit
    /// is no longer listening.
    #[error("control channel closed unexpectedly")]
    ChannelClosed,

    /// A registered unit panicked or was cancelled.
    #[error("unit '{name}' stopped abnormally: {reason}")]
    UnitAborted {
        /// The name the unit was registered under.
        name: String,
        /// What the runtime reported.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::ChannelClosed;
        assert_eq!(err.to_string(), "control channel closed unexpectedly");

        let err = AppError::UnitAborted {
            name: "Watcher Loop".to_owned(),
            reason: "task panicked".to_owned(),
        };
        insta::assert_snapshot!(err.to_string(), @"unit 'Watcher Loop' stopped abnormally: task panicked");
    }

    #[test]
    fn test_watcher_error_converts() {
        let err = AppError::from(pta_watcher::WatchError::ChannelClosed);
        assert!(matches!(err, AppError::Watcher(_)));
        assert!(err.to_string().starts_with("watcher error"));
    }
}
