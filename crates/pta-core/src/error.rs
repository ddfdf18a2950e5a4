//! Error types for the pta-core crate.
//!
//! This module provides the [`ConfigError`] type returned by
//! [`Config::validate`](crate::Config::validate).

use camino::Utf8PathBuf;

/// Errors that can occur while validating the configuration.
///
/// # Examples
///
/// ```
/// use pta_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDirectory(Utf8PathBuf::from("/some/path"));
/// assert!(error.to_string().contains("/some/path"));
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The provided path is invalid or malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path.
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// The directory to watch does not exist.
    #[error("missing watch directory: {0}")]
    MissingDirectory(Utf8PathBuf),

    /// The watch path exists but is not a directory.
    #[error("watch path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_path_display() {
        let error = ConfigError::InvalidPath {
            path: Utf8PathBuf::from(""),
            reason: "path is empty".to_owned(),
        };
        insta::assert_snapshot!(error.to_string(), @"invalid path '': path is empty");
    }

    #[test]
    fn test_missing_directory_display() {
        let error = ConfigError::MissingDirectory(Utf8PathBuf::from("/missing/dir"));
        insta::assert_snapshot!(error.to_string(), @"missing watch directory: /missing/dir");
    }

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::invalid_option("program", "must not be empty");
        let msg = error.to_string();
        assert!(msg.contains("program"));
        assert!(msg.contains("must not be empty"));
    }
}
