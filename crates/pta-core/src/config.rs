//! Configuration structures for pta.
//!
//! - [`WatchConfig`] - What to watch and which files count as source changes
//! - [`RunnerConfig`] - The test command to run on every change
//! - [`Config`] - Root configuration combining both
//!
//! The debounce window and the rerun delay are fixed policy and live here as
//! constants rather than as configuration options.

use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Repeated notifications for the same file inside this window are discarded.
pub const DISCARD_WINDOW: Duration = Duration::from_secs(1);

/// Delay between a first CTRL-C and the test rerun it schedules.
pub const RERUN_DELAY: Duration = Duration::from_secs(2);

/// Configuration for the directory watcher.
///
/// # Examples
///
/// ```
/// use pta_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.path.as_str(), "./");
/// assert_eq!(config.extension, "go");
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory to watch. Also the working directory of the test command.
    pub path: Utf8PathBuf,

    /// Suffix of tracked source files, without the leading dot.
    pub extension: String,

    /// Whether to watch subdirectories recursively.
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: Utf8PathBuf::from("./"),
            extension: "go".to_owned(),
            recursive: true,
        }
    }
}

/// Configuration for the test command.
///
/// The command line is `<program> <subcommand> <args...>`, run inside
/// [`WatchConfig::path`].
///
/// # Examples
///
/// ```
/// use pta_core::RunnerConfig;
///
/// let config = RunnerConfig {
///     args: vec!["-run".to_owned(), "TestParse".to_owned()],
///     ..RunnerConfig::default()
/// };
/// assert_eq!(config.program, "go");
/// assert_eq!(config.command_args(), ["test", "-run", "TestParse"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// The test tool to invoke.
    pub program: String,

    /// Subcommand passed before the forwarded arguments.
    pub subcommand: String,

    /// Arguments forwarded verbatim from the command line.
    pub args: Vec<String>,
}

impl RunnerConfig {
    /// Returns the full argument list: the subcommand followed by `args`.
    #[must_use]
    pub fn command_args(&self) -> Vec<String> {
        std::iter::once(self.subcommand.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "go".to_owned(),
            subcommand: "test".to_owned(),
            args: Vec::new(),
        }
    }
}

/// Root configuration for pta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watcher configuration.
    pub watch: WatchConfig,

    /// Test command configuration.
    pub runner: RunnerConfig,
}

impl Config {
    /// Checks that the configuration describes something we can run.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPath`] if the watch path is empty
    /// - [`ConfigError::MissingDirectory`] if the watch path does not exist
    /// - [`ConfigError::NotADirectory`] if the watch path is a file
    /// - [`ConfigError::InvalidOption`] if the program or extension is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let path = &self.watch.path;
        if path.as_str().is_empty() {
            return Err(ConfigError::InvalidPath {
                path: path.clone(),
                reason: "path is empty".to_owned(),
            });
        }
        if !path.exists() {
            return Err(ConfigError::MissingDirectory(path.clone()));
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory(path.clone()));
        }

        if self.runner.program.trim().is_empty() {
            return Err(ConfigError::invalid_option("program", "must not be empty"));
        }
        if self.watch.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::invalid_option("extension", "must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;

    fn config_in(dir: &Utf8Path) -> Config {
        Config {
            watch: WatchConfig {
                path: dir.to_owned(),
                ..WatchConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_timing_constants() {
        assert_eq!(DISCARD_WINDOW, Duration::from_secs(1));
        assert_eq!(RERUN_DELAY, Duration::from_secs(2));
    }

    #[test]
    fn test_runner_config_defaults() {
        let config = RunnerConfig::default();
        assert_eq!(config.program, "go");
        assert_eq!(config.command_args(), vec!["test"]);
    }

    #[test]
    fn test_command_args_forwards_in_order() {
        let config = RunnerConfig {
            args: vec!["-v".to_owned(), "./...".to_owned()],
            ..RunnerConfig::default()
        };
        assert_eq!(config.command_args(), vec!["test", "-v", "./..."]);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"runner": {"args": ["-race"]}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.runner.args, vec!["-race"]);
        assert_eq!(config.runner.program, "go");
        assert_eq!(config.watch.extension, "go");
    }

    #[test]
    fn test_validate_accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap();
        assert!(config_in(path).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let config = config_in(Utf8Path::new("/nonexistent/pta/watch/dir"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingDirectory(_))
        ));
    }

    #[test]
    fn test_validate_rejects_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.go");
        std::fs::write(&file, "package main").unwrap();
        let path = Utf8Path::from_path(&file).unwrap();

        assert!(matches!(
            config_in(path).validate(),
            Err(ConfigError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_program_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap();

        let mut config = config_in(path);
        config.runner.program = "  ".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { .. })
        ));

        let mut config = config_in(path);
        config.watch.extension = ".".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { .. })
        ));
    }
}
