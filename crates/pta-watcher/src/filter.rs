//! Tracked-file filtering.
//!
//! The [`FileFilter`] trait decides which paths are source files whose
//! modification should re-run the tests. [`SuffixFilter`] is the stock
//! implementation: a path is tracked when it ends in one of the configured
//! suffixes (`.go` by default).
//!
//! # Examples
//!
//! ```
//! use pta_watcher::{FileFilter, SuffixFilter};
//! use camino::Utf8Path;
//!
//! let filter = SuffixFilter::default();
//!
//! assert!(filter.should_process(Utf8Path::new("pkg/server.go")));
//! assert!(!filter.should_process(Utf8Path::new("go.mod")));
//! assert!(!filter.should_process(Utf8Path::new("README.md")));
//! ```

use camino::Utf8Path;
use smallvec::SmallVec;

/// A predicate over changed paths.
///
/// Filters are consulted from the watcher loop task, so they must be
/// [`Send`] + [`Sync`] + `'static`.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if a change to `path` should be considered at all.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Accepts paths that end with one of a set of suffixes.
///
/// Matching is a plain suffix test on the whole path, so a file literally
/// named `.go` is tracked while `go.mod` and `main.go.orig` are not.
///
/// # Examples
///
/// ```
/// use pta_watcher::{FileFilter, SuffixFilter};
/// use camino::Utf8Path;
///
/// let filter = SuffixFilter::new("rs").with_extension("toml");
/// assert!(filter.should_process(Utf8Path::new("src/lib.rs")));
/// assert!(filter.should_process(Utf8Path::new("Cargo.toml")));
/// assert!(!filter.should_process(Utf8Path::new("src/lib.go")));
/// ```
#[derive(Debug, Clone)]
pub struct SuffixFilter {
    /// Dotted suffixes, e.g. `.go`.
    suffixes: SmallVec<[String; 4]>,
}

impl SuffixFilter {
    /// Creates a filter tracking a single extension.
    ///
    /// The extension may be given with or without its leading dot.
    #[must_use]
    pub fn new(extension: &str) -> Self {
        Self {
            suffixes: SmallVec::new(),
        }
        .with_extension(extension)
    }

    /// Adds another tracked extension.
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        if !self.suffixes.contains(&suffix) {
            self.suffixes.push(suffix);
        }
        self
    }

    /// Returns the dotted suffixes this filter tracks.
    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }
}

impl Default for SuffixFilter {
    fn default() -> Self {
        Self::new("go")
    }
}

impl FileFilter for SuffixFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        let path = path.as_str();
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }
}
