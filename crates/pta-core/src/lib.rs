//! Core configuration, errors, and shared types for pta.
//!
//! This crate provides the foundational pieces used across the workspace:
//!
//! - [`Config`] and its sections, plus the fixed timing constants
//!   [`DISCARD_WINDOW`] and [`RERUN_DELAY`]
//! - [`ConfigError`] for configuration validation
//! - `FxHashMap` aliases for path-keyed maps

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;

pub use config::{Config, DISCARD_WINDOW, RERUN_DELAY, RunnerConfig, WatchConfig};
pub use error::ConfigError;
pub use hash::{FxHashMap, fx_hash_map};
