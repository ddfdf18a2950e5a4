//! Fast hash map aliases.
//!
//! The event store is keyed by file path and looked up on every filesystem
//! notification, so it uses the Fx hash from `rustc-hash` instead of the
//! default SipHash. Paths come from the local filesystem only, so
//! denial-of-service resistance is not a concern.
//!
//! # Examples
//!
//! ```
//! use pta_core::{FxHashMap, fx_hash_map};
//!
//! let mut seen: FxHashMap<&str, u32> = fx_hash_map();
//! *seen.entry("main.go").or_default() += 1;
//! assert_eq!(seen.get("main.go"), Some(&1));
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// Creates a new empty [`FxHashMap`].
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}
