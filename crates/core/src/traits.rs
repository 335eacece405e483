//! Core trait for storage abstraction
//!
//! This module defines the `OrderedStore` trait that enables swapping the
//! in-memory engine for the WAL-backed one without touching the chat layer.

use std::ops::Bound;

use crate::error::StoreResult;

/// Options for a bounded, directional range scan
///
/// `start` is interpreted relative to the scan direction: it is the lower
/// bound of an ascending scan and the upper bound of a descending one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Where the scan begins (full physical key)
    pub start: Bound<Vec<u8>>,
    /// Maximum number of entries returned (`None` = unbounded)
    pub limit: Option<usize>,
    /// Descending key order when true
    pub reverse: bool,
}

impl ScanOptions {
    /// Ascending, unbounded scan from the partition start
    pub fn all() -> Self {
        ScanOptions {
            start: Bound::Unbounded,
            limit: None,
            reverse: false,
        }
    }

    /// Set the start bound
    pub fn start(mut self, start: Bound<Vec<u8>>) -> Self {
        self.start = start;
        self
    }

    /// Set the result limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the direction
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// Byte-ordered key-value engine
///
/// Keys sort lexicographically by bytes. Implementations must provide
/// per-key atomicity: a reader never observes a torn value.
///
/// Thread safety: All methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait OrderedStore: Send + Sync {
    /// Get the value stored at `key`
    ///
    /// Returns None if the key doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    /// Insert or overwrite `key`
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Remove `key`
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete(&self, key: &[u8]) -> StoreResult<()>;

    /// Scan keys starting with `prefix`
    ///
    /// Results are ordered by key (descending if `options.reverse`), begin at
    /// `options.start`, and hold at most `options.limit` entries. Keys are
    /// returned in full, prefix included.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn scan(&self, prefix: &[u8], options: &ScanOptions) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>>;
}
