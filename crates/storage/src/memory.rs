//! MemoryStore: ordered in-memory storage backend
//!
//! This module implements the OrderedStore trait using:
//! - `BTreeMap<Vec<u8>, Vec<u8>>` for byte-ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Single version per key**: a put overwrites, a delete removes
//! - **Bounded scans**: the partition range is intersected with the caller's
//!   start bound before touching the map, so a scan never walks keys outside
//!   its partition

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use threadchat_core::{OrderedStore, ScanOptions, StoreResult};

/// In-memory ordered store using BTreeMap with RwLock
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True if no keys are stored
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    pub(crate) fn insert(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.write().insert(key, value);
    }

    pub(crate) fn remove(&self, key: &[u8]) {
        self.data.write().remove(key);
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &[u8], options: &ScanOptions) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let Some(range) = partition_range(prefix, options) else {
            return Ok(Vec::new());
        };

        let limit = options.limit.unwrap_or(usize::MAX);
        let data = self.data.read();
        let iter = data.range::<Vec<u8>, _>(range);

        let results = if options.reverse {
            iter.rev()
                .take(limit)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        } else {
            iter.take(limit)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };

        Ok(results)
    }
}

/// Smallest key greater than every key starting with `prefix`
///
/// Returns None when no such key exists (empty or all-0xFF prefix).
pub(crate) fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Key range covered by a scan: the partition narrowed by the start bound
///
/// Returns None when the intersection is empty.
pub(crate) fn partition_range(
    prefix: &[u8],
    options: &ScanOptions,
) -> Option<(Bound<Vec<u8>>, Bound<Vec<u8>>)> {
    let mut lower = Bound::Included(prefix.to_vec());
    let mut upper = match prefix_successor(prefix) {
        Some(end) => Bound::Excluded(end),
        None => Bound::Unbounded,
    };

    if options.reverse {
        upper = tighter_upper(upper, options.start.clone());
    } else {
        lower = tighter_lower(lower, options.start.clone());
    }

    if range_is_empty(&lower, &upper) {
        None
    } else {
        Some((lower, upper))
    }
}

fn tighter_lower(a: Bound<Vec<u8>>, b: Bound<Vec<u8>>) -> Bound<Vec<u8>> {
    match (a, b) {
        (Bound::Unbounded, x) | (x, Bound::Unbounded) => x,
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.max(y)),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.max(y)),
        (Bound::Included(i), Bound::Excluded(e)) | (Bound::Excluded(e), Bound::Included(i)) => {
            if e >= i {
                Bound::Excluded(e)
            } else {
                Bound::Included(i)
            }
        }
    }
}

fn tighter_upper(a: Bound<Vec<u8>>, b: Bound<Vec<u8>>) -> Bound<Vec<u8>> {
    match (a, b) {
        (Bound::Unbounded, x) | (x, Bound::Unbounded) => x,
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.min(y)),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.min(y)),
        (Bound::Included(i), Bound::Excluded(e)) | (Bound::Excluded(e), Bound::Included(i)) => {
            if e <= i {
                Bound::Excluded(e)
            } else {
                Bound::Included(i)
            }
        }
    }
}

// BTreeMap::range panics on inverted or empty-exclusive ranges
fn range_is_empty(lower: &Bound<Vec<u8>>, upper: &Bound<Vec<u8>>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l > u,
        (Bound::Included(l), Bound::Excluded(u))
        | (Bound::Excluded(l), Bound::Included(u))
        | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
        _ => false,
    }
}
