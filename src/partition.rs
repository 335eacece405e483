//! Partition Manager
//!
//! A [`Partition`] is a view of the shared ordered store restricted to one
//! prefix. Handles are cheap and built fresh per call; two handles with the
//! same name see the same keys.

use std::fmt;
use std::ops::Bound;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use threadchat_core::key::{decode_key, encode_key, exclusive_after};
use threadchat_core::{OrderedStore, PartitionName, ScanOptions, StoreError, StoreResult};

/// Where a partition scan begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStart<'a> {
    /// First key in scan order
    Edge,
    /// At `key`, inclusive
    At(&'a str),
    /// Strictly after `key` in scan order, skipping every key it prefixes
    /// when ascending
    After(&'a str),
}

/// Prefix-scoped view of the ordered store
#[derive(Clone)]
pub struct Partition {
    store: Arc<dyn OrderedStore>,
    name: PartitionName,
    prefix: Vec<u8>,
}

impl Partition {
    /// Bind `name` to `store`
    pub fn new(store: Arc<dyn OrderedStore>, name: PartitionName) -> Self {
        let prefix = name.prefix();
        Partition {
            store,
            name,
            prefix,
        }
    }

    /// Partition name
    pub fn name(&self) -> &PartitionName {
        &self.name
    }

    /// Raw value under `key`
    pub fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.store.get(&encode_key(&self.prefix, key))
    }

    /// Decode the JSON value under `key`
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Store `value` as JSON under `key`
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec(value)?;
        self.store.put(&encode_key(&self.prefix, key), &bytes)
    }

    /// Remove `key`; absent keys are not an error
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.store.delete(&encode_key(&self.prefix, key))
    }

    /// Ordered scan returning `(key, value)` pairs with the prefix stripped
    pub fn scan_json<T: DeserializeOwned>(
        &self,
        start: ScanStart<'_>,
        limit: Option<usize>,
        reverse: bool,
    ) -> StoreResult<Vec<(String, T)>> {
        let mut options = ScanOptions::all()
            .start(self.start_bound(start, reverse))
            .reverse(reverse);
        if let Some(limit) = limit {
            options = options.limit(limit);
        }

        self.store
            .scan(&self.prefix, &options)?
            .into_iter()
            .map(|(key, value)| {
                let user_key = decode_key(&self.prefix, &key).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "key outside partition '{}' returned by scan",
                        self.name
                    ))
                })?;
                Ok((user_key.to_string(), serde_json::from_slice(&value)?))
            })
            .collect()
    }

    fn start_bound(&self, start: ScanStart<'_>, reverse: bool) -> Bound<Vec<u8>> {
        match start {
            ScanStart::Edge => Bound::Unbounded,
            ScanStart::At(key) => Bound::Included(encode_key(&self.prefix, key)),
            ScanStart::After(key) if reverse => Bound::Excluded(encode_key(&self.prefix, key)),
            ScanStart::After(key) => Bound::Included(exclusive_after(&self.prefix, key)),
        }
    }
}

impl fmt::Debug for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partition")
            .field("name", &self.name)
            .finish()
    }
}
