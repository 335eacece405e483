//! DurableStore: WAL-backed ordered store
//!
//! A [`MemoryStore`] that survives restarts. Every put/delete is appended to
//! the write-ahead log before it is applied in memory; opening a store
//! replays the log to rebuild the map.
//!
//! ## Layout
//!
//! ```text
//! <path>/
//! ├── .lock            (exclusive process lock)
//! └── wal/
//!     └── wal-NNNNNN.seg
//! ```
//!
//! ## Sharing
//!
//! Opening the same canonical path twice in one process returns the same
//! `Arc<DurableStore>`. A second process gets [`StoreError::Locked`].

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use threadchat_core::{OrderedStore, ScanOptions, StoreError, StoreResult};

use crate::memory::MemoryStore;
use crate::wal::{
    DurabilityMode, WalConfig, WalCounters, WalReader, WalRecord, WalSegment, WalWriter,
};

/// Stores currently open in this process, keyed by canonical path
static OPEN_STORES: Lazy<Mutex<HashMap<PathBuf, Weak<DurableStore>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Ordered store persisted through a write-ahead log
#[derive(Debug)]
pub struct DurableStore {
    memory: MemoryStore,
    /// Held across the WAL append and the in-memory apply so both see
    /// mutations in the same order
    wal: Mutex<WalWriter>,
    path: PathBuf,
    uuid: Uuid,
    _lock_file: File,
}

impl DurableStore {
    /// Open (or create) a store at `path` with the default WAL configuration
    pub fn open<P: AsRef<Path>>(path: P, durability: DurabilityMode) -> StoreResult<Arc<Self>> {
        Self::open_with_config(path, durability, WalConfig::default())
    }

    /// Open (or create) a store at `path`
    ///
    /// # Errors
    ///
    /// - `Locked` if another process holds the store
    /// - `Corruption` if a WAL segment other than the last is damaged
    /// - `Io` on directory, lock, or segment failures
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        durability: DurabilityMode,
        wal_config: WalConfig,
    ) -> StoreResult<Arc<Self>> {
        wal_config
            .validate()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        let canonical_path = data_dir.canonicalize()?;

        // Hold the registry lock for the whole open so two threads cannot
        // both replay the same directory
        let mut registry = OPEN_STORES.lock();

        if let Some(store) = registry.get(&canonical_path).and_then(Weak::upgrade) {
            info!(target: "threadchat::store", path = ?canonical_path, "Returning existing store instance");
            return Ok(store);
        }

        let lock_path = canonical_path.join(".lock");
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)?;
        fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
            StoreError::Locked(format!(
                "store at '{}' is already in use by another process",
                canonical_path.display()
            ))
        })?;

        let wal_dir = canonical_path.join("wal");
        std::fs::create_dir_all(&wal_dir)?;

        let result = WalReader::new()
            .read_all(&wal_dir)
            .map_err(|e| StoreError::Corruption(e.to_string()))?;

        if let Some(number) = result.headerless_segment {
            warn!(
                target: "threadchat::wal",
                segment = number,
                "Removing WAL segment with incomplete header"
            );
            std::fs::remove_file(WalSegment::segment_path(&wal_dir, number))?;
        }

        if let Some(info) = &result.truncate_info {
            warn!(
                target: "threadchat::wal",
                segment = info.segment_number,
                bytes = info.bytes_to_truncate(),
                reason = ?result.stop_reason,
                "Discarding damaged WAL tail"
            );
            WalSegment::open_append(&wal_dir, info.segment_number)?.truncate(info.valid_end)?;
        }

        let memory = MemoryStore::new();
        let records_replayed = result.records.len();
        for record in result.records {
            match record {
                WalRecord::Put { key, value } => memory.insert(key, value),
                WalRecord::Delete { key } => memory.remove(&key),
            }
        }

        let uuid = result
            .store_uuid
            .map(Uuid::from_bytes)
            .unwrap_or_else(Uuid::new_v4);

        let wal = WalWriter::new(wal_dir, *uuid.as_bytes(), durability, wal_config)?;

        info!(
            target: "threadchat::store",
            path = ?canonical_path,
            store_uuid = %uuid,
            records_replayed,
            keys = memory.len(),
            durability = durability.description(),
            "Recovery complete"
        );

        let store = Arc::new(DurableStore {
            memory,
            wal: Mutex::new(wal),
            path: canonical_path.clone(),
            uuid,
            _lock_file: lock_file,
        });

        registry.retain(|_, open| open.strong_count() > 0);
        registry.insert(canonical_path, Arc::downgrade(&store));
        Ok(store)
    }

    /// Canonical directory of this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identity stamped into every WAL segment
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// True if no keys are stored
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Force every appended record to disk
    pub fn flush(&self) -> StoreResult<()> {
        self.wal.lock().flush()?;
        Ok(())
    }

    /// Cumulative WAL counters
    pub fn wal_counters(&self) -> WalCounters {
        self.wal.lock().counters()
    }

    /// Durability mode of the WAL writer
    pub fn durability(&self) -> DurabilityMode {
        self.wal.lock().durability()
    }
}

impl OrderedStore for DurableStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.memory.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut wal = self.wal.lock();
        wal.append(&WalRecord::put(key, value))?;
        self.memory.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let mut wal = self.wal.lock();
        wal.append(&WalRecord::delete(key))?;
        self.memory.remove(key);
        Ok(())
    }

    fn scan(&self, prefix: &[u8], options: &ScanOptions) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.memory.scan(prefix, options)
    }
}

impl Drop for DurableStore {
    fn drop(&mut self) {
        if let Err(e) = self.wal.get_mut().flush() {
            warn!(target: "threadchat::store", path = ?self.path, error = %e, "Failed to flush WAL on close");
        }
    }
}
