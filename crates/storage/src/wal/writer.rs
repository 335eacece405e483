//! WAL writer with durability mode support.
//!
//! The writer handles appending WAL records to segments with proper
//! durability guarantees based on the configured mode.

use super::config::WalConfig;
use super::format::{WalRecord, WalSegment, SEGMENT_HEADER_SIZE};
use super::mode::DurabilityMode;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Cumulative WAL operation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalCounters {
    /// Total WAL record appends
    pub wal_appends: u64,
    /// Total durability barrier (fsync) calls
    pub sync_calls: u64,
    /// Total bytes written to WAL segments
    pub bytes_written: u64,
}

/// WAL writer with configurable durability modes.
///
/// # Segment Rotation
///
/// When the current segment would exceed the configured size limit, the
/// writer closes it and continues in a new segment. Closed segments are
/// immutable.
#[derive(Debug)]
pub struct WalWriter {
    segment: WalSegment,
    durability: DurabilityMode,
    wal_dir: PathBuf,
    store_uuid: [u8; 16],
    config: WalConfig,
    writes_since_sync: usize,
    last_sync_time: Instant,
    has_unsynced_data: bool,
    /// Set when a failed append could not be rolled back
    failed: bool,
    counters: WalCounters,
}

impl WalWriter {
    /// Create a new WAL writer.
    ///
    /// Appends to the highest-numbered existing segment, or creates
    /// segment 1 in an empty directory. If the latest segment cannot be
    /// opened for appending, writing continues in the next one.
    pub fn new(
        wal_dir: PathBuf,
        store_uuid: [u8; 16],
        durability: DurabilityMode,
        config: WalConfig,
    ) -> std::io::Result<Self> {
        std::fs::create_dir_all(&wal_dir)?;

        let segment = match Self::find_latest_segment(&wal_dir) {
            Some(num) => match WalSegment::open_append(&wal_dir, num) {
                Ok(segment) => segment,
                Err(e) => {
                    tracing::warn!(
                        target: "threadchat::wal",
                        segment = num,
                        error = %e,
                        "Cannot append to latest WAL segment, starting the next one"
                    );
                    WalSegment::create(&wal_dir, num + 1, store_uuid)?
                }
            },
            None => WalSegment::create(&wal_dir, 1, store_uuid)?,
        };

        Ok(WalWriter {
            segment,
            durability,
            wal_dir,
            store_uuid,
            config,
            writes_since_sync: 0,
            last_sync_time: Instant::now(),
            has_unsynced_data: false,
            failed: false,
            counters: WalCounters::default(),
        })
    }

    fn find_latest_segment(wal_dir: &Path) -> Option<u64> {
        std::fs::read_dir(wal_dir)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(|name| name.strip_prefix("wal-"))
                    .and_then(|rest| rest.strip_suffix(".seg"))
                    .and_then(|digits| digits.parse::<u64>().ok())
            })
            .max()
    }

    /// Append a record to the WAL.
    ///
    /// - `Always`: writes and fsyncs before returning
    /// - `Standard`: writes, fsyncs once the batch size or interval is reached
    ///
    /// On error the segment is cut back to where the record started, so a
    /// record that was not acknowledged never reaches replay. If that cut
    /// fails too, the writer refuses every later append.
    pub fn append(&mut self, record: &WalRecord) -> std::io::Result<()> {
        if self.failed {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "WAL writer failed after an unrecoverable append error; reopen the store",
            ));
        }

        let bytes = record.to_bytes();

        let has_records = self.segment.size() > SEGMENT_HEADER_SIZE as u64;
        if has_records && self.segment.size() + bytes.len() as u64 > self.config.segment_size {
            self.rotate_segment()?;
        }

        let start = self.segment.size();
        if let Err(e) = self.segment.write(&bytes) {
            self.discard_from(start);
            return Err(e);
        }
        self.writes_since_sync += 1;
        self.has_unsynced_data = true;

        if let Err(e) = self.maybe_sync() {
            self.discard_from(start);
            return Err(e);
        }

        self.counters.wal_appends += 1;
        self.counters.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Drop everything from `position` on after a failed append.
    fn discard_from(&mut self, position: u64) {
        match self.segment.truncate(position) {
            Ok(()) => {
                // truncate fsyncs whatever precedes `position`
                self.writes_since_sync = 0;
                self.last_sync_time = Instant::now();
                self.has_unsynced_data = false;
            }
            Err(e) => {
                tracing::error!(
                    target: "threadchat::wal",
                    segment = self.segment.segment_number(),
                    position,
                    error = %e,
                    "Cannot roll back failed WAL append"
                );
                self.failed = true;
            }
        }
    }

    fn maybe_sync(&mut self) -> std::io::Result<()> {
        let due = match self.durability {
            DurabilityMode::Always => true,
            DurabilityMode::Standard {
                interval_ms,
                batch_size,
            } => {
                self.writes_since_sync >= batch_size
                    || self.last_sync_time.elapsed().as_millis() as u64 >= interval_ms
            }
        };

        if due {
            self.sync()?;
        }
        Ok(())
    }

    fn sync(&mut self) -> std::io::Result<()> {
        self.segment.sync()?;
        self.counters.sync_calls += 1;
        self.writes_since_sync = 0;
        self.last_sync_time = Instant::now();
        self.has_unsynced_data = false;
        Ok(())
    }

    /// Close the active segment and start the next one.
    fn rotate_segment(&mut self) -> std::io::Result<()> {
        self.segment.close()?;

        let next = self.segment.segment_number() + 1;
        tracing::debug!(target: "threadchat::wal", segment = next, "Rotating WAL segment");
        self.segment = WalSegment::create(&self.wal_dir, next, self.store_uuid)?;

        self.writes_since_sync = 0;
        self.last_sync_time = Instant::now();
        self.has_unsynced_data = false;
        Ok(())
    }

    /// Force any written records to disk.
    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.has_unsynced_data {
            self.sync()?;
        }
        Ok(())
    }

    /// True once an append failed and could not be rolled back.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// True if records were written but not yet fsynced.
    pub fn has_unsynced_data(&self) -> bool {
        self.has_unsynced_data
    }

    /// Get the current segment number.
    pub fn current_segment(&self) -> u64 {
        self.segment.segment_number()
    }

    /// Get the current segment size in bytes.
    pub fn current_segment_size(&self) -> u64 {
        self.segment.size()
    }

    /// Get the durability mode.
    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    /// Get a snapshot of cumulative WAL counters.
    pub fn counters(&self) -> WalCounters {
        self.counters.clone()
    }
}
