//! Write-Ahead Log (WAL) module.
//!
//! Every mutation of a [`DurableStore`](crate::DurableStore) is appended here
//! before it is applied in memory; on open the log is replayed to rebuild the
//! store.
//!
//! - **Segment-based storage**: WAL is split into segments (`wal-NNNNNN.seg`)
//! - **Self-delimiting records**: Each record has length prefix and CRC32 checksum
//! - **Durability modes**: Always, Standard
//! - **Crash recovery**: Reader stops at a partial/corrupt tail; the tail is truncated
//!
//! # Architecture
//!
//! ```text
//! <store_path>/wal/
//! ├── wal-000001.seg   (closed, immutable)
//! ├── wal-000002.seg   (closed, immutable)
//! └── wal-000003.seg   (active, writable)
//! ```
//!
//! # Invariants
//!
//! - WAL is append-only; records are never modified in place
//! - Segments are immutable once closed; only the active segment is writable
//! - Every segment of one store carries the same store UUID

pub mod config;
pub mod format;
mod mode;
pub mod reader;
pub mod writer;

pub use config::{WalConfig, WalConfigError};
pub use format::{SegmentHeader, WalOp, WalRecord, WalRecordError, WalSegment};
pub use mode::DurabilityMode;
pub use reader::{ReadStopReason, TruncateInfo, WalReadResult, WalReader, WalReaderError};
pub use writer::{WalCounters, WalWriter};
