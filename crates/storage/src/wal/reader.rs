//! WAL reader for recovery and replay.

use super::format::{WalRecord, WalRecordError, WalSegment, SEGMENT_HEADER_SIZE};
use std::path::Path;

/// WAL reader for iterating over records in segments.
#[derive(Debug, Default)]
pub struct WalReader;

impl WalReader {
    /// Create a new WAL reader.
    pub fn new() -> Self {
        WalReader
    }

    /// Read all records from a single segment.
    ///
    /// Returns records in order, stopping at the first invalid/incomplete
    /// record. The returned position is the byte offset where valid records
    /// end (for truncation).
    pub fn read_segment(
        &self,
        wal_dir: &Path,
        segment_number: u64,
    ) -> Result<SegmentRead, WalReaderError> {
        let mut segment = WalSegment::open_read(wal_dir, segment_number)
            .map_err(|e| WalReaderError::IoError(e.to_string()))?;
        let buffer = segment
            .read_body()
            .map_err(|e| WalReaderError::IoError(e.to_string()))?;

        let mut records = Vec::new();
        let mut offset = 0;
        let mut stop_reason = ReadStopReason::EndOfData;

        while offset < buffer.len() {
            match WalRecord::from_bytes(&buffer[offset..]) {
                Ok((record, consumed)) => {
                    records.push(record);
                    offset += consumed;
                }
                Err(WalRecordError::InsufficientData) => {
                    // Partial record at end - expected after a crash mid-append
                    stop_reason = ReadStopReason::PartialRecord;
                    break;
                }
                Err(WalRecordError::ChecksumMismatch { .. }) => {
                    stop_reason = ReadStopReason::ChecksumMismatch { offset };
                    break;
                }
                Err(e) => {
                    stop_reason = ReadStopReason::ParseError {
                        offset,
                        detail: e.to_string(),
                    };
                    break;
                }
            }
        }

        Ok(SegmentRead {
            records,
            valid_end: (SEGMENT_HEADER_SIZE + offset) as u64,
            size: segment.size(),
            stop_reason,
            store_uuid: segment.store_uuid(),
        })
    }

    /// Read all records from all segments in a WAL directory.
    ///
    /// Only the last segment may end in a damaged tail; it is reported in
    /// `truncate_info`. A last segment too short to hold its header (a crash
    /// during rotation) holds no records and is reported in
    /// `headerless_segment`. Damage in any earlier segment, or segments
    /// stamped with different store UUIDs, is an error.
    pub fn read_all(&self, wal_dir: &Path) -> Result<WalReadResult, WalReaderError> {
        let mut segments = self.list_segments(wal_dir)?;

        let mut headerless_segment = None;
        if let Some(&last) = segments.last() {
            let len = std::fs::metadata(WalSegment::segment_path(wal_dir, last))
                .map_err(|e| WalReaderError::IoError(e.to_string()))?
                .len();
            if len < SEGMENT_HEADER_SIZE as u64 {
                headerless_segment = Some(last);
                segments.pop();
            }
        }

        let mut all_records = Vec::new();
        let mut truncate_info = None;
        let mut last_stop_reason = ReadStopReason::EndOfData;
        let mut store_uuid = None;

        for (idx, segment_num) in segments.iter().enumerate() {
            let read = self.read_segment(wal_dir, *segment_num)?;
            let is_last = idx == segments.len() - 1 && headerless_segment.is_none();

            match store_uuid {
                None => store_uuid = Some(read.store_uuid),
                Some(expected) if expected != read.store_uuid => {
                    return Err(WalReaderError::UuidMismatch {
                        segment_number: *segment_num,
                    });
                }
                Some(_) => {}
            }

            if read.stop_reason != ReadStopReason::EndOfData && !is_last {
                return Err(WalReaderError::CorruptSegment {
                    segment_number: *segment_num,
                    reason: read.stop_reason,
                });
            }

            if is_last && read.valid_end < read.size {
                truncate_info = Some(TruncateInfo {
                    segment_number: *segment_num,
                    valid_end: read.valid_end,
                    original_size: read.size,
                });
            }

            all_records.extend(read.records);
            last_stop_reason = read.stop_reason;
        }

        Ok(WalReadResult {
            records: all_records,
            truncate_info,
            stop_reason: last_stop_reason,
            store_uuid,
            last_segment: segments.last().copied(),
            headerless_segment,
        })
    }

    /// List all segment numbers in the WAL directory, ascending.
    pub fn list_segments(&self, wal_dir: &Path) -> Result<Vec<u64>, WalReaderError> {
        let mut segments = Vec::new();

        let entries =
            std::fs::read_dir(wal_dir).map_err(|e| WalReaderError::IoError(e.to_string()))?;

        for entry in entries {
            let entry = entry.map_err(|e| WalReaderError::IoError(e.to_string()))?;
            let name = entry.file_name().to_string_lossy().to_string();

            // Expected format: "wal-NNNNNN.seg"
            if let Some(num) = name
                .strip_prefix("wal-")
                .and_then(|rest| rest.strip_suffix(".seg"))
                .and_then(|digits| digits.parse::<u64>().ok())
            {
                segments.push(num);
            }
        }

        segments.sort_unstable();
        Ok(segments)
    }
}

/// Records read from one segment
#[derive(Debug)]
pub struct SegmentRead {
    /// Valid records in order
    pub records: Vec<WalRecord>,
    /// Byte offset just past the last valid record
    pub valid_end: u64,
    /// Segment size on disk
    pub size: u64,
    /// Why reading stopped
    pub stop_reason: ReadStopReason,
    /// Store UUID from the segment header
    pub store_uuid: [u8; 16],
}

/// Reason why record reading stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStopReason {
    /// Successfully read all records to end of data
    EndOfData,
    /// Partial record at end of segment (expected after crash)
    PartialRecord,
    /// CRC checksum mismatch - data is corrupted
    ChecksumMismatch {
        /// Byte offset after the header where the mismatch was detected
        offset: usize,
    },
    /// CRC was valid but payload could not be parsed
    ParseError {
        /// Byte offset after the header where parsing failed
        offset: usize,
        /// Human-readable error description
        detail: String,
    },
}

/// Truncation needed to drop a damaged tail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateInfo {
    /// Segment holding the damaged tail
    pub segment_number: u64,
    /// Offset where valid data ends
    pub valid_end: u64,
    /// Size before truncation
    pub original_size: u64,
}

impl TruncateInfo {
    /// Number of bytes that will be discarded
    pub fn bytes_to_truncate(&self) -> u64 {
        self.original_size - self.valid_end
    }
}

/// Result of reading a whole WAL directory
#[derive(Debug)]
pub struct WalReadResult {
    /// All valid records in replay order
    pub records: Vec<WalRecord>,
    /// Tail truncation required on the last segment, if any
    pub truncate_info: Option<TruncateInfo>,
    /// Stop reason of the last segment
    pub stop_reason: ReadStopReason,
    /// Store UUID shared by the segments (None when there are no segments)
    pub store_uuid: Option<[u8; 16]>,
    /// Highest segment number holding a header
    pub last_segment: Option<u64>,
    /// Trailing segment file cut off before its header was complete
    pub headerless_segment: Option<u64>,
}

/// WAL reader errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalReaderError {
    /// I/O error while listing or reading segments
    #[error("I/O error: {0}")]
    IoError(String),

    /// A segment other than the last one is damaged
    #[error("Segment {segment_number} is corrupt: {reason:?}")]
    CorruptSegment {
        /// Damaged segment
        segment_number: u64,
        /// Where reading stopped
        reason: ReadStopReason,
    },

    /// Segment belongs to a different store
    #[error("Segment {segment_number} has a foreign store UUID")]
    UuidMismatch {
        /// Offending segment
        segment_number: u64,
    },
}
