//! On-disk WAL layout: segment files and the records inside them.
//!
//! Segment files are `wal-NNNNNN.seg`, numbered from 1.
//!
//! # Segment Layout
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ Header: magic, version, no., UUID  │
//! ├────────────────────────────────────┤
//! │ Record                             │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! # Record Layout
//!
//! ```text
//! ┌────────────┬─────────────┬────────┬──────────────┬─────┬────────────────┬───────┬──────────┐
//! │ Length (4) │ Version (1) │ Op (1) │ Key len (4)  │ Key │ Value len (4)* │ Value*│ CRC32 (4)│
//! └────────────┴─────────────┴────────┴──────────────┴─────┴────────────────┴───────┴──────────┘
//! * present for puts only
//! ```
//!
//! Length counts every byte after itself, CRC included. The CRC covers
//! version through value.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use crc32fast::Hasher;
use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic bytes identifying a WAL segment file
pub const SEGMENT_MAGIC: [u8; 4] = *b"TCHT";

/// Segment header layout version
pub const SEGMENT_FORMAT_VERSION: u32 = 1;

/// Bytes before the first record of a segment
pub const SEGMENT_HEADER_SIZE: usize = 32;

/// Record layout version, first payload byte
pub const WAL_RECORD_FORMAT_VERSION: u8 = 1;

// version + op + key_len + crc
const MIN_RECORD_LEN: usize = 1 + 1 + 4 + 4;

/// Fixed-size header at offset 0 of every segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Magic bytes: "TCHT"
    pub magic: [u8; 4],

    /// Must equal `SEGMENT_FORMAT_VERSION`
    pub format_version: u32,

    /// Same number as in the file name
    pub segment_number: u64,

    /// Store UUID, identical across all segments of one store
    pub store_uuid: [u8; 16],
}

impl SegmentHeader {
    /// Header for segment `segment_number`
    pub fn new(segment_number: u64, store_uuid: [u8; 16]) -> Self {
        SegmentHeader {
            magic: SEGMENT_MAGIC,
            format_version: SEGMENT_FORMAT_VERSION,
            segment_number,
            store_uuid,
        }
    }

    /// Little-endian header bytes
    pub fn to_bytes(&self) -> [u8; SEGMENT_HEADER_SIZE] {
        let mut bytes = [0u8; SEGMENT_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut bytes[4..8], self.format_version);
        LittleEndian::write_u64(&mut bytes[8..16], self.segment_number);
        bytes[16..32].copy_from_slice(&self.store_uuid);
        bytes
    }

    /// Parse a header; check it with [`is_valid`](Self::is_valid)
    pub fn from_bytes(bytes: &[u8; SEGMENT_HEADER_SIZE]) -> Self {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        let mut store_uuid = [0u8; 16];
        store_uuid.copy_from_slice(&bytes[16..32]);

        SegmentHeader {
            magic,
            format_version: LittleEndian::read_u32(&bytes[4..8]),
            segment_number: LittleEndian::read_u64(&bytes[8..16]),
            store_uuid,
        }
    }

    /// Validate magic bytes and format version.
    pub fn is_valid(&self) -> bool {
        self.magic == SEGMENT_MAGIC && self.format_version == SEGMENT_FORMAT_VERSION
    }
}

/// Open segment file
///
/// Segments opened with `open_read` or closed after rotation reject writes.
#[derive(Debug)]
pub struct WalSegment {
    file: File,
    segment_number: u64,
    write_position: u64,
    path: PathBuf,
    closed: bool,
    store_uuid: [u8; 16],
}

impl WalSegment {
    /// Create a new WAL segment and write its header.
    pub fn create(dir: &Path, segment_number: u64, store_uuid: [u8; 16]) -> std::io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);

        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .read(true)
            .open(&path)?;

        let header = SegmentHeader::new(segment_number, store_uuid);
        file.write_all(&header.to_bytes())?;

        Ok(WalSegment {
            file,
            segment_number,
            write_position: SEGMENT_HEADER_SIZE as u64,
            path,
            closed: false,
            store_uuid,
        })
    }

    /// Open for replay; writes are rejected
    pub fn open_read(dir: &Path, segment_number: u64) -> std::io::Result<Self> {
        let mut segment = Self::open_existing(dir, segment_number, false)?;
        segment.closed = true;
        Ok(segment)
    }

    /// Open positioned at the end, for appends and tail truncation
    pub fn open_append(dir: &Path, segment_number: u64) -> std::io::Result<Self> {
        Self::open_existing(dir, segment_number, true)
    }

    fn open_existing(dir: &Path, segment_number: u64, write: bool) -> std::io::Result<Self> {
        let path = Self::segment_path(dir, segment_number);

        let mut file = OpenOptions::new().read(true).write(write).open(&path)?;

        let mut header_bytes = [0u8; SEGMENT_HEADER_SIZE];
        file.read_exact(&mut header_bytes)?;
        let header = SegmentHeader::from_bytes(&header_bytes);

        if !header.is_valid() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "not a threadchat WAL segment (bad magic or version)",
            ));
        }

        if header.segment_number != segment_number {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "segment file {} carries header number {}",
                    segment_number, header.segment_number
                ),
            ));
        }

        let write_position = file.seek(SeekFrom::End(0))?;

        Ok(WalSegment {
            file,
            segment_number,
            write_position,
            path,
            closed: false,
            store_uuid: header.store_uuid,
        })
    }

    /// `<dir>/wal-NNNNNN.seg`
    pub fn segment_path(dir: &Path, segment_number: u64) -> PathBuf {
        dir.join(format!("wal-{:06}.seg", segment_number))
    }

    /// Number of this segment
    pub fn segment_number(&self) -> u64 {
        self.segment_number
    }

    /// Bytes written so far, header included
    pub fn size(&self) -> u64 {
        self.write_position
    }

    /// Segment file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// UUID from the header
    pub fn store_uuid(&self) -> [u8; 16] {
        self.store_uuid
    }

    /// Append raw record bytes
    pub fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        if self.closed {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "segment is closed",
            ));
        }

        self.file.write_all(data)?;
        self.write_position += data.len() as u64;
        Ok(())
    }

    /// fsync
    pub fn sync(&mut self) -> std::io::Result<()> {
        self.file.sync_all()
    }

    /// fsync and reject further writes
    pub fn close(&mut self) -> std::io::Result<()> {
        if !self.closed {
            self.file.sync_all()?;
            self.closed = true;
        }
        Ok(())
    }

    /// True once writes are rejected
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read every byte after the header.
    pub fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(SEGMENT_HEADER_SIZE as u64))?;
        let mut buffer = Vec::new();
        self.file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Cut the file at `position` and continue appending from there
    pub fn truncate(&mut self, position: u64) -> std::io::Result<()> {
        if self.closed {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "segment is closed",
            ));
        }

        self.file.set_len(position)?;
        self.file.sync_all()?;
        self.write_position = position;
        self.file.seek(SeekFrom::Start(position))?;
        Ok(())
    }
}

/// Operation recorded in a WAL record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WalOp {
    /// Insert or overwrite a key
    Put = 1,
    /// Remove a key
    Delete = 2,
}

impl WalOp {
    fn from_u8(b: u8) -> Option<Self> {
        match b {
            1 => Some(WalOp::Put),
            2 => Some(WalOp::Delete),
            _ => None,
        }
    }
}

/// One store mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// `put(key, value)`
    Put {
        /// Physical key
        key: Vec<u8>,
        /// Stored value
        value: Vec<u8>,
    },
    /// `delete(key)`
    Delete {
        /// Physical key
        key: Vec<u8>,
    },
}

impl WalRecord {
    /// Record a put
    pub fn put(key: &[u8], value: &[u8]) -> Self {
        WalRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }
    }

    /// Record a delete
    pub fn delete(key: &[u8]) -> Self {
        WalRecord::Delete { key: key.to_vec() }
    }

    /// Operation tag
    pub fn op(&self) -> WalOp {
        match self {
            WalRecord::Put { .. } => WalOp::Put,
            WalRecord::Delete { .. } => WalOp::Delete,
        }
    }

    /// Key touched by this record
    pub fn key(&self) -> &[u8] {
        match self {
            WalRecord::Put { key, .. } | WalRecord::Delete { key } => key,
        }
    }

    /// Framed bytes ready to append to a segment
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(MIN_RECORD_LEN + self.key().len());
        payload.push(WAL_RECORD_FORMAT_VERSION);
        payload.push(self.op() as u8);
        push_u32(&mut payload, self.key().len() as u32);
        payload.extend_from_slice(self.key());
        if let WalRecord::Put { value, .. } = self {
            push_u32(&mut payload, value.len() as u32);
            payload.extend_from_slice(value);
        }

        let crc = compute_crc(&payload);

        let total_len = payload.len() + 4;
        let mut record = Vec::with_capacity(4 + total_len);
        push_u32(&mut record, total_len as u32);
        record.extend_from_slice(&payload);
        push_u32(&mut record, crc);
        record
    }

    /// Parse one framed record from the front of `bytes`
    ///
    /// Returns the record and the number of bytes it occupied.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), WalRecordError> {
        if bytes.len() < 4 {
            return Err(WalRecordError::InsufficientData);
        }

        let length = LittleEndian::read_u32(&bytes[0..4]) as usize;

        if length < MIN_RECORD_LEN {
            return Err(WalRecordError::InvalidFormat);
        }

        if bytes.len() < 4 + length {
            return Err(WalRecordError::InsufficientData);
        }

        let payload = &bytes[4..4 + length - 4];
        let stored_crc = LittleEndian::read_u32(&bytes[4 + length - 4..4 + length]);
        let computed_crc = compute_crc(payload);
        if computed_crc != stored_crc {
            return Err(WalRecordError::ChecksumMismatch {
                expected: stored_crc,
                computed: computed_crc,
            });
        }

        let record = Self::parse_payload(payload)?;
        Ok((record, 4 + length))
    }

    fn parse_payload(payload: &[u8]) -> Result<Self, WalRecordError> {
        let mut cursor = Cursor::new(payload);

        let version = cursor.read_u8().map_err(|_| WalRecordError::InvalidFormat)?;
        if version != WAL_RECORD_FORMAT_VERSION {
            return Err(WalRecordError::UnsupportedVersion(version));
        }

        let op = cursor
            .read_u8()
            .ok()
            .and_then(WalOp::from_u8)
            .ok_or(WalRecordError::InvalidFormat)?;

        let key = read_chunk(&mut cursor)?;
        let record = match op {
            WalOp::Put => {
                let value = read_chunk(&mut cursor)?;
                WalRecord::Put { key, value }
            }
            WalOp::Delete => WalRecord::Delete { key },
        };

        if cursor.position() as usize != payload.len() {
            return Err(WalRecordError::InvalidFormat);
        }

        Ok(record)
    }
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    let mut b = [0u8; 4];
    LittleEndian::write_u32(&mut b, v);
    buf.extend_from_slice(&b);
}

fn read_chunk(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>, WalRecordError> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| WalRecordError::InvalidFormat)? as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(WalRecordError::InvalidFormat);
    }
    let mut chunk = vec![0u8; len];
    cursor
        .read_exact(&mut chunk)
        .map_err(|_| WalRecordError::InvalidFormat)?;
    Ok(chunk)
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Why a record could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalRecordError {
    /// Not enough data to parse record
    #[error("Insufficient data to parse record")]
    InsufficientData,

    /// Record format is invalid
    #[error("Invalid record format")]
    InvalidFormat,

    /// Checksum verification failed
    #[error("Checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum from record
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Unsupported format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),
}
