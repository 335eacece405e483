//! Segment sizing for the WAL writer.

use super::format::SEGMENT_HEADER_SIZE;

/// WAL writer settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalConfig {
    /// Rotation threshold in bytes (default 64 MiB)
    ///
    /// A record that would push a non-empty segment past this size goes
    /// into a new segment. A single oversized record still fits in an
    /// empty one.
    pub segment_size: u64,
}

impl Default for WalConfig {
    fn default() -> Self {
        WalConfig {
            segment_size: 64 * 1024 * 1024,
        }
    }
}

impl WalConfig {
    /// Same as `default()`
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the rotation threshold
    pub fn with_segment_size(mut self, size: u64) -> Self {
        self.segment_size = size;
        self
    }

    /// Reject segments under 1 KiB
    pub fn validate(&self) -> Result<(), WalConfigError> {
        if self.segment_size < 1024 {
            return Err(WalConfigError::SegmentSizeTooSmall);
        }
        Ok(())
    }

    /// Tiny segments so tests rotate after a few records
    pub fn for_testing() -> Self {
        WalConfig {
            segment_size: 1024 + SEGMENT_HEADER_SIZE as u64,
        }
    }
}

/// Invalid [`WalConfig`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalConfigError {
    /// `segment_size` below 1024 bytes
    #[error("WAL segment size must be at least 1024 bytes")]
    SegmentSizeTooSmall,
}
