//! When the WAL writer calls fsync

/// fsync policy of a [`WalWriter`](super::WalWriter)
///
/// # Modes
///
/// | Mode | fsync after | Lost on crash |
/// |------|-------------|---------------|
/// | Always | Every record | Zero |
/// | Standard | Every N records or T ms | Up to batch/interval |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// fsync after every record (slow, maximum durability)
    Always,

    /// fsync every N records OR once T milliseconds have passed (the default)
    ///
    /// The interval is checked on append; an idle store syncs on
    /// `flush()` or when it is dropped.
    Standard {
        /// Sync once this many ms have passed since the last fsync
        interval_ms: u64,
        /// Sync once this many records are unsynced
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// True for `Always`
    pub fn requires_immediate_fsync(&self) -> bool {
        matches!(self, DurabilityMode::Always)
    }

    /// Label for logs
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::Always => "always: fsync per record",
            DurabilityMode::Standard { .. } => "standard: fsync per batch or interval",
        }
    }

    /// `Standard` with a 100 ms interval and 1000-record batches
    pub fn standard_default() -> Self {
        DurabilityMode::Standard {
            interval_ms: 100,
            batch_size: 1000,
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::standard_default()
    }
}
