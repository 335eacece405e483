//! Storage layer for threadchat
//!
//! This crate implements the ordered stores behind the chat layer:
//! - MemoryStore: BTreeMap-based storage with RwLock
//! - DurableStore: MemoryStore rebuilt from a write-ahead log on open
//! - WAL: segment files of self-delimiting, CRC-checked records
//!
//! Both stores implement [`threadchat_core::OrderedStore`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod durable;
pub mod memory;
pub mod wal;

pub use durable::DurableStore;
pub use memory::MemoryStore;
pub use wal::{DurabilityMode, WalConfig};
