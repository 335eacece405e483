//! threadchat - per-user threaded messaging over an ordered key-value store
//!
//! Each user owns four partitions (messages, dashboard, follow list, block
//! list) and every thread gets a partition of its own. Thread ordering,
//! dashboard fan-out, and reply linkage all fall out of key construction
//! over one ordered store; there are no secondary indexes.
//!
//! # Quick Start
//!
//! ```text
//! use threadchat::{ChatOptions, ThreadedChat};
//!
//! let alice = ThreadedChat::ephemeral("alice")?;
//! let root = alice.add_chat("alice", "hi", ChatOptions::new(["bob"]).media(""))?;
//! alice.add_chat("bob", "hey", ChatOptions::new(["alice"]).media("").reply(&root.sender_key))?;
//!
//! let thread = alice.get_thread(&root.sender_key, None, false)?;
//! assert_eq!(thread.len(), 2);
//! ```
//!
//! # Architecture
//!
//! - [`ThreadedChat`]: the facade, bound to one owner and one store
//! - [`Partition`]: prefix-scoped view of the store
//! - `threadchat-core`: errors, chat types, key layout, `OrderedStore`
//! - `threadchat-storage`: `MemoryStore` and the WAL-backed `DurableStore`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chat;
pub mod config;
pub mod partition;
mod reader;
mod relationships;
mod writer;

pub use chat::ThreadedChat;
pub use config::{ChatConfig, CONFIG_FILE_NAME};
pub use partition::{Partition, ScanStart};
pub use threadchat_core::{
    Chat, ChatEntry, ChatError, ChatOptions, ChatResult, OrderedStore, PartitionName, Purpose,
    ScanOptions, StoreError, StoreResult,
};
pub use threadchat_storage::{DurabilityMode, DurableStore, MemoryStore};
