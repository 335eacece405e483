//! Core types and traits for threadchat
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: `StoreError` for engine failures, `ChatError` for the caller-facing taxonomy
//! - Chat / ChatOptions / ChatEntry: the persisted message record and its inputs
//! - Key layout: partition names, physical key encoding, the exclusive-start sentinel
//! - Traits: `OrderedStore`, the byte-ordered engine contract

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod traits;
pub mod types;

pub use error::{ChatError, ChatResult, StoreError, StoreResult};
pub use key::{PartitionName, Purpose, KEY_SEPARATOR};
pub use traits::{OrderedStore, ScanOptions};
pub use types::{Chat, ChatEntry, ChatOptions};
