//! Key layout for threadchat
//!
//! Every logical partition is a prefix over one ordered keyspace. A stored
//! key is laid out as:
//!
//! ```text
//! 0xFF | partition name (UTF-8) | 0xFF | user key (UTF-8)
//! ```
//!
//! Partition names are `<owner>!<purpose>` for per-user partitions and
//! `<threadRootKey>!thread` for threads. `0xFF` is never produced by UTF-8,
//! so the separator cannot collide with name or key bytes, and appending it
//! to a user key yields a bound that sorts after every key sharing that
//! prefix.
//!
//! ## Contract
//!
//! User ids accepted by relationship operations:
//! - must not be empty
//! - must not be whitespace-only

use thiserror::Error;

/// Byte that frames partition names and serves as the exclusive-start sentinel
pub const KEY_SEPARATOR: u8 = 0xFF;

/// Suffix that turns a thread root key into its partition name
pub const THREAD_SUFFIX: &str = "thread";

/// Purpose of a per-user partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Every chat this user stored, keyed by sender key
    Messages,
    /// Latest chat per thread, keyed by thread root key
    Dashboard,
    /// Users this user follows
    FollowList,
    /// Users this user blocked
    BlockList,
}

impl Purpose {
    /// Name segment used in the partition name
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Messages => "messages",
            Purpose::Dashboard => "dashboard",
            Purpose::FollowList => "followlist",
            Purpose::BlockList => "blocklist",
        }
    }
}

/// Name of a logical partition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionName(String);

impl PartitionName {
    /// `<owner>!<purpose>`
    pub fn for_user(owner: &str, purpose: Purpose) -> Self {
        PartitionName(format!("{}!{}", owner, purpose.as_str()))
    }

    /// `<threadRootKey>!thread`
    pub fn for_thread(root_key: &str) -> Self {
        PartitionName(format!("{}!{}", root_key, THREAD_SUFFIX))
    }

    /// Borrow the name as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Physical prefix shared by every key in this partition
    pub fn prefix(&self) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(self.0.len() + 2);
        prefix.push(KEY_SEPARATOR);
        prefix.extend_from_slice(self.0.as_bytes());
        prefix.push(KEY_SEPARATOR);
        prefix
    }
}

impl std::fmt::Display for PartitionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a user key under a partition prefix
pub fn encode_key(prefix: &[u8], user_key: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(prefix.len() + user_key.len());
    key.extend_from_slice(prefix);
    key.extend_from_slice(user_key.as_bytes());
    key
}

/// Recover the user key from a stored key
///
/// Returns `None` if the key is outside the partition or not UTF-8.
pub fn decode_key<'a>(prefix: &[u8], key: &'a [u8]) -> Option<&'a str> {
    key.strip_prefix(prefix)
        .and_then(|rest| std::str::from_utf8(rest).ok())
}

/// First physical key strictly after `user_key` and every key it prefixes
pub fn exclusive_after(prefix: &[u8], user_key: &str) -> Vec<u8> {
    let mut key = encode_key(prefix, user_key);
    key.push(KEY_SEPARATOR);
    key
}

/// Validate a user id used as a relationship target
pub fn validate_user_id(user: &str) -> Result<(), KeyError> {
    if user.is_empty() {
        return Err(KeyError::Empty);
    }

    if user.trim().is_empty() {
        return Err(KeyError::Blank);
    }

    Ok(())
}

/// User id validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    /// User id is empty (length 0)
    #[error("Invalid user id: cannot be empty")]
    Empty,

    /// User id consists only of whitespace
    #[error("Invalid user id: cannot be whitespace only")]
    Blank,
}

impl KeyError {
    /// Short reason code
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::Empty => "empty_user_id",
            KeyError::Blank => "blank_user_id",
        }
    }
}
