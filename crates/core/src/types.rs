//! Chat records and the options used to create them
//!
//! A [`Chat`] is immutable once written. It is stored as JSON with camelCase
//! field names in three places: the owner's messages partition, the owner's
//! dashboard (as the latest chat of its thread), and the thread partition.

use serde::{Deserialize, Serialize};

/// The atomic unit of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Message body (never empty)
    pub message: String,
    /// Media reference; may be the empty string
    pub media: String,
    /// `<createdMillis>!<senderUserId>`, unique per chat
    pub sender_key: String,
    /// Creation time in milliseconds since the Unix epoch
    pub created: i64,
    /// Recipient user ids, in caller order (never empty)
    pub recipients: Vec<String>,
    /// Sender key of the thread root this chat replies to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
}

impl Chat {
    /// Key of the thread this chat belongs to
    ///
    /// The reply target for replies, the chat's own sender key otherwise.
    pub fn thread_key(&self) -> &str {
        self.reply.as_deref().unwrap_or(&self.sender_key)
    }

    /// True when this chat started its thread
    pub fn is_thread_root(&self) -> bool {
        self.reply.is_none()
    }
}

/// Inputs to `add_chat` besides sender and body
///
/// `sender_key` and `created` are normally generated; supplying them makes a
/// write repeatable (retries, fixtures).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatOptions {
    /// Recipient user ids; must not be empty
    pub recipients: Vec<String>,
    /// Media reference; required, may be empty
    pub media: Option<String>,
    /// Explicit sender key
    pub sender_key: Option<String>,
    /// Explicit creation time (ms since epoch)
    pub created: Option<i64>,
    /// Thread root being replied to
    pub reply: Option<String>,
}

impl ChatOptions {
    /// Options addressed to `recipients` with no media set
    pub fn new<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChatOptions {
            recipients: recipients.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the media reference
    pub fn media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    /// Set an explicit sender key
    pub fn sender_key(mut self, key: impl Into<String>) -> Self {
        self.sender_key = Some(key.into());
        self
    }

    /// Set an explicit creation time
    pub fn created(mut self, created: i64) -> Self {
        self.created = Some(created);
        self
    }

    /// Reply to the thread rooted at `root`
    pub fn reply(mut self, root: impl Into<String>) -> Self {
        self.reply = Some(root.into());
        self
    }
}

/// One scanned entry: the partition key and the chat stored under it
///
/// For dashboard scans `key` is the thread root; for thread scans it is the
/// chat's sender key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    /// Key within the scanned partition
    pub key: String,
    /// Stored chat
    pub chat: Chat,
}
