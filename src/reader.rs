//! Chat Reader
//!
//! Bounded, directional scans over the dashboard and thread partitions,
//! plus point lookups in the messages partition. Every scan returns at most
//! `page_limit` entries.

use threadchat_core::{Chat, ChatEntry, ChatError, ChatResult, Purpose};

use crate::chat::ThreadedChat;
use crate::partition::{Partition, ScanStart};

impl ThreadedChat {
    /// Latest chat of each thread on the owner's dashboard.
    ///
    /// `start` is inclusive: the lower bound when ascending, the upper
    /// bound when `reverse`. `None` starts at the partition edge.
    pub fn get_chats(&self, start: Option<&str>, reverse: bool) -> ChatResult<Vec<ChatEntry>> {
        let start = start.map_or(ScanStart::Edge, ScanStart::At);
        self.page(&self.own(Purpose::Dashboard), start, reverse)
    }

    /// Chats in the thread rooted at `root`.
    ///
    /// `since` is exclusive in both directions. Ascending scans skip
    /// `since` and every key it prefixes. Descending scans use the bound
    /// `Excluded(since)` and return keys strictly before it, so paging
    /// backwards from the oldest key seen never repeats that key.
    pub fn get_thread(
        &self,
        root: &str,
        since: Option<&str>,
        reverse: bool,
    ) -> ChatResult<Vec<ChatEntry>> {
        let start = since.map_or(ScanStart::Edge, ScanStart::After);
        self.page(&self.thread(root), start, reverse)
    }

    /// The chat stored under `sender_key` in the owner's messages.
    ///
    /// # Errors
    ///
    /// `NotFound` if no such chat exists.
    pub fn get_chat(&self, sender_key: &str) -> ChatResult<Chat> {
        self.own(Purpose::Messages)
            .get_json::<Chat>(sender_key)?
            .ok_or_else(|| ChatError::not_found(format!("chat {} not found", sender_key)))
    }

    fn page(
        &self,
        partition: &Partition,
        start: ScanStart<'_>,
        reverse: bool,
    ) -> ChatResult<Vec<ChatEntry>> {
        let entries = partition.scan_json::<Chat>(start, Some(self.page_limit()), reverse)?;
        Ok(entries
            .into_iter()
            .map(|(key, chat)| ChatEntry { key, chat })
            .collect())
    }
}
