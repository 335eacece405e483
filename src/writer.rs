//! Chat Writer
//!
//! `add_chat` validates its input, then stores the chat three times:
//!
//! | Step | Partition | Key |
//! |------|-----------|-----|
//! | 1 | `<owner>!dashboard` | thread root key |
//! | 2 | `<owner>!messages` | sender key |
//! | 3 | `<root>!thread` | sender key |
//!
//! The steps run in order and stop at the first store failure. Completed
//! steps are not rolled back.

use chrono::Utc;
use threadchat_core::{Chat, ChatError, ChatOptions, ChatResult, Purpose};
use tracing::{debug, warn};

use crate::chat::ThreadedChat;

impl ThreadedChat {
    /// Store a chat from `sender` and return it.
    ///
    /// `options.reply` names the thread root to continue; without it the
    /// chat starts a new thread keyed by its own sender key.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - `InvalidArgument("chat cannot be empty")`
    /// - `InvalidArgument("requires at least 1 recipient")`
    /// - `InvalidArgument("media required")`
    /// - `Forbidden` if `sender` is in the owner's block list
    /// - `Internal` if any store write fails
    pub fn add_chat(&self, sender: &str, body: &str, options: ChatOptions) -> ChatResult<Chat> {
        if body.is_empty() {
            return Err(ChatError::invalid_argument("chat cannot be empty"));
        }
        if options.recipients.is_empty() {
            return Err(ChatError::invalid_argument("requires at least 1 recipient"));
        }
        let media = options
            .media
            .ok_or_else(|| ChatError::invalid_argument("media required"))?;
        if self.blocked(sender)? {
            return Err(ChatError::forbidden(format!(
                "{} is blocked by {}",
                sender,
                self.user()
            )));
        }

        let now = Utc::now().timestamp_millis();
        let chat = Chat {
            message: body.to_string(),
            media,
            sender_key: options
                .sender_key
                .unwrap_or_else(|| format!("{}!{}", now, sender)),
            created: options.created.unwrap_or(now),
            recipients: options.recipients,
            reply: options.reply,
        };

        let root = chat.thread_key();
        self.store_chat(root, &chat).map_err(|e| {
            warn!(
                target: "threadchat::chat",
                owner = self.user(),
                sender_key = %chat.sender_key,
                kind = e.kind(),
                error = %e,
                "Chat write stopped; earlier steps are kept"
            );
            e
        })?;

        debug!(
            target: "threadchat::chat",
            owner = self.user(),
            sender_key = %chat.sender_key,
            thread = root,
            new_thread = chat.is_thread_root(),
            recipients = chat.recipients.len(),
            "Stored chat"
        );
        Ok(chat)
    }

    fn store_chat(&self, root: &str, chat: &Chat) -> ChatResult<()> {
        self.own(Purpose::Dashboard).put_json(root, chat)?;
        self.own(Purpose::Messages).put_json(&chat.sender_key, chat)?;
        self.thread(root).put_json(&chat.sender_key, chat)?;
        Ok(())
    }
}
