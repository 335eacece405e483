//! Relationship Store
//!
//! Follow and block sets are key-existence facts: JSON `true` stored under
//! the target user id in the owner's `followlist` / `blocklist` partition.
//!
//! ## Rules
//!
//! - Following a blocked user is `Forbidden`
//! - Blocking a user unfollows them first
//! - Every target id must be non-empty and not whitespace-only

use threadchat_core::{ChatError, ChatResult, Purpose};
use tracing::debug;

use crate::chat::{check_user, ThreadedChat};
use crate::partition::ScanStart;

impl ThreadedChat {
    /// Follow `user`. Idempotent. Returns the followed id.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty or blank id
    /// - `Forbidden` if `user` is blocked
    pub fn follow(&self, user: &str) -> ChatResult<String> {
        check_user(user)?;
        if self.blocked(user)? {
            return Err(ChatError::forbidden(format!(
                "{} is blocked by {}",
                user,
                self.user()
            )));
        }

        self.own(Purpose::FollowList).put_json(user, &true)?;
        debug!(target: "threadchat::chat", owner = self.user(), target_user = user, "Followed");
        Ok(user.to_string())
    }

    /// Stop following `user`; not following is not an error.
    pub fn unfollow(&self, user: &str) -> ChatResult<()> {
        check_user(user)?;
        self.own(Purpose::FollowList).delete(user)?;
        debug!(target: "threadchat::chat", owner = self.user(), target_user = user, "Unfollowed");
        Ok(())
    }

    /// Block `user`, unfollowing them first.
    ///
    /// The two writes are not atomic: if the block write fails the unfollow
    /// stays applied.
    pub fn block_user(&self, user: &str) -> ChatResult<()> {
        self.unfollow(user)?;
        self.own(Purpose::BlockList).put_json(user, &true)?;
        debug!(target: "threadchat::chat", owner = self.user(), target_user = user, "Blocked");
        Ok(())
    }

    /// Remove `user` from the block list.
    pub fn unblock_user(&self, user: &str) -> ChatResult<()> {
        check_user(user)?;
        self.own(Purpose::BlockList).delete(user)?;
        debug!(target: "threadchat::chat", owner = self.user(), target_user = user, "Unblocked");
        Ok(())
    }

    /// Every blocked user id, ascending.
    pub fn get_blocked_users(&self) -> ChatResult<Vec<String>> {
        self.list(Purpose::BlockList)
    }

    /// Every followed user id, ascending.
    pub fn get_following(&self) -> ChatResult<Vec<String>> {
        self.list(Purpose::FollowList)
    }

    /// `Ok(true)` if `user` is followed.
    ///
    /// # Errors
    ///
    /// `NotFound` if `user` is not followed.
    pub fn is_following(&self, user: &str) -> ChatResult<bool> {
        check_user(user)?;
        self.own(Purpose::FollowList)
            .get_json::<bool>(user)?
            .ok_or_else(|| ChatError::not_found(format!("{} does not follow {}", self.user(), user)))
    }

    /// True if `user` is in the block list.
    pub fn is_blocked(&self, user: &str) -> ChatResult<bool> {
        check_user(user)?;
        self.blocked(user)
    }

    /// Block-list lookup without id validation; gates `add_chat`.
    pub(crate) fn blocked(&self, user: &str) -> ChatResult<bool> {
        Ok(self.own(Purpose::BlockList).get(user)?.is_some())
    }

    fn list(&self, purpose: Purpose) -> ChatResult<Vec<String>> {
        let entries = self
            .own(purpose)
            .scan_json::<serde_json::Value>(ScanStart::Edge, None, false)?;
        Ok(entries.into_iter().map(|(user, _)| user).collect())
    }
}
