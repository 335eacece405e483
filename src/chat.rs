//! The per-user chat facade.
//!
//! A [`ThreadedChat`] is bound to one owning user and one ordered store.
//! Several facades (one per user) may share a store: opening the same path
//! twice returns the same [`DurableStore`] instance.
//!
//! # Example
//!
//! ```text
//! use threadchat::{ChatOptions, ThreadedChat};
//!
//! let alice = ThreadedChat::open("alice", "./db")?;
//! let chat = alice.add_chat("alice", "hi", ChatOptions::new(["bob"]).media(""))?;
//! let page = alice.get_chats(None, true)?;
//! assert_eq!(page[0].key, chat.sender_key);
//! ```

use std::path::Path;
use std::sync::Arc;

use threadchat_core::key::validate_user_id;
use threadchat_core::{ChatError, ChatResult, OrderedStore, PartitionName, Purpose, StoreError};
use threadchat_storage::{DurableStore, MemoryStore, WalConfig};
use tracing::{debug, info};

use crate::config::{ChatConfig, CONFIG_FILE_NAME, DEFAULT_PAGE_LIMIT};
use crate::partition::Partition;

/// Threaded chat store for one user.
pub struct ThreadedChat {
    user: String,
    store: Arc<dyn OrderedStore>,
    /// Present when backed by a WAL; used for `flush`
    durable: Option<Arc<DurableStore>>,
    page_limit: usize,
}

impl ThreadedChat {
    /// Open the store at `path` for `user`.
    ///
    /// Writes a default `threadchat.toml` into `path` if none exists, then
    /// loads it. The `store_path` inside the file is ignored in favour of
    /// `path`.
    pub fn open<P: AsRef<Path>>(user: &str, path: P) -> ChatResult<Self> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(StoreError::from)?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        ChatConfig::write_default_if_missing(&config_path)?;
        let mut config = ChatConfig::from_file(&config_path)?;
        config.store_path = data_dir;

        Self::open_store(user, &config)
    }

    /// Open the store described by `config` for `user`.
    ///
    /// The config is persisted to `<store_path>/threadchat.toml`.
    pub fn open_with_config(user: &str, config: ChatConfig) -> ChatResult<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.store_path).map_err(StoreError::from)?;
        config.write_to_file(&config.store_path.join(CONFIG_FILE_NAME))?;

        Self::open_store(user, &config)
    }

    fn open_store(user: &str, config: &ChatConfig) -> ChatResult<Self> {
        check_user(user)?;
        config.validate()?;

        let store = DurableStore::open_with_config(
            &config.store_path,
            config.durability_mode()?,
            WalConfig::default(),
        )?;

        info!(
            target: "threadchat::chat",
            user,
            path = ?store.path(),
            page_limit = config.page_limit,
            "Opened chat store"
        );

        Ok(ThreadedChat {
            user: user.to_string(),
            store: store.clone(),
            durable: Some(store),
            page_limit: config.page_limit,
        })
    }

    /// In-memory store for `user` with the default page limit.
    pub fn ephemeral(user: &str) -> ChatResult<Self> {
        Self::with_store(user, Arc::new(MemoryStore::new()), DEFAULT_PAGE_LIMIT)
    }

    /// Bind `user` to an existing store.
    pub fn with_store(
        user: &str,
        store: Arc<dyn OrderedStore>,
        page_limit: usize,
    ) -> ChatResult<Self> {
        check_user(user)?;
        if page_limit == 0 {
            return Err(ChatError::invalid_argument("page_limit must be at least 1"));
        }

        Ok(ThreadedChat {
            user: user.to_string(),
            store,
            durable: None,
            page_limit,
        })
    }

    /// Owning user id
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Entries returned per `get_chats` / `get_thread` call
    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Shared handle to the underlying store
    pub fn store(&self) -> Arc<dyn OrderedStore> {
        self.store.clone()
    }

    /// Resolve a partition by name.
    ///
    /// Pure function of `name`; every call returns a fresh handle.
    pub fn partition(&self, name: PartitionName) -> Partition {
        Partition::new(self.store.clone(), name)
    }

    /// Force buffered WAL records to disk. No-op for in-memory stores.
    pub fn flush(&self) -> ChatResult<()> {
        if let Some(durable) = &self.durable {
            durable.flush()?;
        }
        Ok(())
    }

    pub(crate) fn own(&self, purpose: Purpose) -> Partition {
        self.partition(PartitionName::for_user(&self.user, purpose))
    }

    pub(crate) fn thread(&self, root_key: &str) -> Partition {
        self.partition(PartitionName::for_thread(root_key))
    }
}

impl std::fmt::Debug for ThreadedChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedChat")
            .field("user", &self.user)
            .field("durable", &self.durable.is_some())
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

/// Validate a user id, mapping failures to `InvalidArgument`
pub(crate) fn check_user(user: &str) -> ChatResult<()> {
    validate_user_id(user).map_err(|e| {
        debug!(target: "threadchat::chat", reason = e.reason_code(), "Rejected user id");
        ChatError::invalid_argument(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ephemeral_defaults() {
        let chat = ThreadedChat::ephemeral("alice").unwrap();
        assert_eq!(chat.user(), "alice");
        assert_eq!(chat.page_limit(), 10);
        chat.flush().unwrap();
    }

    #[test]
    fn test_blank_owner_rejected() {
        assert!(matches!(
            ThreadedChat::ephemeral(""),
            Err(ChatError::InvalidArgument(_))
        ));
        assert!(matches!(
            ThreadedChat::ephemeral("  "),
            Err(ChatError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zero_page_limit_rejected() {
        let err = ThreadedChat::with_store("alice", Arc::new(MemoryStore::new()), 0).unwrap_err();
        assert!(matches!(err, ChatError::InvalidArgument(_)));
    }

    #[test]
    fn test_open_writes_default_config() {
        let dir = TempDir::new().unwrap();
        let chat = ThreadedChat::open("alice", dir.path()).unwrap();
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
        assert_eq!(chat.page_limit(), 10);
    }

    #[test]
    fn test_open_reads_existing_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "page_limit = 4\n").unwrap();
        let chat = ThreadedChat::open("alice", dir.path()).unwrap();
        assert_eq!(chat.page_limit(), 4);
    }

    #[test]
    fn test_open_with_config_persists() {
        let dir = TempDir::new().unwrap();
        let config = ChatConfig::at(dir.path())
            .with_page_limit(3)
            .with_durability("always");
        let chat = ThreadedChat::open_with_config("alice", config.clone()).unwrap();
        assert_eq!(chat.page_limit(), 3);

        let saved = ChatConfig::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(saved, config);
    }

    #[test]
    fn test_open_with_bad_config() {
        let dir = TempDir::new().unwrap();
        let config = ChatConfig::at(dir.path()).with_durability("sometimes");
        assert!(matches!(
            ThreadedChat::open_with_config("alice", config),
            Err(ChatError::InvalidArgument(_))
        ));
        assert!(!dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_users_share_store_at_same_path() {
        let dir = TempDir::new().unwrap();
        let alice = ThreadedChat::open("alice", dir.path()).unwrap();
        let bob = ThreadedChat::open("bob", dir.path()).unwrap();
        let (a, b) = (alice.store(), bob.store());
        assert!(std::ptr::eq(
            Arc::as_ptr(&a) as *const (),
            Arc::as_ptr(&b) as *const ()
        ));
    }
}
