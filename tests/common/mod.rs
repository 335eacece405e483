//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;`.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use parking_lot::Mutex;
use tempfile::TempDir;
use threadchat::{
    ChatConfig, ChatOptions, MemoryStore, OrderedStore, ScanOptions, StoreError, StoreResult,
    ThreadedChat,
};

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Options for a chat to `bob` with empty media.
pub fn to_bob() -> ChatOptions {
    ChatOptions::new(["bob"]).media("")
}

/// A durable store in a temp dir, opened for one user.
pub struct TestChat {
    pub chat: ThreadedChat,
    pub dir: TempDir,
}

impl TestChat {
    /// Durable store with `always` durability and the default page limit.
    pub fn new(user: &str) -> Self {
        Self::with_page_limit(user, 10)
    }

    pub fn with_page_limit(user: &str, page_limit: usize) -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = ChatConfig::at(dir.path())
            .with_page_limit(page_limit)
            .with_durability("always");
        let chat = ThreadedChat::open_with_config(user, config).expect("Failed to open store");
        TestChat { chat, dir }
    }

    /// Another user's facade over the same directory.
    pub fn open_as(&self, user: &str) -> ThreadedChat {
        ThreadedChat::open(user, self.dir.path()).expect("Failed to open store")
    }

    /// Drop the facade and reopen the directory, replaying the WAL.
    pub fn reopen(self) -> Self {
        let TestChat { chat, dir } = self;
        let user = chat.user().to_string();
        drop(chat);
        let chat = ThreadedChat::open(&user, dir.path()).expect("Failed to reopen store");
        TestChat { chat, dir }
    }
}

/// Store wrapper that fails operations on demand.
///
/// Once armed with `fail_after(n)`, the `n`th subsequent write (0-based)
/// and every write after it fail with `StoreError::Storage`. `fail_reads`
/// makes every get and scan fail the same way.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    puts_until_failure: Mutex<Option<usize>>,
    reads_fail: Mutex<bool>,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fail after `n` more successful puts.
    pub fn fail_after(&self, n: usize) {
        *self.puts_until_failure.lock() = Some(n);
    }

    /// Fail every get and scan until `heal`.
    pub fn fail_reads(&self) {
        *self.reads_fail.lock() = true;
    }

    pub fn heal(&self) {
        *self.puts_until_failure.lock() = None;
        *self.reads_fail.lock() = false;
    }

    fn check_read(&self) -> StoreResult<()> {
        if *self.reads_fail.lock() {
            return Err(StoreError::Storage("injected read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> StoreResult<()> {
        let mut remaining = self.puts_until_failure.lock();
        match remaining.as_mut() {
            Some(0) => Err(StoreError::Storage("injected write failure".to_string())),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl OrderedStore for FailingStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.check_read()?;
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.check_write()?;
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        self.check_write()?;
        self.inner.delete(key)
    }

    fn scan(&self, prefix: &[u8], options: &ScanOptions) -> StoreResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_read()?;
        self.inner.scan(prefix, options)
    }
}
