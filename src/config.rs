//! Store configuration via `threadchat.toml`
//!
//! On first open a commented default `threadchat.toml` is written into the
//! store directory. To change settings, edit the file and reopen.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use threadchat_core::{ChatError, ChatResult, StoreError};
use threadchat_storage::DurabilityMode;

/// Config file name placed in the store directory.
pub const CONFIG_FILE_NAME: &str = "threadchat.toml";

/// Default store directory
pub const DEFAULT_STORE_PATH: &str = "./db";

/// Default number of entries returned by `get_chats` / `get_thread`
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Chat store configuration.
///
/// # Example
///
/// ```toml
/// store_path = "./db"
/// page_limit = 10
/// durability = "standard"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Directory holding the WAL, lock file, and this config.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Maximum entries per `get_chats` / `get_thread` call.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Durability mode: `"standard"` or `"always"`.
    #[serde(default = "default_durability_str")]
    pub durability: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

fn default_durability_str() -> String {
    "standard".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            page_limit: default_page_limit(),
            durability: default_durability_str(),
        }
    }
}

impl ChatConfig {
    /// Default config rooted at `path`
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: path.into(),
            ..Self::default()
        }
    }

    /// Set the page limit (builder pattern).
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Set the durability string (builder pattern).
    pub fn with_durability(mut self, durability: impl Into<String>) -> Self {
        self.durability = durability.into();
        self
    }

    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the string is not `"standard"` or `"always"`.
    pub fn durability_mode(&self) -> ChatResult<DurabilityMode> {
        match self.durability.as_str() {
            "standard" => Ok(DurabilityMode::standard_default()),
            "always" => Ok(DurabilityMode::Always),
            other => Err(ChatError::invalid_argument(format!(
                "Invalid durability mode '{}' in {}. Expected \"standard\" or \"always\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> ChatResult<()> {
        if self.page_limit == 0 {
            return Err(ChatError::invalid_argument("page_limit must be at least 1"));
        }
        self.durability_mode()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# threadchat store configuration
#
# Directory holding the write-ahead log and this file.
# Ignored when the store is opened by path; that path wins.
store_path = "./db"

# Maximum entries returned by one get_chats / get_thread call (default: 10)
page_limit = 10

# Durability mode: "standard" (default) or "always"
#   "standard" = fsync every 1000 writes or 100ms, may lose the last batch on crash
#   "always"   = fsync every write
durability = "standard"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// `Internal` if the file cannot be read, `InvalidArgument` if it does
    /// not parse or fails validation.
    pub fn from_file(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path).map_err(StoreError::from)?;
        let config: ChatConfig = toml::from_str(&content).map_err(|e| {
            ChatError::invalid_argument(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> ChatResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(StoreError::from)?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> ChatResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            StoreError::Serialization(format!("Failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content).map_err(StoreError::from)?;
        Ok(())
    }
}
