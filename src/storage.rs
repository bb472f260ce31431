// Key-value persistence for client-held state (cart, chat history, currency preference).
// Stands in for browser local storage; implementations never surface I/O errors to
// callers, they log and fall back to defaults.

use anyhow::Context;
use dashmap::DashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

// Fixed keys the marketplace persists under
pub const CART_KEY: &str = "trip_cart";
pub const CHAT_HISTORY_KEY: &str = "assistant_history";
pub const CURRENCY_KEY: &str = "display_currency";

// Store trait to implement; swappable for file-backed or in-memory variants in tests
pub trait StateStore: Send + Sync + 'static {
    // Retrieve the value stored under key, or None if absent or unreadable
    fn get(&self, key: &str) -> Option<String>;

    // Persist value under key; failures are logged and swallowed
    fn set(&self, key: &str, value: &str);

    // Remove the value stored under key, if any
    fn remove(&self, key: &str);
}

// In-memory store used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

// File-backed store, one file per key under a configured directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn try_read(&self, key: &str) -> anyhow::Result<String> {
        let path = self.path_for(key);
        fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
    }

    fn try_write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("writing {}", path.display()))
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.try_read(key) {
            Ok(value) => Some(value),
            Err(e) => {
                // Missing files are the normal first-run case, not worth a log line
                if e.downcast_ref::<std::io::Error>()
                    .map_or(true, |io| io.kind() != ErrorKind::NotFound)
                {
                    warn!("State read failed for key {}: {:#}", key, e);
                }
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.try_write(key, value) {
            warn!("State write failed for key {}: {:#}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("State remove failed for key {}: {}", key, e);
            }
        }
    }
}
