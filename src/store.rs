//! Key-value persistence for launcher state
//!
//! Favorites and settings are small serialized records stored under a
//! namespace. Each namespace maps to one JSON object file under the XDG
//! state directory (`~/.local/state/wisp`), written whole on every save.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

/// String key-value store backing favorites and settings
///
/// Individual reads and writes are serialized by the implementation; a
/// `get_string` observes the latest completed `put_string` on that key.
pub trait KvStore: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>>;

    fn put_string(&self, key: &str, value: &str) -> Result<()>;

    /// Write several keys as one commit where the backend supports it
    fn put_strings(&self, entries: &[(&str, String)]) -> Result<()> {
        for (key, value) in entries {
            self.put_string(key, value)?;
        }
        Ok(())
    }
}

/// Resolve the state directory (`$XDG_STATE_HOME/wisp` or a fallback)
fn state_dir() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".local/state")))
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
        .join("wisp")
}

/// JSON-file-backed store, one file per namespace
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open a namespace under the default state directory
    pub fn open(namespace: &str) -> Self {
        Self::at(state_dir().join(format!("{}.json", namespace)))
    }

    /// Open a store at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::read_entries(&path);
        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened state file");
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn read_entries(path: &Path) -> HashMap<String, String> {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Unreadable state file, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    /// Serialize the full map and swap it into place
    fn write_entries(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("state file lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.put_strings(&[(key, value.to_string())])
    }

    fn put_strings(&self, batch: &[(&str, String)]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("state file lock poisoned"))?;
        for (key, value) in batch {
            entries.insert(key.to_string(), value.clone());
        }
        self.write_entries(&entries)
    }
}

/// In-memory store for tests and transient embedding
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
