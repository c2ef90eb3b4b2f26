use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Storage keys, shared with the pages that read them
pub const KEY_LOGGED_IN: &str = "loggedIn";
pub const KEY_USER_HASH: &str = "currentUserHash";
pub const KEY_USER_ROLE: &str = "currentUserRole";

const LOGGED_IN_VALUE: &str = "true";

/// String key-value storage that outlives a single page view.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object in the cache directory.
/// Every mutation rewrites the whole file.
pub struct FileStore {
    cache_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            lock: Mutex::new(()),
        }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let path = self.session_path();
        if entries.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove session file")?;
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.cache_dir)?;
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store lock poisoned"))?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }
}

/// Persisted proof that this context has logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMarker {
    pub logged_in: bool,
    pub user_hash: String,
    pub role: String,
}

impl SessionMarker {
    pub fn new(user_hash: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            logged_in: true,
            user_hash: user_hash.into(),
            role: role.into(),
        }
    }

    /// Read the marker. A logged-in flag without a hash and role is not a session.
    pub fn read(store: &dyn SessionStore) -> Result<Option<Self>> {
        if store.get(KEY_LOGGED_IN)?.as_deref() != Some(LOGGED_IN_VALUE) {
            return Ok(None);
        }

        let user_hash = store.get(KEY_USER_HASH)?.unwrap_or_default();
        let role = store.get(KEY_USER_ROLE)?.unwrap_or_default();
        if user_hash.is_empty() || role.is_empty() {
            debug!("Ignoring incomplete session marker");
            return Ok(None);
        }

        Ok(Some(Self::new(user_hash, role)))
    }

    pub fn write(&self, store: &dyn SessionStore) -> Result<()> {
        store.set(KEY_USER_HASH, &self.user_hash)?;
        store.set(KEY_USER_ROLE, &self.role)?;
        // Flag last, so a partial write never reads back as logged in
        store.set(KEY_LOGGED_IN, LOGGED_IN_VALUE)?;
        Ok(())
    }

    pub fn clear(store: &dyn SessionStore) -> Result<()> {
        store.remove(KEY_LOGGED_IN)?;
        store.remove(KEY_USER_HASH)?;
        store.remove(KEY_USER_ROLE)?;
        Ok(())
    }
}
