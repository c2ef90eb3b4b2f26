//! Application configuration management.
//!
//! This module handles loading and saving the configuration, which names the
//! credential sheet, the shared salt and digest, and the login and home pages.
//!
//! Configuration is stored at `~/.config/sitegate/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sitegate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Salt used when none is configured. Every client sees it, so it only
/// keeps the sheet free of plaintext; it is not a secret.
pub const DEFAULT_SALT: &str = "sitegate-static-salt";

/// Digest name, spelled the way the browser digest API spells it
pub const DEFAULT_HASH_ALGORITHM: &str = "SHA-256";

pub const DEFAULT_LOGIN_PAGE: &str = "login.html";
pub const DEFAULT_HOME_PAGE: &str = "index.html";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment overrides applied by `apply_env`
pub const ENV_SHEET_URL: &str = "SITEGATE_SHEET_URL";
pub const ENV_SALT: &str = "SITEGATE_SALT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Published credential sheet, gviz query URL
    pub sheet_url: String,
    pub salt: String,
    pub hash_algorithm: String,
    pub login_page: String,
    pub home_page: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_url: String::new(),
            salt: DEFAULT_SALT.to_string(),
            hash_algorithm: DEFAULT_HASH_ALGORITHM.to_string(),
            login_page: DEFAULT_LOGIN_PAGE.to_string(),
            home_page: DEFAULT_HOME_PAGE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Override fields from the environment when the variables are set and non-empty
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_SHEET_URL).filter(|v| !v.trim().is_empty()) {
            self.sheet_url = url;
        }
        if let Some(salt) = lookup(ENV_SALT).filter(|v| !v.is_empty()) {
            self.salt = salt;
        }
    }

    pub fn uses_default_salt(&self) -> bool {
        self.salt == DEFAULT_SALT
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file session store
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
