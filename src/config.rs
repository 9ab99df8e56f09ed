use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AlbumPickerError, Result};

const CLIENT_ID_VAR: &str = "SPOTIFY_CLIENT_ID";
const CLIENT_SECRET_VAR: &str = "SPOTIFY_CLIENT_SECRET";
const CONFIG_PATH_VAR: &str = "ALBUM_PICKER_CONFIG";

const KEYCHAIN_SERVICE: &str = "com.album-picker.spotify";
const KEYCHAIN_CLIENT_ID: &str = "client_id";
const KEYCHAIN_CLIENT_SECRET: &str = "client_secret";

/// Largest page the albums endpoint will return
pub const MAX_ALBUM_LIMIT: u32 = 50;
const MIN_CARD_WIDTH: usize = 16;

/// Application settings structure
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the Web API (search, albums)
    pub api_base_url: String,

    /// Base URL of the accounts service issuing tokens
    pub accounts_base_url: String,

    /// Market used to filter album availability
    pub market: String,

    /// Number of albums requested per search
    pub album_limit: u32,

    /// Cards per grid row
    pub grid_columns: usize,

    /// Width of one card in characters
    pub card_width: usize,

    /// Timeout applied to every outbound request
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.spotify.com".to_string(),
            accounts_base_url: "https://accounts.spotify.com".to_string(),
            market: "US".to_string(),
            album_limit: MAX_ALBUM_LIMIT,
            grid_columns: 3,
            card_width: 32,
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Get the path to the config file
    fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return Ok(PathBuf::from(path));
        }

        let home = std::env::var("HOME").map_err(|_| {
            AlbumPickerError::ConfigError("HOME environment variable not set".to_string())
        })?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("album-picker")
            .join("config.json"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from disk, or return default if file doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(config_path).map_err(|e| {
            AlbumPickerError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        match serde_json::from_str::<AppConfig>(&contents) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", config_path);
                Ok(config.normalized())
            }
            Err(e) => {
                log::warn!("Failed to parse config file ({}), using defaults", e);
                Ok(Self::default())
            }
        }
    }

    /// Clamp values the API or the grid cannot work with
    pub fn normalized(mut self) -> Self {
        self.album_limit = self.album_limit.clamp(1, MAX_ALBUM_LIMIT);
        self.grid_columns = self.grid_columns.max(1);
        self.card_width = self.card_width.max(MIN_CARD_WIDTH);
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self.accounts_base_url = self.accounts_base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Client credentials exchanged for a bearer token
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the environment, falling back to the OS keychain
    pub fn load() -> Result<Self> {
        Self::from_sources(|name| std::env::var(name).ok(), keychain_lookup)
    }

    /// Resolve each value from `env` first, then from `keychain`
    pub fn from_sources<E, K>(env: E, keychain: K) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
        K: Fn(&str) -> Result<Option<String>>,
    {
        let resolve = |var: &str, account: &str| -> Result<String> {
            if let Some(value) = env(var).filter(|v| !v.trim().is_empty()) {
                return Ok(value);
            }
            match keychain(account)? {
                Some(value) if !value.trim().is_empty() => {
                    log::info!("Read {} from keychain", account);
                    Ok(value)
                }
                _ => Err(AlbumPickerError::ConfigError(format!(
                    "{} environment variable not set",
                    var
                ))),
            }
        };

        Ok(Self {
            client_id: resolve(CLIENT_ID_VAR, KEYCHAIN_CLIENT_ID)?,
            client_secret: resolve(CLIENT_SECRET_VAR, KEYCHAIN_CLIENT_SECRET)?,
        })
    }
}

fn keychain_lookup(account: &str) -> Result<Option<String>> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, account)?;
    match entry.get_password() {
        Ok(value) => Ok(Some(value)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(AlbumPickerError::KeyringError(e)),
    }
}
