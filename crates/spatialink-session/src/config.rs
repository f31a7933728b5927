//! Session configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use spatialink_types::DEFAULT_LOCATION_PRECISION;

/// Complete session configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Artist identity settings.
    #[serde(default)]
    pub artist: ArtistConfig,
    /// Claim ledger settings.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Metadata publication settings.
    #[serde(default)]
    pub publish: PublishConfig,
    /// Local storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Artist identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistConfig {
    /// Stable artist identity recorded as the claim owner.
    #[serde(default = "default_artist_id")]
    pub artist_id: String,
    /// Free-text label carried on claims for display.
    #[serde(default = "default_artist_id")]
    pub label: String,
}

/// Claim ledger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Backend selection: "memory" | "remote".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Anchor service base URL (remote backend only).
    #[serde(default = "default_ledger_url")]
    pub url: String,
    /// Seconds before a remote call is abandoned.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Location precision in micrometers. One constant, shared by the
    /// availability pre-check and the claim submission.
    #[serde(default = "default_precision")]
    pub location_precision: i64,
    /// Run the advisory availability pre-check before publishing.
    #[serde(default = "default_true")]
    pub check_availability: bool,
}

/// Metadata publication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Content store base URL.
    #[serde(default = "default_store_url")]
    pub content_store_url: String,
    /// Seconds before a publish attempt falls back to local storage.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Local storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

// Default value functions

fn default_artist_id() -> String {
    "SpatialInkArtist".to_string()
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_ledger_url() -> String {
    "http://localhost:8545".to_string()
}

fn default_store_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_precision() -> i64 {
    DEFAULT_LOCATION_PRECISION
}

fn default_true() -> bool {
    true
}

impl Default for ArtistConfig {
    fn default() -> Self {
        Self {
            artist_id: default_artist_id(),
            label: default_artist_id(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_ledger_url(),
            request_timeout_secs: default_timeout_secs(),
            location_precision: default_precision(),
            check_availability: true,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            content_store_url: default_store_url(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist. The loaded
    /// configuration is always validated.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no pipeline should run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.artist.artist_id.trim().is_empty() {
            anyhow::bail!("artist.artist_id must not be empty");
        }
        if self.ledger.location_precision < 1 {
            anyhow::bail!(
                "ledger.location_precision must be >= 1, got {}",
                self.ledger.location_precision
            );
        }
        match self.ledger.backend.as_str() {
            "memory" | "remote" => Ok(()),
            other => anyhow::bail!("ledger.backend must be \"memory\" or \"remote\", got {other:?}"),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("SPATIALINK_DATA_DIR") {
            return PathBuf::from(dir).join("config.toml");
        }
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("SPATIALINK_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/SpatialInk")
        }
        #[cfg(target_os = "windows")]
        {
            dirs_fallback("SpatialInk")
        }
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs_fallback(".spatialink")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/spatialink"))
}
