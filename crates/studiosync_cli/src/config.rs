//! Configuration file support for studiosync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `STUDIOSYNC_`, e.g., `STUDIOSYNC_DATABASE_URL`)
//! 3. Config file (~/.config/studiosync/config.toml or ./studiosync.toml)
//! 4. Built-in defaults
//!
//! The database URL defaults to `sqlite://~/.local/state/studiosync/studiosync.db`
//! on Linux (using the XDG state directory) if not explicitly configured.
//!
//! Service tokens normally live in the settings table (set via
//! `studiosync settings set`); values configured here override the stored
//! ones at runtime, which keeps secrets out of the database when preferred.
//!
//! Example config file:
//! ```toml
//! [database]
//! url = "sqlite://~/.local/state/studiosync/studiosync.db"  # optional, this is the default
//!
//! [record]
//! token = "secret_..."  # or use STUDIOSYNC_RECORD_TOKEN env var
//!
//! [asset]
//! token = "fio-..."     # or use STUDIOSYNC_ASSET_TOKEN env var
//!
//! [webhook]
//! secret = "..."        # or use STUDIOSYNC_WEBHOOK_SECRET env var
//! ```

use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use studiosync::store::SyncSettings;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Record store configuration.
    pub record: RecordConfig,
    /// Asset-review service configuration.
    pub asset: AssetConfig,
    /// Webhook receiver configuration.
    pub webhook: WebhookConfig,
}

/// Database configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL.
    /// Defaults to `sqlite://~/.local/state/studiosync/studiosync.db` if not specified.
    pub url: Option<String>,
}

/// Record store configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Record store API token.
    /// Can also be set via STUDIOSYNC_RECORD_TOKEN environment variable.
    pub token: Option<String>,
}

/// Asset-review service configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Asset service API token.
    /// Can also be set via STUDIOSYNC_ASSET_TOKEN environment variable.
    pub token: Option<String>,
}

/// Webhook receiver configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Shared secret expected from the webhook sender.
    /// Can also be set via STUDIOSYNC_WEBHOOK_SECRET environment variable.
    pub secret: Option<String>,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/studiosync/config.toml)
    /// 3. Local config file (./studiosync.toml)
    /// 4. Environment variables with STUDIOSYNC_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(proj_dirs) = ProjectDirs::from("", "", "studiosync") {
            let xdg_config = proj_dirs.config_dir().join("config.toml");
            if xdg_config.exists() {
                tracing::debug!("Loading config from {:?}", xdg_config);
                builder = builder.add_source(
                    File::from(xdg_config)
                        .format(FileFormat::Toml)
                        .required(false),
                );
            }
        }

        // Local config file (higher priority than XDG)
        let local_config = PathBuf::from("studiosync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./studiosync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        // STUDIOSYNC_ prefixed environment variables
        // e.g., STUDIOSYNC_DATABASE_URL -> database.url
        builder = builder.add_source(
            Environment::with_prefix("STUDIOSYNC")
                .separator("_")
                .try_parsing(true),
        );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// Get the database URL, falling back to the default state directory path.
    ///
    /// The `mode=rwc` parameter enables read-write access and creates the
    /// file if it doesn't exist.
    pub fn database_url(&self) -> Option<String> {
        self.database.url.clone().or_else(|| {
            Self::default_state_dir().map(|state_dir| {
                let db_path = state_dir.join("studiosync.db");
                format!("sqlite://{}?mode=rwc", db_path.display())
            })
        })
    }

    /// Overlay configured credentials on top of the stored settings.
    /// A token or secret from the config file or environment wins over the
    /// one in the settings table.
    pub fn overlay(&self, mut settings: SyncSettings) -> SyncSettings {
        if let Some(token) = &self.record.token {
            settings.record_store_token = Some(token.clone());
        }
        if let Some(token) = &self.asset.token {
            settings.asset_service_token = Some(token.clone());
        }
        if let Some(secret) = &self.webhook.secret {
            settings.webhook_secret = Some(secret.clone());
        }
        settings
    }

    /// Get the default state directory path.
    ///
    /// On Linux, this is `$XDG_STATE_HOME/studiosync` or `~/.local/state/studiosync`.
    /// On macOS/Windows, falls back to the data directory.
    pub fn default_state_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "studiosync").map(|dirs| {
            // state_dir() returns None on macOS/Windows, fall back to data_dir
            dirs.state_dir()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| dirs.data_dir().to_path_buf())
        })
    }
}
