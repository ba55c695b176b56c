//! Shared helpers for command handlers.

use sea_orm::DatabaseConnection;
use studiosync::frameio::FrameioClient;
use studiosync::notion::NotionClient;
use studiosync::store::{self, SyncSettings};

use crate::config::Config;

pub(crate) async fn open_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
    Ok(studiosync::db::connect(database_url).await?)
}

/// Stored settings with config-file / environment credentials applied.
pub(crate) async fn load_settings(
    db: &DatabaseConnection,
    config: &Config,
) -> Result<SyncSettings, Box<dyn std::error::Error>> {
    Ok(config.overlay(store::settings::load(db).await?))
}

/// Record-store client, when the integration is configured.
pub(crate) fn record_client(settings: &SyncSettings) -> Option<NotionClient> {
    settings.is_configured().then(|| {
        NotionClient::new(
            settings
                .record_store_token
                .clone()
                .unwrap_or_default(),
        )
    })
}

/// Asset-service client, when a token is configured.
pub(crate) fn asset_client(settings: &SyncSettings) -> Option<FrameioClient> {
    settings
        .asset_service_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(FrameioClient::new)
}

/// Print an operation's log lines, indented under the current command.
pub(crate) fn print_logs(logs: &[String]) {
    for line in logs {
        println!("  {line}");
    }
}
