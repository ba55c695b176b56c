//! Background poll loop driving periodic full syncs.
//!
//! Passes run strictly one at a time; the next tick waits for the current
//! pass to finish. Settings reload every iteration, so token, collection,
//! and interval changes take effect without a restart.

use sea_orm::DatabaseConnection;
use tokio::sync::watch;

use super::engine;
use super::types::SyncError;
use crate::remote::RecordStore;
use crate::store;

/// Run the poll loop until `shutdown` flips to true (or its sender drops).
///
/// `make_client` builds a record-store client from the currently stored
/// token; `overlay` lets the caller patch freshly loaded settings with
/// out-of-band credentials (the CLI's config file). An in-flight pass is
/// abandoned at its next await point when shutdown arrives.
pub async fn run_poller<R, F, O>(
    db: &DatabaseConnection,
    make_client: F,
    overlay: O,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), SyncError>
where
    R: RecordStore,
    F: Fn(&str) -> R,
    O: Fn(crate::store::SyncSettings) -> crate::store::SyncSettings,
{
    loop {
        if *shutdown.borrow() {
            return Ok(());
        }

        let settings = overlay(store::settings::load(db).await?);
        if settings.is_configured() {
            let token = settings.record_store_token.clone().unwrap_or_default();
            let client = make_client(&token);
            tokio::select! {
                result = engine::full_sync(db, &client, &settings) => match result {
                    Ok(report) => {
                        tracing::info!(
                            pulled = report.pulled,
                            pushed = report.pushed,
                            "poll pass finished"
                        );
                    }
                    Err(err) => tracing::error!(%err, "poll pass failed"),
                },
                _ = shutdown.changed() => {
                    tracing::info!("shutdown requested, abandoning in-flight pass");
                    return Ok(());
                }
            }
        } else {
            tracing::debug!("record store not configured, skipping poll tick");
        }

        tokio::select! {
            () = tokio::time::sleep(settings.interval()) => {}
            _ = shutdown.changed() => {
                tracing::info!("shutdown requested");
                return Ok(());
            }
        }
    }
}
