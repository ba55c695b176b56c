//! Ingest one asset-service webhook event from a captured payload.

use std::io::Read;

use console::style;
use studiosync::asset::AssetService;
use studiosync::remote::RecordStore;
use studiosync::sync::{self, WebhookEvent};

use crate::commands::shared;
use crate::config::Config;

pub(crate) async fn handle_webhook(
    config: &Config,
    database_url: &str,
    payload: &str,
    secret: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = if payload == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(payload)?
    };
    let event: WebhookEvent = serde_json::from_str(&raw)?;

    let db = shared::open_db(database_url).await?;
    let settings = shared::load_settings(&db, config).await?;
    let record = shared::record_client(&settings);
    let assets = shared::asset_client(&settings);

    let report = sync::ingest_event(
        &db,
        record.as_ref().map(|c| c as &dyn RecordStore),
        assets.as_ref().map(|c| c as &dyn AssetService),
        &settings,
        &event,
        secret,
    )
    .await?;
    shared::print_logs(&report.logs);

    if report.handled {
        println!("{} comment relayed", style("✓").green());
    } else {
        println!("{} event acknowledged without action", style("-").yellow());
    }

    Ok(())
}
