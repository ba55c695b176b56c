//! Background watch mode: poll the record store until Ctrl+C.

use console::style;
use studiosync::notion::NotionClient;
use studiosync::sync;

use crate::commands::shared;
use crate::config::Config;
use crate::shutdown;

pub(crate) async fn handle_watch(
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = shared::open_db(database_url).await?;

    let settings = shared::load_settings(&db, config).await?;
    if !settings.is_configured() {
        println!(
            "{}",
            style(
                "Record store not configured; watch will idle until settings are saved. \
                 Press Ctrl+C to stop."
            )
            .yellow()
        );
    } else {
        println!(
            "Watching the record store every {}s. Press Ctrl+C to stop.",
            settings.interval().as_secs()
        );
    }

    let shutdown = shutdown::setup_shutdown_handler();

    sync::run_poller(
        &db,
        |token: &str| NotionClient::new(token),
        |settings| config.overlay(settings),
        shutdown,
    )
    .await?;

    println!("{} watch stopped", style("✓").green());
    Ok(())
}
