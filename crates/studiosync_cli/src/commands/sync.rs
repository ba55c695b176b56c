//! Manual full sync: one pull-then-push pass against the record store.

use console::style;
use studiosync::sync::{self, SyncStatus};

use crate::commands::shared;
use crate::config::Config;

pub(crate) async fn handle_sync(
    config: &Config,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = shared::open_db(database_url).await?;
    let settings = shared::load_settings(&db, config).await?;

    let Some(client) = shared::record_client(&settings) else {
        println!(
            "{}",
            style(
                "Record store not configured. Set a token and collection id with \
                 `studiosync settings set`."
            )
            .yellow()
        );
        return Ok(());
    };

    println!("Running full sync...");
    let report = sync::full_sync(&db, &client, &settings).await?;
    shared::print_logs(&report.logs);

    match report.status {
        SyncStatus::Completed => println!(
            "{} {} pulled, {} pushed",
            style("✓").green(),
            report.pulled,
            report.pushed
        ),
        SyncStatus::NotConfigured => {
            println!("{}", style("Sync skipped: not configured.").yellow());
        }
    }

    Ok(())
}
