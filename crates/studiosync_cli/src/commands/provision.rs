//! Provision the external counterparts for one project.

use console::style;
use studiosync::asset::AssetService;
use studiosync::remote::RecordStore;
use studiosync::sync;

use crate::commands::shared;
use crate::config::Config;

pub(crate) async fn handle_provision(
    config: &Config,
    database_url: &str,
    project_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = shared::open_db(database_url).await?;
    let settings = shared::load_settings(&db, config).await?;

    let record = shared::record_client(&settings);
    let assets = shared::asset_client(&settings);

    println!("Provisioning {project_id}...");
    let report = sync::provision_project(
        &db,
        record.as_ref().map(|c| c as &dyn RecordStore),
        assets.as_ref().map(|c| c as &dyn AssetService),
        &settings,
        project_id,
    )
    .await?;
    shared::print_logs(&report.logs);

    let project = report.project;
    let mark = |done: bool| {
        if done {
            style("linked").green()
        } else {
            style("not linked").yellow()
        }
    };
    println!(
        "{} record store: {}, asset service: {}",
        style("✓").green(),
        mark(project.external_synced),
        mark(project.asset_synced)
    );

    Ok(())
}
