//! Show and update the stored integration settings.

use clap::Subcommand;
use console::style;
use studiosync::store::{self, PropertyMapping};

use crate::commands::shared;

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Print the stored settings (tokens redacted)
    Show,
    /// Update stored settings; only the provided fields change
    Set {
        /// Record store API token
        #[arg(long)]
        record_token: Option<String>,

        /// Record store collection id to sync against
        #[arg(long)]
        collection_id: Option<String>,

        /// Asset-review service API token
        #[arg(long)]
        asset_token: Option<String>,

        /// Shared secret expected from webhook senders
        #[arg(long)]
        webhook_secret: Option<String>,

        /// Background poll interval in seconds
        #[arg(long)]
        interval: Option<i64>,

        /// Tracked property, "Name:kind" or "Name:kind:alias"
        /// (e.g. "Project:title", "Budget:number:budget").
        /// Repeatable; when given, replaces the stored set.
        #[arg(long = "track")]
        tracked: Vec<String>,

        /// Clear the tracked property set
        #[arg(long, conflicts_with = "tracked")]
        clear_tracked: bool,
    },
}

pub(crate) async fn handle_settings(
    action: SettingsAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = shared::open_db(database_url).await?;

    match action {
        SettingsAction::Show => {
            let settings = store::settings::load(&db).await?;
            println!("Record store token:  {}", presence(&settings.record_store_token));
            println!(
                "Collection id:       {}",
                settings.collection_id.as_deref().unwrap_or("(not set)")
            );
            println!("Asset service token: {}", presence(&settings.asset_service_token));
            println!("Webhook secret:      {}", presence(&settings.webhook_secret));
            println!("Sync interval:       {}s", settings.interval().as_secs());
            if settings.mappings.is_empty() {
                println!("Tracked properties:  (none)");
            } else {
                println!("Tracked properties:");
                for mapping in &settings.mappings {
                    let supported = if mapping.kind().is_some() {
                        String::new()
                    } else {
                        format!("  {}", style("(unsupported kind, ignored)").yellow())
                    };
                    println!("  {} [{}]{supported}", mapping.name, mapping.kind);
                }
            }
        }
        SettingsAction::Set {
            record_token,
            collection_id,
            asset_token,
            webhook_secret,
            interval,
            tracked,
            clear_tracked,
        } => {
            let mut settings = store::settings::load(&db).await?;

            if let Some(token) = record_token {
                settings.record_store_token = Some(token);
            }
            if let Some(id) = collection_id {
                settings.collection_id = Some(id);
            }
            if let Some(token) = asset_token {
                settings.asset_service_token = Some(token);
            }
            if let Some(secret) = webhook_secret {
                settings.webhook_secret = Some(secret);
            }
            if let Some(secs) = interval {
                settings.sync_interval_secs = secs;
            }
            if clear_tracked {
                settings.mappings.clear();
            } else if !tracked.is_empty() {
                settings.mappings = tracked
                    .iter()
                    .map(|spec| parse_mapping(spec))
                    .collect::<Result<Vec<_>, _>>()?;
            }

            for mapping in &settings.mappings {
                if mapping.kind().is_none() {
                    println!(
                        "{}",
                        style(format!(
                            "warning: kind \"{}\" for \"{}\" is not syncable and will be ignored",
                            mapping.kind, mapping.name
                        ))
                        .yellow()
                    );
                }
            }

            store::settings::save(&db, &settings).await?;
            println!("{} settings saved", style("✓").green());
        }
    }

    Ok(())
}

fn presence(value: &Option<String>) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => style("set").green().to_string(),
        _ => style("not set").yellow().to_string(),
    }
}

/// Parse a `Name:kind[:alias]` tracked-property spec.
fn parse_mapping(spec: &str) -> Result<PropertyMapping, String> {
    let mut parts = spec.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    let kind = parts.next().map(str::trim);
    let alias = parts.next().map(str::trim);

    let Some(kind) = kind else {
        return Err(format!(
            "invalid tracked property \"{spec}\": expected \"Name:kind\" or \"Name:kind:alias\""
        ));
    };
    if name.is_empty() || kind.is_empty() {
        return Err(format!(
            "invalid tracked property \"{spec}\": name and kind must be non-empty"
        ));
    }

    Ok(PropertyMapping {
        name: name.to_string(),
        kind: kind.to_string(),
        local_alias: alias.unwrap_or_default().to_string(),
    })
}
