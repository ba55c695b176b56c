//! StudioSync CLI - command-line interface for the portal sync engine.

mod commands;
mod config;
mod shutdown;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "studiosync")]
#[command(version)]
#[command(about = "Studio project portal sync engine")]
#[command(
    long_about = "StudioSync mirrors a freelance studio's projects between a local \
database, an external record store collection, and an asset-review service. It \
imports remote records, pushes local edits back, provisions review projects, and \
relays review comments into the record's comment thread."
)]
#[command(after_long_help = r#"EXAMPLES
    Apply database migrations:
        $ studiosync migrate up

    Configure the record store integration:
        $ studiosync settings set --collection-id d41f... --track "Project:title" --track "Status:status"

    Run one full sync pass:
        $ studiosync sync

    Provision both external services for a project:
        $ studiosync provision PRJ-482913

    Poll in the background until Ctrl+C:
        $ studiosync watch

    Ingest a webhook payload captured from the asset service:
        $ studiosync webhook event.json --secret hook-secret

CONFIGURATION
    StudioSync reads configuration from:
      1. ~/.config/studiosync/config.toml (or $XDG_CONFIG_HOME/studiosync/config.toml)
      2. ./studiosync.toml
      3. Environment variables (STUDIOSYNC_* prefix)

    Service tokens may live either in the settings table (via `settings set`)
    or in the config file / environment; config values override stored ones.

ENVIRONMENT VARIABLES
    STUDIOSYNC_DATABASE_URL     Database connection string (default: ~/.local/state/studiosync/studiosync.db)
    STUDIOSYNC_RECORD_TOKEN     Record store API token
    STUDIOSYNC_ASSET_TOKEN      Asset-review service API token
    STUDIOSYNC_WEBHOOK_SECRET   Shared secret for inbound webhook events
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Show or change the stored integration settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Run one full sync pass (pull then push) and print the log
    Sync,
    /// Create the record-store page and review project for one project
    Provision {
        /// Local project id (PRJ-...)
        project_id: String,
    },
    /// Poll the record store on the configured interval until Ctrl+C
    Watch,
    /// Ingest one asset-service webhook event from a JSON file (or - for stdin)
    Webhook {
        /// Path to the event payload, or - to read stdin
        payload: String,

        /// Shared secret presented by the sender
        #[arg(short, long)]
        secret: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for non-TTY mode (structured logging)
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("studiosync=info,studiosync_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    // Completions need no database
    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    let database_url = config
        .database_url()
        .ok_or("could not determine a database URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Settings { action } => {
            commands::settings::handle_settings(action, &database_url).await?;
        }
        Commands::Sync => {
            commands::sync::handle_sync(&config, &database_url).await?;
        }
        Commands::Provision { project_id } => {
            commands::provision::handle_provision(&config, &database_url, &project_id).await?;
        }
        Commands::Watch => {
            commands::watch::handle_watch(&config, &database_url).await?;
        }
        Commands::Webhook { payload, secret } => {
            commands::webhook::handle_webhook(&config, &database_url, &payload, secret.as_deref())
                .await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
