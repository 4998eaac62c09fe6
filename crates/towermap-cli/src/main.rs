use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use towermap_store::Store;
use towermap_types::Boundaries;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod format;

use cli::{Cli, Commands, ConfigAction};
use config::{Config, default_config_path};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON and CSV output stays clean.
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);

    if let Commands::Config {
        action: action @ ConfigAction::Init { .. },
    } = cli.command
    {
        return commands::cmd_config(action, &config_path, &Config::default());
    }

    let config = if cli.config.is_some() {
        Config::load_validated(&config_path)?
    } else {
        let config = Config::load_default()?;
        config.validate()?;
        config
    };

    if let Commands::Config { action } = cli.command {
        return commands::cmd_config(action, &config_path, &config);
    }

    let db_path = cli
        .database
        .clone()
        .unwrap_or_else(|| config.storage.path.clone());
    let store = Arc::new(
        Store::open_with(&db_path, config.storage.store_options())
            .with_context(|| format!("Failed to open database {}", db_path.display()))?,
    );

    match cli.command {
        Commands::Import { input } => commands::cmd_import(&store, &input),
        Commands::Stage { input } => commands::cmd_stage(&store, &input),
        Commands::Finalize { row_id, cells } => commands::cmd_finalize(&store, row_id, &cells),
        Commands::Staged { format } => commands::cmd_staged(&store, format),
        Commands::Show { id, format } => commands::cmd_show(&store, id, format),
        Commands::Last { format } => commands::cmd_last(&store, format),
        Commands::Count => commands::cmd_count(&store),
        Commands::Area {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
            format,
            limit,
        } => {
            let boundaries = Boundaries::new(min_lat, min_lon, max_lat, max_lon)?;
            commands::cmd_area(&store, boundaries, limit, format)
        }
        Commands::Export { output } => commands::cmd_export(&store, output.as_deref()),
        Commands::Browse {
            south,
            west,
            north,
            east,
            format,
        } => {
            commands::cmd_browse(
                Arc::clone(&store),
                &config.loader,
                (south, west, north, east),
                format,
            )
            .await
        }
        Commands::Expire { older_than_secs } => commands::cmd_expire(&store, older_than_secs),
        Commands::Config { .. } => unreachable!("handled before the store is opened"),
    }
}
