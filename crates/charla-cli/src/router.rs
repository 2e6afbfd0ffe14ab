//! Command routing logic for CLI

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands;
use charla_core::{CharlaResult, Config};
use charla_session::LocalSessionStore;
use tracing::debug;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: Config) -> CharlaResult<()> {
    if let Commands::Config { action } = &cli.command {
        return route_config(&cli, action.clone()).await;
    }

    let store = open_store(&cli, &config)?;
    debug!("Using chat store at {}", store.base_path().display());

    match cli.command {
        Commands::List { limit } => commands::session::list(&store, limit).await,
        Commands::Show { name } => commands::session::show(&store, &name).await,
        Commands::Delete { name, force } => {
            commands::session::delete(&store, &name, force).await
        }
        Commands::Rename { from, to } => commands::session::rename(&store, &from, &to).await,
        Commands::Export { name, output } => {
            commands::session::export(&store, &name, output.as_deref()).await
        }
        Commands::Import { file, name } => {
            commands::session::import(&store, &file, name.as_deref()).await
        }
        Commands::Name { file } => commands::session::suggest_name(&store, &file).await,
        Commands::Ingest { file } => commands::ingest::run(&config, &file, cli.verbose).await,
        Commands::Models => {
            commands::models::list(&config);
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

async fn route_config(cli: &Cli, action: ConfigAction) -> CharlaResult<()> {
    match action {
        ConfigAction::Show => {
            commands::config::show(&cli.config_file, cli.chats_dir.as_deref()).await
        }
        ConfigAction::Init { force } => commands::config::init(&cli.config_file, force).await,
    }
}

fn open_store(cli: &Cli, config: &Config) -> CharlaResult<LocalSessionStore> {
    match &cli.chats_dir {
        Some(dir) => Ok(LocalSessionStore::with_path(dir.clone())),
        None => config.open_store(),
    }
}
