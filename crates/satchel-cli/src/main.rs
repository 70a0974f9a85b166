//! Satchel CLI - the offline-capable command-line client
//!
//! Quick capture and retrieval against the local entry store, with
//! opportunistic sync to the backend when an API endpoint is configured.

mod cli;
mod commands;
mod error;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands, EntryTypeArg};
use crate::commands::common::{build_service, resolve_data_dir};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("satchel=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Completions { shell, output }) = &cli.command {
        return commands::completions::run_completions(*shell, output.as_deref());
    }

    let data_dir = resolve_data_dir(cli.data_dir.clone());
    let service = build_service(&data_dir, cli.offline)?;

    match cli.command {
        Some(Commands::Add {
            content,
            title,
            entry_type,
            date,
        }) => {
            commands::add::run_add(
                &service,
                &content,
                title.as_deref(),
                entry_type,
                date.as_deref(),
            )
            .await?;
        }
        Some(Commands::List {
            limit,
            entry_type,
            json,
        }) => {
            commands::list::run_list(&service, limit, entry_type, json).await?;
        }
        Some(Commands::Search { query, limit, json }) => {
            commands::search::run_search(&service, &query, limit, json).await?;
        }
        Some(Commands::Edit { id }) => commands::edit::run_edit(&service, &id).await?,
        Some(Commands::Delete { id }) => commands::delete::run_delete(&service, &id).await?,
        Some(Commands::Sync) => commands::sync::run_sync(&service).await?,
        Some(Commands::Status) => commands::status::run_status(&service),
        // Handled before the service is built.
        Some(Commands::Completions { .. }) => {}
        None => {
            // Quick capture mode: satchel "my thought"
            if cli.entry.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                commands::add::run_add(&service, &cli.entry, None, EntryTypeArg::Note, None)
                    .await?;
            }
        }
    }

    Ok(())
}
