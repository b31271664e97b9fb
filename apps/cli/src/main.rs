use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use client_core::{
    config::{self, ClientSettings},
    EventdeskClient, MemoryStateStore, StateStore,
};
use shared::domain::UserRole;
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "eventdesk", about = "Command line client for the events API")]
struct Cli {
    /// Overrides `api_base_url` from client.toml and the environment.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Settings file to read instead of ./client.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Keep the session in memory only; nothing is written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Shows the user behind the stored session.
    Me,
    #[command(subcommand)]
    Events(EventsCommand),
    #[command(subcommand)]
    Validate(ValidateCommand),
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        sort: Option<String>,
    },
    Create(EventForm),
    Update {
        id: String,
        #[command(flatten)]
        form: EventForm,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ValidateCommand {
    /// Checks an event form without sending it.
    Event(EventForm),
}

#[derive(Args, Debug, Clone)]
struct EventForm {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    /// YYYY-MM-DD, YYYY-MM-DDTHH:MM or an RFC 3339 timestamp.
    #[arg(long)]
    date: String,
    #[arg(long)]
    location: String,
}

fn resolve_settings(cli: &Cli) -> ClientSettings {
    let mut settings = match &cli.config {
        Some(path) => config::load_settings_from(path),
        None => config::load_settings(),
    };
    if let Some(url) = &cli.api_base_url {
        settings.api_base_url = url.clone();
    }
    if let Some(url) = &cli.database_url {
        settings.database_url = url.clone();
    }
    settings
}

async fn open_persistence(
    settings: &ClientSettings,
    ephemeral: bool,
) -> Result<Arc<dyn StateStore>> {
    if ephemeral {
        info!("cli: ephemeral session, nothing will be persisted");
        return Ok(Arc::new(MemoryStateStore::new()));
    }
    let database_url = config::prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await?;
    Ok(Arc::new(storage))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    if let Command::Validate(ValidateCommand::Event(form)) = &cli.command {
        return commands::validate_event(form);
    }

    let settings = resolve_settings(&cli);
    let persistence = open_persistence(&settings, cli.ephemeral).await?;
    let client = EventdeskClient::connect(&settings, persistence).await?;

    commands::run(&client, cli.command).await
}
