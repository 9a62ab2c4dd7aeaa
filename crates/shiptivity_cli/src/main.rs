//! Command-line driver for the client board.
//!
//! # Responsibility
//! - Parse board commands and hand typed input to core services.
//! - Own the database connection for the process lifetime.
//! - Render results as JSON using the board's external field names.

use clap::{Args, Parser, Subcommand};
use log::info;
use serde::Serialize;
use shiptivity_core::db::open_db;
use shiptivity_core::{
    core_version, default_log_level, init_logging, ClientId, ClientService, NewClient,
    RankManager, ReassignRequest, SqliteClientRepository,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "shiptivity", version = core_version())]
#[command(about = "Manage client swimlanes and their priorities", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    #[arg(long, global = true, default_value = "clients.db", help = "SQLite database file")]
    db: PathBuf,
    #[arg(long, global = true, help = "Log level: trace|debug|info|warn|error")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Directory for rolling log files (logging is off when omitted)")]
    log_dir: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "List all clients, or one lane ordered by priority")]
    List {
        #[arg(long, help = "Lane: backlog|in-progress|complete")]
        status: Option<String>,
    },
    #[command(about = "Show one client")]
    Get { id: ClientId },
    #[command(about = "Create a client at the bottom of a lane")]
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value = "backlog", help = "Lane: backlog|in-progress|complete")]
        status: String,
    },
    #[command(about = "Move a client to another lane and/or priority")]
    Update {
        id: ClientId,
        #[arg(long, help = "New lane: backlog|in-progress|complete")]
        status: Option<String>,
        #[arg(long, help = "New priority, 1 is the top of the lane")]
        priority: Option<i64>,
    },
    #[command(about = "Re-rank a lane to 1..N, repairing duplicate or sparse priorities")]
    Compact {
        #[arg(help = "Lane: backlog|in-progress|complete")]
        status: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = setup_logging(&cli.global) {
        eprintln!("error: {err}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(global: &GlobalArgs) -> Result<(), Box<dyn Error>> {
    let Some(log_dir) = global.log_dir.as_deref() else {
        return Ok(());
    };
    let level = global.log_level.as_deref().unwrap_or(default_log_level());
    let log_dir = std::path::absolute(log_dir)?;
    init_logging(level, &log_dir.to_string_lossy())?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&cli.global.db)?;
    info!(
        "event=cli_command module=cli status=start db={}",
        display_db(&cli.global.db)
    );

    let clients = ClientService::new(SqliteClientRepository::try_new(&conn)?);
    let ranks = RankManager::new(SqliteClientRepository::try_new(&conn)?);

    match cli.command {
        Commands::List { status } => match status {
            Some(status) => print_json(&clients.list_clients_by_status(&status)?),
            None => print_json(&clients.list_clients(None)?),
        },
        Commands::Get { id } => print_json(&clients.get_client(id)?),
        Commands::Add {
            name,
            description,
            status,
        } => {
            let mut new_client = NewClient::new(name, status.parse()?);
            if let Some(description) = description {
                new_client = new_client.with_description(description);
            }
            print_json(&clients.create_client(&new_client)?)
        }
        Commands::Update {
            id,
            status,
            priority,
        } => {
            let request = ReassignRequest::parse(id, status.as_deref(), priority)?;
            print_json(&ranks.reassign(&request)?)
        }
        Commands::Compact { status } => print_json(&ranks.compact_lane(status.parse()?)?),
    }
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn display_db(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}
