//! Roster CLI Entry Point
//!
//! Subcommands:
//! - `menu` - interactive menu (default when no subcommand is given)
//! - `mcp` - MCP tool server on stdio
//! - `init` - create the schema (and sample data) and report what happened
//! - `config show` / `config save` - inspect or persist resolved settings
//!
//! `init` and `config` print JSON envelopes to stdout. Logs go to stderr.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;

use roster::config::{self, ConfigLocation, Settings};
use roster::mcp::{self, ToolServer};
use roster::menu::Menu;
use roster::store::bootstrap;
use roster::{ErrorEnvelope, Metadata, SuccessEnvelope};

/// Roster - employee and department manager
#[derive(Parser)]
#[command(name = "roster")]
#[command(
    about = "Employee and department manager with an interactive menu and an MCP tool server"
)]
#[command(version)]
struct Cli {
    /// SQLite database file (overrides config files and ROSTER_DB)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu
    Menu,

    /// Start the MCP tool server on stdio
    Mcp {
        /// Let execute_sql run INSERT / UPDATE / DELETE / REPLACE
        #[arg(long)]
        allow_write: bool,
    },

    /// Create the database schema, seeding sample data into a new file
    Init {
        /// Do not insert sample departments and employees
        #[arg(long)]
        no_seed: bool,
    },

    /// Show or save configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the resolved settings
    Show,

    /// Write the resolved settings to a config file
    Save {
        /// Save to ~/.config/roster/config.json instead of .roster/config.json
        #[arg(long)]
        global: bool,
    },
}

#[derive(Serialize)]
struct InitReport {
    database: PathBuf,
    created: bool,
    seeded: bool,
}

#[derive(Serialize)]
struct SavedConfig {
    path: PathBuf,
    settings: Settings,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    roster::logging::init_tracing(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Menu);
    debug!(db = ?cli.db, "starting");

    match command {
        Commands::Menu => {
            let settings = config::resolve_settings(cli.db.as_deref())?;
            let gateway = settings.gateway();
            bootstrap::initialize(&gateway, settings.seed_sample_data)?;
            Menu::new(gateway).run()?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Mcp { allow_write } => {
            let settings = config::resolve_settings(cli.db.as_deref())?;
            let gateway = settings.gateway();
            bootstrap::initialize(&gateway, settings.seed_sample_data)?;

            let mut capabilities = settings.capabilities();
            capabilities.allow_write |= allow_write;
            mcp::serve(&ToolServer::new(gateway, capabilities))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { no_seed } => emit("init", || {
            let settings = config::resolve_settings(cli.db.as_deref())?;
            let gateway = settings.gateway();
            let report = bootstrap::initialize(&gateway, settings.seed_sample_data && !no_seed)?;
            Ok(InitReport {
                database: settings.database,
                created: report.created,
                seeded: report.seeded,
            })
        }),
        Commands::Config(ConfigCommand::Show) => {
            emit("config show", || config::resolve_settings(cli.db.as_deref()))
        }
        Commands::Config(ConfigCommand::Save { global }) => emit("config save", || {
            let settings = config::resolve_settings(cli.db.as_deref())?;
            let location = if global { ConfigLocation::Global } else { ConfigLocation::Local };
            let path = config::save_settings(&settings, location)?;
            Ok(SavedConfig { path, settings })
        }),
    }
}

/// Run `f` and print its outcome as a JSON envelope
fn emit<T: Serialize>(
    command: &str,
    f: impl FnOnce() -> roster::Result<T>,
) -> Result<ExitCode> {
    let started = Instant::now();
    let outcome: roster::Result<T> = f();
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(data) => {
            let envelope = SuccessEnvelope::new(command, data, Metadata::new(elapsed));
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let envelope = ErrorEnvelope::from_error(command, &err);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
