//! modkit CLI
//!
//! Installs, activates, deactivates and removes host modules.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.config, cmd),
        None => {
            println!("{} module manager", "modkit".green().bold());
            println!();
            println!("Run {} for available commands.", "modkit --help".cyan());
            Ok(())
        }
    }
}

/// Debug output on stderr with `-v`, otherwise whatever `MODKIT_LOG` asks for.
fn init_logging(verbose: bool) {
    let installed = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).is_ok()
    } else {
        let filter = EnvFilter::try_from_env("MODKIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    };
    if installed && verbose {
        tracing::debug!("Verbose mode enabled");
    }
}

fn execute_command(config: &std::path::Path, cmd: Commands) -> Result<()> {
    let orchestrator = commands::open(config)?;
    match cmd {
        Commands::Install { archive } => commands::run_install(&orchestrator, &archive),
        Commands::Activate {
            module,
            resolutions,
        } => commands::run_activate(&orchestrator, &module, &resolutions),
        Commands::Deactivate {
            module,
            resolutions,
        } => commands::run_deactivate(&orchestrator, &module, &resolutions),
        Commands::Remove { module } => commands::run_remove(&orchestrator, &module),
        Commands::List { active, json } => commands::run_list(&orchestrator, active, json),
        Commands::Plan {
            module,
            deactivate,
            json,
        } => commands::run_plan(&orchestrator, &module, deactivate, json),
        Commands::SyncTheme { theme } => commands::run_sync_theme(&orchestrator, theme.as_deref()),
        Commands::Config { module, set } => {
            commands::run_config(&orchestrator, &module, set.as_deref())
        }
        Commands::Bundles { json } => commands::run_bundles(&orchestrator, json),
        Commands::Readme { module } => commands::run_readme(&orchestrator, &module),
    }
}
