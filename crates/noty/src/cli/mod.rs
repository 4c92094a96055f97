/// Clap argument definitions
mod args;

/// `config` command handlers
mod config;

/// `list`, `show`, `new`, `write`, `rm`, `mv`, `reload`
mod note;

/// Shared CLI utilities
mod util;

/// `watch` command
mod watch;

use clap::Parser;
use std::path::PathBuf;

use noty_core::NotyApp;
use noty_core::config::ConfigStore;
use noty_core::fs::RealFileSystem;

/// Type alias for the app as the CLI builds it.
pub type CliApp = NotyApp<RealFileSystem>;

use args::{Cli, Commands};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn config_path(cli_override: Option<PathBuf>) -> Option<PathBuf> {
    if cli_override.is_some() {
        return cli_override;
    }
    match ConfigStore::<RealFileSystem>::default_path() {
        Ok(path) => Some(path),
        Err(e) => {
            eprintln!("✗ {}", e);
            None
        }
    }
}

/// Main entry point for the CLI
pub fn run_cli() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(config_path) = config_path(cli.config) else {
        std::process::exit(1);
    };

    let mut app = match NotyApp::new(RealFileSystem, &config_path) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("✗ Could not load {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    let success = match cli.command {
        Commands::List { sort, filter, json } => {
            note::handle_list(&app, sort.map(Into::into), filter.as_deref(), json)
        }

        Commands::Show { note } => note::handle_show(&mut app, &note),

        Commands::New { name } => note::handle_new(&mut app, &name),

        Commands::Write { note, force } => note::handle_write(&mut app, &note, force),

        Commands::Rm { note } => note::handle_rm(&mut app, &note),

        Commands::Mv { note, new_name } => note::handle_mv(&mut app, &note, &new_name),

        Commands::Watch { note, interval } => watch::handle_watch(&mut app, &note, interval),

        Commands::Reload => note::handle_reload(&mut app),

        Commands::Config { command } => config::handle_config_command(&mut app, command),
    };

    if !success {
        std::process::exit(1);
    }
}
