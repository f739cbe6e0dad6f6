use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod exit_codes;
mod mods_path;
mod room_client;
mod signaling_url;

use cli::{Cli, Commands, ModsCommands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let result = match cli.command {
        Some(Commands::Host { mods_path }) => {
            commands::host::run(&cli.signaling, mods_path, cli.timeout).await
        }
        Some(Commands::Join { code, mods_path }) => {
            commands::join::run(&cli.signaling, code, mods_path, cli.timeout).await
        }
        Some(Commands::Signaling) => commands::signaling::run().await,
        Some(Commands::Mods { command: ModsCommands::List { path } }) => commands::mods::list(path),
        Some(Commands::Version) => commands::version::run(),
        None => {
            eprintln!("no command given, try `stardewl --help`");
            std::process::exit(exit_codes::ERROR);
        }
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "error:".red());
        std::process::exit(exit_codes::ERROR);
    }
}
