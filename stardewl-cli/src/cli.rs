//! Argument parsing for the `stardewl` command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stardewl")]
#[command(author, version, about = "Brokered P2P mod comparison for Stardew Valley", long_about = None)]
pub struct Cli {
    /// Print debug-level logs instead of the default info level.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Seconds to wait for the handshake and mod comparison before giving up.
    /// 0 waits indefinitely.
    #[arg(long, default_value_t = 60, global = true)]
    pub timeout: u64,

    /// WebSocket URL of the signaling service.
    #[arg(long, default_value = "ws://localhost:8080", global = true)]
    pub signaling: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a room and wait for a joiner to connect.
    Host {
        /// Path to the local Mods folder. Auto-detected if omitted.
        #[arg(long)]
        mods_path: Option<PathBuf>,
    },
    /// Join an existing room by its 6-digit code.
    Join {
        /// The 6-digit code printed by the host.
        code: String,

        /// Path to the local Mods folder. Auto-detected if omitted.
        #[arg(long)]
        mods_path: Option<PathBuf>,
    },
    /// Run the signaling service in the foreground.
    Signaling,
    /// Inspect the local mod set.
    Mods {
        #[command(subcommand)]
        command: ModsCommands,
    },
    /// Print version information.
    Version,
}

#[derive(Subcommand)]
pub enum ModsCommands {
    /// List every mod discovered in the local Mods folder.
    List {
        /// Path to scan. Auto-detected if omitted.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}
