//! CLI definitions for chaant.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// chaant CLI.
#[derive(Parser)]
#[command(name = "chaant")]
#[command(about = "Browser-driven chess agent with collective move voting")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.chaant/config.toml)
    #[arg(short, long, global = true, env = "CHAANT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run Chrome without a window
    #[arg(long, global = true)]
    pub headless: bool,

    /// Refuse to start on configuration warnings
    #[arg(long, global = true, env = "CHAANT_STRICT_CONFIG")]
    pub strict_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the HTTP control plane (default)
    Serve {
        /// Server host
        #[arg(long)]
        host: Option<String>,

        /// Server port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Play interactively from the console
    Play,

    /// List the free computer opponents
    Bots {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}
