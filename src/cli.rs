use clap::{Parser, Subcommand};

/// Terminal client for a music-streaming service.
#[derive(Debug, Parser)]
#[command(name = "fermata", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Open a playlist by id.
    Playlist { id: String },
    /// Open an artist's popular tracks by id.
    Artist { id: String },
    /// Search tracks.
    Search {
        /// Words to search for.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Print the effective configuration as TOML and exit.
    Config,
}
