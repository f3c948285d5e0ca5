use clap::{Args, Parser, Subcommand};

use crate::app::catalog::{DEFAULT_ANIME_ID, DEFAULT_CATALOG_URL};

#[derive(Debug, Parser)]
#[command(
    name = "arctrack",
    version,
    about = "Track watched One Piece episodes by saga and arc"
)]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
pub struct Options {
    /// Skip the remote catalog and use the built-in fallback episodes.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Base URL of the Jikan v4 API.
    #[arg(long, global = true, default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Catalog id of the series.
    #[arg(long, global = true, default_value_t = DEFAULT_ANIME_ID)]
    pub anime_id: u32,

    /// Keep watch state in memory only for this run.
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive saga/arc checklist (default).
    Tui,
    /// Print saga and arc progress.
    Summary,
    /// Mark episodes as watched.
    Mark {
        #[arg(required = true)]
        ids: Vec<u32>,
    },
    /// Mark episodes as unwatched.
    Unmark {
        #[arg(required = true)]
        ids: Vec<u32>,
    },
    /// Print the saga/arc classification table.
    Arcs,
    /// Forget every stored watch state.
    Reset,
}
