use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal client for the company task board.
/// Talks to the backend API configured via --api-url or PMB_API_URL.
#[derive(Parser)]
#[command(name = "pmb", version, about = "Task board client CLI")]
pub struct Cli {
    /// Backend base URL. Falls back to $PMB_API_URL, then localhost.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Path to the session file (default: ~/.pmb/session.json).
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
