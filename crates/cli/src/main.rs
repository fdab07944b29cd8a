// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ttyd-mux CLI
//!
//! Thin veneer over the daemon: session commands go through the control
//! HTTP API, daemon management through the control socket. Server errors
//! are printed verbatim and exit non-zero.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod daemon_process;
mod output;
mod socket;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ttyd-mux", version, about = "Multiplex web-terminal sessions behind one HTTP endpoint")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a session for a directory (spawns the daemon if needed)
    Start {
        /// Directory to open the terminal in
        #[arg(default_value = ".")]
        dir: String,

        /// Session name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,

        /// URL sub-path (defaults to /<name>)
        #[arg(long)]
        path: Option<String>,
    },

    /// Stop a session
    Stop {
        /// Session name
        name: String,

        /// Also tear down the tmux session behind it
        #[arg(long)]
        kill_tmux: bool,
    },

    /// List running sessions
    #[command(alias = "list")]
    Ls,

    /// Show daemon and session status
    Status,

    /// Create a read-only share link for a session
    Share {
        /// Session name
        name: String,

        /// Lifetime such as 30m, 2h, or 1d (default 1h)
        #[arg(long)]
        expires: Option<String>,
    },

    /// List active share links
    Shares,

    /// Revoke a share link
    Unshare {
        /// Share token
        token: String,
    },

    /// Manage the daemon process
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Start { dir, name, path } => commands::start::run(dir, name, path).await,
        Commands::Stop { name, kill_tmux } => commands::stop::run(name, kill_tmux).await,
        Commands::Ls => commands::list::run().await,
        Commands::Status => commands::status::run().await,
        Commands::Share { name, expires } => commands::share::create(name, expires).await,
        Commands::Shares => commands::share::list().await,
        Commands::Unshare { token } => commands::share::revoke(token).await,
        Commands::Daemon { command } => commands::daemon::run(command).await,
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
