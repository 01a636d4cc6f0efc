//! Ponder CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive conversation or single-message mode
//! - `whois`    — Look a user up in the profile store
//! - `remember` — Write a user profile

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod console;

#[derive(Parser)]
#[command(
    name = "ponder",
    about = "Ponder — a recursive think-act agent with durable memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.ponder/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Look a user up in the profile store
    Whois {
        /// User id or (partial) display name
        query: String,

        /// Which protocol's profiles to search
        #[arg(short, long, default_value = "console")]
        protocol: String,
    },

    /// Save a one-line description of a user
    Remember {
        /// User id
        uid: String,

        /// The description to store
        description: String,

        /// Display name for approximate lookup
        #[arg(short, long)]
        name: Option<String>,

        /// Which protocol the profile belongs to
        #[arg(short, long, default_value = "console")]
        protocol: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Chat { message } => commands::chat::run(cli.config, message).await?,
        Commands::Whois { query, protocol } => {
            commands::profile::whois(cli.config, &protocol, &query).await?
        }
        Commands::Remember {
            uid,
            description,
            name,
            protocol,
        } => commands::profile::remember(cli.config, &protocol, &uid, &description, name).await?,
    }

    Ok(())
}
