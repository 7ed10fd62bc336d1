//! Receetly CLI - database management, agent upload and terminal waiting room.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! receetly migrate
//!
//! # Create a demo merchant, shop and terminal
//! receetly seed --public-id JOE-CBD-1
//!
//! # Upload a receipt as the point-of-sale agent
//! receetly upload --terminal JOE-CBD-1 ./sale-17.pdf
//!
//! # Wait for the next receipt of a terminal, like the customer page does
//! receetly wait --terminal JOE-CBD-1
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with a demo terminal
//! - `upload` - Send a receipt PDF to the agent upload API
//! - `wait` - Poll for a terminal's receipt until it is ready

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod waiting_room;

/// Default server when neither `--server` nor `RECEETLY_BASE_URL` is given.
const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "receetly")]
#[command(author, version, about = "Receetly CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with a demo merchant, shop and terminal
    Seed {
        /// Public id of the demo terminal
        #[arg(long, default_value = "JOE-CBD-1")]
        public_id: String,
    },
    /// Upload a receipt PDF as the point-of-sale agent
    Upload {
        /// Server base URL
        #[arg(long, env = "RECEETLY_BASE_URL", default_value = DEFAULT_SERVER)]
        server: String,

        /// Terminal public id the receipt belongs to
        #[arg(short, long)]
        terminal: String,

        /// Agent shared secret
        #[arg(long, env = "AGENT_SECRET", hide_env_values = true)]
        secret: String,

        /// File name to report; defaults to the file's own name
        #[arg(long)]
        filename: Option<String>,

        /// PDF to upload
        file: PathBuf,
    },
    /// Wait for a terminal's next receipt and print its URL
    Wait {
        /// Server base URL
        #[arg(long, env = "RECEETLY_BASE_URL", default_value = DEFAULT_SERVER)]
        server: String,

        /// Terminal public id to wait on
        #[arg(short, long)]
        terminal: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "receetly_cli=info,receetly_server=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { public_id } => commands::seed::demo(&public_id).await?,
        Commands::Upload {
            server,
            terminal,
            secret,
            filename,
            file,
        } => {
            commands::upload::send(&server, &terminal, secret.into(), filename, &file).await?;
        }
        Commands::Wait { server, terminal } => {
            commands::wait::run(&server, terminal).await?;
        }
    }
    Ok(())
}
