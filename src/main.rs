//! # Paperchat CLI
//!
//! Entry point for the RAG chatbot backend. Configuration comes from
//! environment variables (a `.env` file is honored when present).
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `paperchat init` | Create the SQLite database and run schema migrations |
//! | `paperchat serve` | Start the HTTP API server |

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use paperchat::{config, db, migrate, server};

/// Paperchat — a personal RAG chatbot backend with PDF ingestion and
/// vector search.
#[derive(Parser)]
#[command(
    name = "paperchat",
    about = "Personal RAG chatbot backend: PDF ingestion, embeddings, vector search, chat history",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the chat-history database schema.
    ///
    /// Creates the SQLite database file and the `chat_history` and
    /// `sessions` tables. Idempotent; `serve` also runs migrations at
    /// startup, so this is mainly useful for provisioning.
    Init,

    /// Start the HTTP API server.
    ///
    /// Binds to `API_HOST:API_PORT`, connects the chat store, and resolves
    /// (creating if necessary) the Pinecone index before accepting requests.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::Config::from_env()?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
