mod cli;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use metamem::config::MetamemConfig;
use metamem::memory::types::Role;

#[derive(Parser)]
#[command(name = "metamem", version, about = "Session-scoped conversational memory for orchestration runs")]
struct Cli {
    /// Config file (defaults to ~/.metamem/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport unless configured otherwise)
    Serve {
        /// Serve over Streamable HTTP instead of stdio
        #[arg(long)]
        http: bool,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Store one utterance
    Remember {
        session: String,
        text: String,
        #[arg(long, default_value = "user")]
        role: Role,
    },
    /// Recall memories of a session relevant to a query
    Recall {
        session: String,
        query: String,
        /// Maximum number of results (defaults to recall.default_k)
        #[arg(short, long)]
        k: Option<usize>,
        /// Exclude memories containing this term (repeatable)
        #[arg(long = "block")]
        block: Vec<String>,
        /// Also block topics the query asks to avoid
        #[arg(long)]
        derive_block: bool,
        /// Print the formatted prompt context
        #[arg(long)]
        context: bool,
    },
    /// Ingest .txt run logs from files or directories
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Store everything under this session instead of the parent directory name
        #[arg(long)]
        session: Option<String>,
    },
    /// Show memory statistics
    Stats {
        #[arg(long)]
        session: Option<String>,
    },
    /// Check database health and configuration consistency
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.metamem/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = match &cli.config {
        Some(path) => MetamemConfig::load_from(path)?,
        None => MetamemConfig::load()?,
    };

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { http } => {
            if http || config.server.transport == "http" {
                server::serve_http(config).await?;
            } else {
                server::serve_stdio(config).await?;
            }
        }
        Command::Model { action } => match action {
            ModelAction::Download => {
                cli::model_download(&config.embedding).await?;
            }
        },
        Command::Remember {
            session,
            text,
            role,
        } => {
            cli::remember::remember(&config, &session, role, &text)?;
        }
        Command::Recall {
            session,
            query,
            k,
            block,
            derive_block,
            context,
        } => {
            cli::recall::recall(
                &config,
                &cli::recall::RecallArgs {
                    session_id: &session,
                    query: &query,
                    k,
                    block_terms: &block,
                    derive_block_terms: derive_block,
                    context,
                },
            )?;
        }
        Command::Ingest { paths, session } => {
            cli::ingest::ingest(&config, &paths, session)?;
        }
        Command::Stats { session } => {
            cli::stats::stats(&config, session.as_deref())?;
        }
        Command::Doctor => {
            cli::doctor::doctor(&config)?;
        }
    }

    Ok(())
}
