// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! mnemo - a conversational memory engine for dated log entries.
//!
//! Binary entry point: loads configuration, initializes tracing, and
//! dispatches to the subcommands in [`commands`].

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// mnemo - chat with a recency-aware memory of your dated log entries.
#[derive(Parser, Debug)]
#[command(name = "mnemo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one message to the assistant and print the response.
    Chat {
        /// The message to send.
        message: String,
        /// Stream the response chunk by chunk instead of waiting.
        #[arg(long)]
        stream: bool,
    },
    /// Store a new log entry for a date (YYYY-MM-DD).
    Add {
        /// Entry date, e.g. 2026-08-08.
        date: String,
        /// Entry text.
        text: String,
        /// Also ask the model for a summary and importance score.
        #[arg(long)]
        analyze: bool,
    },
    /// Search stored entries with recency-aware ranking.
    Search {
        /// Natural-language query.
        query: String,
        /// Number of results.
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// List stored entries, newest first.
    List {
        /// Maximum entries to show.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Generate and save an insight report over recent entries.
    Insights,
    /// Check backend health (Ollama, embedding model).
    Doctor,
    /// Delete every stored entry.
    Clear {
        /// Required confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration errors are fatal at startup.
    let config = match mnemo_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mnemo: configuration error: {e}");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Chat { message, stream } => commands::chat(&config, &message, stream).await,
        Commands::Add {
            date,
            text,
            analyze,
        } => commands::add(&config, &date, &text, analyze).await,
        Commands::Search { query, top_k } => commands::search(&config, &query, top_k).await,
        Commands::List { limit } => commands::list(&config, limit).await,
        Commands::Insights => commands::insights(&config).await,
        Commands::Doctor => commands::doctor(&config).await,
        Commands::Clear { yes } => commands::clear(&config, yes).await,
    };

    if let Err(e) = result {
        eprintln!("mnemo: {e}");
        std::process::exit(1);
    }
}
