//! # docqa CLI
//!
//! ```bash
//! docqa --config ./config/docqa.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docqa chat <pdf>` | Index a PDF and chat about it in the terminal |
//! | `docqa ask <pdf> "<question>"` | Index a PDF and answer one question |
//! | `docqa serve chat` | Start the chat HTTP server |
//! | `docqa serve demo` | Start the long-running request demo service |
//!
//! Everything except `serve demo` needs `OPENAI_API_KEY` (environment or
//! `.env`); without it the command exits before doing any work.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use docqa::{chat, config, demo, logging, server};

/// docqa: ask questions about a PDF with retrieval-augmented generation.
#[derive(Parser)]
#[command(name = "docqa", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Missing file means defaults.
    #[arg(long, global = true, default_value = "./config/docqa.toml")]
    config: PathBuf,

    /// Debug-level logging (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a PDF and start an interactive question/answer loop.
    Chat {
        /// PDF file to load.
        pdf: PathBuf,

        /// Print the retrieved source chunks under each answer.
        #[arg(long)]
        show_sources: bool,
    },

    /// Index a PDF and answer a single question.
    Ask {
        /// PDF file to load.
        pdf: PathBuf,

        /// The question.
        question: String,

        /// Print the answer and sources as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Start an HTTP service.
    Serve {
        #[command(subcommand)]
        service: ServeService,
    },
}

#[derive(Subcommand)]
enum ServeService {
    /// Chat API over a single session (upload, ask, history, reset).
    Chat,
    /// Demo service with `/` and a 70 second `/long-process`.
    Demo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve {
            service: ServeService::Demo,
        } => {
            demo::run_demo(&cfg.demo).await?;
        }
        Commands::Serve {
            service: ServeService::Chat,
        } => {
            config::validate(&cfg)?;
            let key = config::api_key_from_env()?;
            server::run_server(&cfg, &key).await?;
        }
        Commands::Chat { pdf, show_sources } => {
            config::validate(&cfg)?;
            let key = config::api_key_from_env()?;
            chat::run_chat(&cfg, &key, &pdf, show_sources).await?;
        }
        Commands::Ask {
            pdf,
            question,
            json,
        } => {
            config::validate(&cfg)?;
            let key = config::api_key_from_env()?;
            chat::run_ask(&cfg, &key, &pdf, &question, json).await?;
        }
    }

    Ok(())
}
