//! pagelens CLI
//!
//! Structured section extraction from web pages.
//! Static fetch first, headless Chrome when the static markup is too thin.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pagelens::cli::{init_tracing, run_scrape, run_serve, LogFormat, ScrapeArgs, ServeArgs};

#[derive(Parser)]
#[command(name = "pagelens")]
#[command(author = "RoyalBit Inc.")]
#[command(version)]
#[command(about = "Structured section extraction from web pages")]
#[command(long_about = "Static fetch first, headless Chrome when the static markup is too thin.\n\nCommands:\n  scrape   Scrape one URL and print the result document\n  serve    Run the HTTP API (POST /scrape, GET /healthz)")]
struct Cli {
    /// Log output format (filter with RUST_LOG)
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape one URL and print {"result": ...}
    Scrape(ScrapeArgs),
    /// Serve the scrape API over HTTP
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Scrape(args) => run_scrape(args).await,
        Commands::Serve(args) => run_serve(args).await,
    }
}
