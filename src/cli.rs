//! `scrape` and `serve` commands

use crate::api::{self, ScrapeResponse, INVALID_SCHEME};
use crate::config::{PipelineArgs, ScrapeConfig};
use crate::extract::is_http_url;
use crate::orchestrator::{Outcome, Scraper};
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Exit status when the scrape deadline expires
pub const TIMEOUT_EXIT_CODE: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Args)]
pub struct ScrapeArgs {
    /// Page to scrape (http:// or https://)
    pub url: String,

    /// Output format
    #[arg(long, short, value_enum, default_value = "json")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, short, env = "PORT", default_value = "8000")]
    pub port: u16,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Initialise the global subscriber; logs go to stderr
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("pagelens=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

pub async fn run_scrape(args: ScrapeArgs) -> Result<()> {
    if !is_http_url(&args.url) {
        bail!("{}: {}", INVALID_SCHEME, args.url);
    }

    let scraper = Scraper::with_chromium(ScrapeConfig::from(args.pipeline));
    let outcome = scraper.scrape_with_deadline(&args.url).await;
    let timed_out = matches!(outcome, Outcome::TimedOut(_));
    let result = outcome.into_result();

    eprintln!(
        "Done: {} section{}, {} error{}",
        result.sections.len(),
        if result.sections.len() == 1 { "" } else { "s" },
        result.errors.len(),
        if result.errors.len() == 1 { "" } else { "s" },
    );

    let document = ScrapeResponse { result };
    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&document)?,
        OutputFormat::Yaml => serde_yaml::to_string(&document)?,
    };
    println!("{}", rendered);

    if timed_out {
        std::process::exit(TIMEOUT_EXIT_CODE);
    }
    Ok(())
}

pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ScrapeConfig::from(args.pipeline);
    tracing::info!(
        scrape_timeout_secs = config.scrape_timeout.as_secs(),
        browsers = config.browser_concurrency,
        "starting server"
    );
    let scraper = Arc::new(Scraper::with_chromium(config));
    let addr = SocketAddr::new(args.host, args.port);
    api::serve(addr, scraper)
        .await
        .with_context(|| format!("Server failed on {}", addr))
}
