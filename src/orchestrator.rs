//! Fetch strategy and result assembly
//!
//! Static fetch first; a headless render only when the static markup scores
//! too low or never arrived. Every stage failure becomes a [`ScraperError`]
//! on the result instead of aborting the scrape.

use crate::browser::{BrowserLauncher, ChromiumLauncher};
use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::fetch::StaticFetcher;
use crate::interact::InteractionEngine;
use crate::metadata;
use crate::model::{timestamp, Phase, ScraperError, ScraperResult, Section};
use crate::quality;
use crate::render::HeadlessRenderer;
use crate::segment;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

pub const FALLBACK_NOTE: &str = "Static content insufficient, used JS rendering";

/// How a deadline-bounded scrape ended
#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(ScraperResult),
    /// Deadline hit; carries the synthesized timeout result
    TimedOut(ScraperResult),
}

impl Outcome {
    pub fn into_result(self) -> ScraperResult {
        match self {
            Outcome::Completed(result) | Outcome::TimedOut(result) => result,
        }
    }
}

pub struct Scraper {
    config: ScrapeConfig,
    fetcher: StaticFetcher,
    renderer: HeadlessRenderer,
    engine: InteractionEngine,
}

impl Scraper {
    pub fn new(config: ScrapeConfig, launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self {
            fetcher: StaticFetcher::new(&config),
            renderer: HeadlessRenderer::new(Arc::clone(&launcher), config.render_timeout),
            engine: InteractionEngine::new(launcher, config.interaction_timeout),
            config,
        }
    }

    /// Scraper backed by local Chrome/Chromium sessions
    pub fn with_chromium(config: ScrapeConfig) -> Self {
        let launcher = Arc::new(ChromiumLauncher::new(&config));
        Self::new(config, launcher)
    }

    /// Scrape `url`. Always returns a well-formed result; failures are listed
    /// in `errors`.
    pub async fn scrape(&self, url: &str) -> ScraperResult {
        let mut errors = Vec::new();
        let run = AssertUnwindSafe(self.run(url, &mut errors))
            .catch_unwind()
            .await;

        match run {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(url, %message, "scrape failed unexpectedly");
                let mut result =
                    ScraperResult::minimal(url, ScraperError::new(Phase::Unknown, message));
                errors.append(&mut result.errors);
                result.errors = errors;
                result
            }
        }
    }

    /// [`Scraper::scrape`] bounded by the overall scrape timeout
    pub async fn scrape_with_deadline(&self, url: &str) -> Outcome {
        let limit = self.config.scrape_timeout;
        match tokio::time::timeout(limit, self.scrape(url)).await {
            Ok(result) => Outcome::Completed(result),
            Err(_) => {
                tracing::warn!(url, timeout_secs = limit.as_secs(), "scrape deadline exceeded");
                Outcome::TimedOut(ScraperResult::minimal(
                    url,
                    ScraperError::new(
                        Phase::Timeout,
                        format!("Scraping timed out after {} seconds", limit.as_secs()),
                    ),
                ))
            }
        }
    }

    async fn run(&self, url: &str, errors: &mut Vec<ScraperError>) -> ScraperResult {
        tracing::info!(url, "scrape started");

        let html = self.acquire(url, errors).await;

        let mut sections = segment::segment(&html, url);
        if sections.is_empty() {
            sections.push(Section::placeholder(url));
        }
        tracing::info!(url, sections = sections.len(), "segmented page");

        let meta = metadata::extract(&html, url);

        let discovery = self.engine.discover(url).await;
        errors.extend(discovery.errors);

        ScraperResult {
            url: url.to_string(),
            scraped_at: timestamp(),
            meta,
            sections,
            interactions: discovery.interactions,
            errors: std::mem::take(errors),
        }
    }

    /// Working markup for `url`; empty when both fetch paths failed
    async fn acquire(&self, url: &str, errors: &mut Vec<ScraperError>) -> String {
        let static_html = match self.fetcher.fetch(url).await {
            Ok(html) => Some(html),
            Err(e) => {
                tracing::warn!(url, error = %e, "static fetch failed");
                errors.push(ScraperError::new(Phase::Fetch, fetch_message(&e)));
                None
            }
        };

        let Some(static_html) = static_html else {
            return match self.renderer.render(url).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    tracing::warn!(url, error = %e, "headless render failed");
                    errors.push(ScraperError::new(Phase::Render, render_message(&e)));
                    String::new()
                }
            };
        };

        let score = quality::score(&static_html, &self.config.quality);
        tracing::info!(url, score, "static content scored");
        if !quality::needs_render(score, &self.config.quality) {
            return static_html;
        }

        match self.renderer.render(url).await {
            Ok(rendered) if rendered.len() > static_html.len() => {
                tracing::info!(url, "using rendered markup");
                errors.push(ScraperError::new(Phase::Fallback, FALLBACK_NOTE));
                rendered
            }
            Ok(_) => {
                tracing::debug!(url, "rendered markup not longer than static, keeping static");
                static_html
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "headless render failed");
                errors.push(ScraperError::new(Phase::Render, render_message(&e)));
                static_html
            }
        }
    }
}

fn fetch_message(err: &ScrapeError) -> String {
    if err.is_timeout() {
        "Static fetch timed out".to_string()
    } else {
        format!("Static fetch failed: {}", err)
    }
}

fn render_message(err: &ScrapeError) -> String {
    if err.is_timeout() {
        "JS rendering timed out".to_string()
    } else {
        format!("JS rendering failed: {}", err)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure".to_string()
    }
}
