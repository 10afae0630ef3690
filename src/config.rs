//! Stage timeouts and scoring constants
//!
//! Every knob of the pipeline lives here with the production defaults. The
//! CLI maps its flags onto [`ScrapeConfig`]; library users build one directly.

use clap::Args;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Scoring weights for the static-vs-render decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityWeights {
    /// Bonus when a `main`/`article` landmark exists
    pub landmark_bonus: usize,
    /// Bonus when any `h1`-`h3` exists
    pub heading_bonus: usize,
    /// Scores below this trigger the headless render
    pub threshold: usize,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            landmark_bonus: 300,
            heading_bonus: 200,
            threshold: 500,
        }
    }
}

/// Configuration for one scraper instance
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub static_timeout: Duration,
    pub render_timeout: Duration,
    pub interaction_timeout: Duration,
    /// Deadline for a whole scrape, enforced at the API/CLI boundary
    pub scrape_timeout: Duration,
    pub quality: QualityWeights,
    pub user_agent: String,
    /// Upper bound on headless browsers open at once
    pub browser_concurrency: usize,
    pub chrome_path: Option<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            static_timeout: Duration::from_secs(10),
            render_timeout: Duration::from_secs(15),
            interaction_timeout: Duration::from_secs(20),
            scrape_timeout: Duration::from_secs(60),
            quality: QualityWeights::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser_concurrency: 4,
            chrome_path: None,
        }
    }
}

/// Pipeline flags shared by `scrape` and `serve`
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Overall scrape deadline in seconds
    #[arg(long = "timeout", env = "SCRAPE_TIMEOUT", default_value = "60")]
    pub scrape_timeout: u64,

    /// Static fetch timeout in seconds
    #[arg(long, default_value = "10")]
    pub static_timeout: u64,

    /// Headless render timeout in seconds
    #[arg(long, default_value = "15")]
    pub render_timeout: u64,

    /// Interaction discovery timeout in seconds
    #[arg(long, default_value = "20")]
    pub interaction_timeout: u64,

    /// Static pages scoring below this are rendered headless
    #[arg(long, default_value = "500")]
    pub quality_threshold: usize,

    /// User agent for static fetches and browser sessions
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Max headless browsers open at once (1-16)
    #[arg(long = "browsers", default_value = "4", value_parser = clap::value_parser!(u8).range(1..=16))]
    pub browser_concurrency: u8,

    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long = "chrome", env = "CHROME_PATH")]
    pub chrome_path: Option<String>,
}

impl From<PipelineArgs> for ScrapeConfig {
    fn from(args: PipelineArgs) -> Self {
        Self {
            static_timeout: Duration::from_secs(args.static_timeout),
            render_timeout: Duration::from_secs(args.render_timeout),
            interaction_timeout: Duration::from_secs(args.interaction_timeout),
            scrape_timeout: Duration::from_secs(args.scrape_timeout),
            quality: QualityWeights {
                threshold: args.quality_threshold,
                ..QualityWeights::default()
            },
            user_agent: args.user_agent,
            browser_concurrency: args.browser_concurrency as usize,
            chrome_path: args.chrome_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.static_timeout, Duration::from_secs(10));
        assert_eq!(config.render_timeout, Duration::from_secs(15));
        assert_eq!(config.interaction_timeout, Duration::from_secs(20));
        assert_eq!(config.scrape_timeout, Duration::from_secs(60));
        assert_eq!(config.quality.threshold, 500);
        assert_eq!(config.quality.landmark_bonus, 300);
        assert_eq!(config.quality.heading_bonus, 200);
    }

    #[test]
    fn test_from_args() {
        let args = PipelineArgs {
            scrape_timeout: 30,
            static_timeout: 5,
            render_timeout: 12,
            interaction_timeout: 8,
            quality_threshold: 800,
            user_agent: "test-agent".to_string(),
            browser_concurrency: 2,
            chrome_path: None,
        };
        let config = ScrapeConfig::from(args);
        assert_eq!(config.scrape_timeout, Duration::from_secs(30));
        assert_eq!(config.quality.threshold, 800);
        assert_eq!(config.quality.landmark_bonus, 300);
        assert_eq!(config.browser_concurrency, 2);
        assert_eq!(config.user_agent, "test-agent");
    }
}
