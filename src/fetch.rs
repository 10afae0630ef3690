//! Static fetch: one plain HTTP GET, no script execution
//!
//! Each call builds its own client so concurrent scrapes never share
//! connections or cookies.

use crate::config::ScrapeConfig;
use crate::error::{Result, ScrapeError};
use crate::extract::is_http_url;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;

pub struct StaticFetcher {
    user_agent: String,
    timeout: Duration,
}

impl StaticFetcher {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.static_timeout,
        }
    }

    fn client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        Ok(reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .timeout(self.timeout)
            .build()?)
    }

    /// Body of `url` after redirects; non-2xx statuses are errors
    pub async fn fetch(&self, url: &str) -> Result<String> {
        if !is_http_url(url) {
            return Err(ScrapeError::InvalidUrl(url.to_string()));
        }
        let client = self.client()?;
        let request = async {
            let response = client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScrapeError::Status {
                    status: status.as_u16(),
                    url: response.url().to_string(),
                });
            }
            Ok(response.text().await?)
        };

        let html = match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result?,
            Err(_) => return Err(ScrapeError::timeout("Static fetch", self.timeout)),
        };
        tracing::debug!(url, bytes = html.len(), "static fetch complete");
        Ok(html)
    }
}
