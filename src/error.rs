//! Typed failures of the fetch, render and browser layers

use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error {status}: {url}")]
    Status { status: u16, url: String },

    #[error("{operation} timed out after {}s", .after.as_secs_f32())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ScrapeError {
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        ScrapeError::Timeout { operation, after }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ScrapeError::Timeout { .. } => true,
            ScrapeError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(err.to_string())
    }
}
