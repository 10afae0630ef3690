//! Headless browser capability
//!
//! The pipeline only talks to [`BrowserLauncher`] and [`BrowserSession`]; the
//! Chromium adapter lives in [`chromium`] and tests drive a scripted fake.

pub mod chromium;
#[cfg(test)]
pub mod fake;

use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub use chromium::ChromiumLauncher;

/// How to find elements on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Plain CSS selector
    Css(&'static str),
    /// Elements of `tag` whose text contains `text`, case-insensitively
    Text {
        tag: &'static str,
        text: &'static str,
    },
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(sel) => f.write_str(sel),
            Locator::Text { tag, text } => write!(f, "{}:has-text('{}')", tag, text),
        }
    }
}

/// Something to wait for after a page changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// No new network activity, bounded by the timeout
    NetworkIdle(Duration),
    /// A CSS selector matches, bounded by the timeout
    Selector(&'static str, Duration),
    /// Unconditional pause
    Delay(Duration),
}

/// What a lookup learns about one matching element
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementInfo {
    pub visible: bool,
    pub href: Option<String>,
}

/// Starts isolated browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Open a fresh session with its own profile, cookies and cache
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// One live page in one isolated browser
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// Every element matching `locator`, in document order
    async fn query_selector_all(&self, locator: &Locator) -> Result<Vec<ElementInfo>>;

    /// Click the `index`-th element matching `locator`
    async fn click(&mut self, locator: &Locator, index: usize) -> Result<()>;

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    async fn wait_for(&self, condition: WaitCondition) -> Result<()>;

    async fn current_html(&self) -> Result<String>;

    async fn current_url(&self) -> Result<String>;

    /// Tear the session down; the browser process must be gone afterwards
    async fn close(self: Box<Self>) -> Result<()>;
}

/// Close a session that may or may not have been opened, logging failures
pub(crate) async fn close_quietly(session: Option<Box<dyn BrowserSession>>) {
    if let Some(session) = session {
        if let Err(e) = session.close().await {
            tracing::warn!(error = %e, "failed to close browser session");
        }
    }
}
