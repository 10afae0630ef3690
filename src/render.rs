//! Headless render of a single URL
//!
//! Navigate, give the page a chance to settle, take the DOM. The settle step
//! tries network idle first, then a `body` element, then a fixed pause; the
//! first condition that holds wins. The session is closed on every path.

use crate::browser::{close_quietly, BrowserLauncher, BrowserSession, WaitCondition};
use crate::error::{Result, ScrapeError};
use std::sync::Arc;
use std::time::Duration;

const IDLE_WAIT: Duration = Duration::from_secs(10);
const BODY_WAIT: Duration = Duration::from_secs(5);
const FALLBACK_PAUSE: Duration = Duration::from_secs(2);

pub struct HeadlessRenderer {
    launcher: Arc<dyn BrowserLauncher>,
    timeout: Duration,
}

impl HeadlessRenderer {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, timeout: Duration) -> Self {
        Self { launcher, timeout }
    }

    /// Rendered markup of `url`, bounded by the render timeout
    pub async fn render(&self, url: &str) -> Result<String> {
        let mut slot: Option<Box<dyn BrowserSession>> = None;
        let outcome = tokio::time::timeout(self.timeout, async {
            let session = slot.insert(self.launcher.launch().await?);
            load(session.as_mut(), url, self.timeout).await
        })
        .await;
        close_quietly(slot).await;

        match outcome {
            Ok(Ok(html)) => {
                tracing::debug!(url, bytes = html.len(), "rendered page");
                Ok(html)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ScrapeError::timeout("Headless render", self.timeout)),
        }
    }
}

async fn load(session: &mut dyn BrowserSession, url: &str, timeout: Duration) -> Result<String> {
    session.navigate(url, timeout).await?;
    settle(session).await;
    session.current_html().await
}

async fn settle(session: &dyn BrowserSession) {
    let tiers = [
        WaitCondition::NetworkIdle(IDLE_WAIT),
        WaitCondition::Selector("body", BODY_WAIT),
    ];
    for condition in tiers {
        match session.wait_for(condition).await {
            Ok(()) => return,
            Err(e) => tracing::debug!(?condition, error = %e, "wait condition not met"),
        }
    }
    let _ = session.wait_for(WaitCondition::Delay(FALLBACK_PAUSE)).await;
}
