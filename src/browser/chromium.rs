//! Headless Chrome sessions via chromiumoxide
//!
//! Every session is its own browser process with a throwaway profile
//! directory, so cookies, cache and storage never leak between scrapes. A
//! semaphore bounds how many processes run at once.

use super::{BrowserLauncher, BrowserSession, ElementInfo, Locator, WaitCondition};
use crate::config::ScrapeConfig;
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Consecutive quiet polls before the network counts as idle
const IDLE_QUIET_POLLS: u32 = 2;

const RESOURCE_COUNT_JS: &str = "(() => document.readyState === 'complete' \
     ? performance.getEntriesByType('resource').length : -1)()";

/// Launches one Chromium process per session
pub struct ChromiumLauncher {
    semaphore: Arc<Semaphore>,
    user_agent: String,
    chrome_path: Option<String>,
}

impl ChromiumLauncher {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.browser_concurrency.max(1))),
            user_agent: config.user_agent.clone(),
            chrome_path: config.chrome_path.clone(),
        }
    }

    fn browser_config(&self, profile: &TempDir) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--no-first-run")
            .arg("--headless=new")
            .window_size(1280, 720)
            .user_data_dir(profile.path());
        if let Some(path) = &self.chrome_path {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|e| ScrapeError::Browser(format!("config error: {}", e)))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        let profile = tempfile::Builder::new()
            .prefix("pagelens-")
            .tempdir()
            .map_err(|e| ScrapeError::Browser(format!("profile directory: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(self.browser_config(&profile)?)
            .await
            .map_err(|e| {
                ScrapeError::Browser(format!(
                    "failed to launch Chrome ({}). Is Chrome/Chromium installed?",
                    e
                ))
            })?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        match open_page(&browser, &self.user_agent).await {
            Ok(page) => {
                tracing::debug!("browser session started");
                Ok(Box::new(ChromiumSession {
                    browser,
                    page,
                    handler,
                    _profile: profile,
                    _permit: permit,
                }))
            }
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                Err(e)
            }
        }
    }
}

async fn open_page(browser: &Browser, user_agent: &str) -> Result<Page> {
    let page = browser.new_page("about:blank").await?;
    page.execute(SetUserAgentOverrideParams::new(user_agent))
        .await?;
    Ok(page)
}

/// A single page in a dedicated browser process
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    _profile: TempDir,
    _permit: OwnedSemaphorePermit,
}

impl ChromiumSession {
    async fn eval_value(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ScrapeError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn wait_network_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut last = -1;
        let mut quiet = 0;
        while Instant::now() < deadline {
            let count = self
                .eval_value(RESOURCE_COUNT_JS)
                .await?
                .as_i64()
                .unwrap_or(-1);
            if count >= 0 && count == last {
                quiet += 1;
                if quiet >= IDLE_QUIET_POLLS {
                    return Ok(());
                }
            } else {
                quiet = 0;
            }
            last = count;
            sleep(IDLE_POLL_INTERVAL).await;
        }
        Err(ScrapeError::timeout("Network idle wait", timeout))
    }

    async fn wait_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }
        Err(ScrapeError::timeout("Selector wait", timeout))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ScrapeError::timeout("Navigation", timeout)),
        }
    }

    async fn query_selector_all(&self, locator: &Locator) -> Result<Vec<ElementInfo>> {
        let value = self.eval_value(&describe_js(locator)).await?;
        serde_json::from_value(value).map_err(|e| ScrapeError::Script(e.to_string()))
    }

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<()> {
        let clicked = self.eval_value(&click_js(locator, index)).await?;
        if clicked.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(ScrapeError::Browser(format!(
                "no element {}[{}] to click",
                locator, index
            )))
        }
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.eval_value(script).await
    }

    async fn wait_for(&self, condition: WaitCondition) -> Result<()> {
        match condition {
            WaitCondition::NetworkIdle(timeout) => self.wait_network_idle(timeout).await,
            WaitCondition::Selector(selector, timeout) => {
                self.wait_selector(selector, timeout).await
            }
            WaitCondition::Delay(duration) => {
                sleep(duration).await;
                Ok(())
            }
        }
    }

    async fn current_html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn close(mut self: Box<Self>) -> Result<()> {
        let _ = self.page.clone().close().await;
        self.browser.close().await?;
        self.browser
            .wait()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?;
        tracing::debug!("browser session closed");
        Ok(())
    }
}

/// JS expression yielding the array of elements a locator matches
fn finder_js(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => format!(
            "Array.from(document.querySelectorAll({}))",
            js_string(selector)
        ),
        Locator::Text { tag, text } => format!(
            "Array.from(document.querySelectorAll({})).filter(el => \
             (el.textContent || '').toLowerCase().includes({}))",
            js_string(tag),
            js_string(&text.to_lowercase())
        ),
    }
}

fn describe_js(locator: &Locator) -> String {
    format!(
        "(() => {}.map(el => {{ \
           const style = window.getComputedStyle(el); \
           const visible = style.visibility !== 'hidden' && style.display !== 'none' \
             && (el.offsetWidth > 0 || el.offsetHeight > 0 || el.getClientRects().length > 0); \
           return {{ visible, href: el.getAttribute('href') }}; \
         }}))()",
        finder_js(locator)
    )
}

fn click_js(locator: &Locator, index: usize) -> String {
    format!(
        "(() => {{ const el = {}[{}]; if (!el) return false; \
           el.scrollIntoView({{ block: 'center' }}); el.click(); return true; }})()",
        finder_js(locator),
        index
    )
}

/// Quote a string as a JS literal
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
