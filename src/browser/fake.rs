//! Scripted in-memory browser for tests

use super::{BrowserLauncher, BrowserSession, ElementInfo, Locator, WaitCondition};
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::interact::{SCROLL_HEIGHT_JS, SCROLL_TO_BOTTOM_JS};

/// One page the fake browser can show
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub elements: Vec<(Locator, Vec<ElementInfo>)>,
    /// Document height after 0, 1, 2.. scrolls; the last value repeats
    pub heights: Vec<i64>,
    /// Height script yields null instead of a number
    pub unreadable_height: bool,
    pub failing_clicks: bool,
    pub failing_locators: Vec<Locator>,
}

impl FakePage {
    pub fn html(html: &str) -> Self {
        Self {
            html: html.to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, locator: Locator, found: Vec<ElementInfo>) -> Self {
        self.elements.push((locator, found));
        self
    }

    pub fn with_heights(mut self, heights: &[i64]) -> Self {
        self.heights = heights.to_vec();
        self
    }

    pub fn with_unreadable_height(mut self) -> Self {
        self.unreadable_height = true;
        self
    }

    pub fn with_failing_clicks(mut self) -> Self {
        self.failing_clicks = true;
        self
    }

    /// Clicks on `locator` fail; other locators stay clickable
    pub fn with_failing_click_on(mut self, locator: Locator) -> Self {
        self.failing_locators.push(locator);
        self
    }

    fn click_fails(&self, locator: &Locator) -> bool {
        self.failing_clicks || self.failing_locators.contains(locator)
    }

    fn find(&self, locator: &Locator) -> Vec<ElementInfo> {
        self.elements
            .iter()
            .find(|(l, _)| l == locator)
            .map(|(_, found)| found.clone())
            .unwrap_or_default()
    }
}

pub fn visible() -> ElementInfo {
    ElementInfo {
        visible: true,
        href: None,
    }
}

pub fn hidden() -> ElementInfo {
    ElementInfo {
        visible: false,
        href: None,
    }
}

pub fn link(href: &str) -> ElementInfo {
    ElementInfo {
        visible: true,
        href: Some(href.to_string()),
    }
}

/// Everything the fake observed
#[derive(Debug, Default)]
pub struct Activity {
    pub launches: usize,
    pub closes: usize,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    pub waits: Vec<WaitCondition>,
}

/// Launcher over a fixed set of pages
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pages: Arc<HashMap<String, FakePage>>,
    pub activity: Arc<Mutex<Activity>>,
    fail_launch: bool,
    panic_on_launch: bool,
    /// Navigation sleeps this long before completing
    navigation_delay: Option<Duration>,
    network_never_idle: bool,
}

impl FakeBrowser {
    pub fn new(pages: Vec<(&str, FakePage)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// A launcher whose every launch fails
    pub fn broken() -> Self {
        Self {
            fail_launch: true,
            ..Self::default()
        }
    }

    /// A launcher that panics instead of returning
    pub fn panicking() -> Self {
        Self {
            panic_on_launch: true,
            ..Self::default()
        }
    }

    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = Some(delay);
        self
    }

    pub fn with_busy_network(mut self) -> Self {
        self.network_never_idle = true;
        self
    }

    pub fn launches(&self) -> usize {
        self.activity.lock().unwrap().launches
    }

    pub fn closes(&self) -> usize {
        self.activity.lock().unwrap().closes
    }

    pub fn clicks(&self) -> Vec<String> {
        self.activity.lock().unwrap().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.activity.lock().unwrap().navigations.clone()
    }

    pub fn waits(&self) -> Vec<WaitCondition> {
        self.activity.lock().unwrap().waits.clone()
    }
}

#[async_trait]
impl BrowserLauncher for FakeBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
        self.activity.lock().unwrap().launches += 1;
        if self.panic_on_launch {
            panic!("chrome handler crashed");
        }
        if self.fail_launch {
            return Err(ScrapeError::Browser("failed to launch Chrome".to_string()));
        }
        Ok(Box::new(FakeSession {
            browser: self.clone(),
            url: "about:blank".to_string(),
            scrolls: AtomicUsize::new(0),
        }))
    }
}

pub struct FakeSession {
    browser: FakeBrowser,
    url: String,
    scrolls: AtomicUsize,
}

impl FakeSession {
    fn page(&self) -> Option<&FakePage> {
        self.browser.pages.get(&self.url)
    }

    fn height(&self) -> i64 {
        match self.page() {
            Some(page) if !page.heights.is_empty() => {
                let scrolls = self.scrolls.load(Ordering::SeqCst);
                page.heights[scrolls.min(page.heights.len() - 1)]
            }
            _ => 0,
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<()> {
        self.browser
            .activity
            .lock()
            .unwrap()
            .navigations
            .push(url.to_string());
        if let Some(delay) = self.browser.navigation_delay {
            if delay >= timeout {
                tokio::time::sleep(timeout).await;
                return Err(ScrapeError::timeout("Navigation", timeout));
            }
            tokio::time::sleep(delay).await;
        }
        if !self.browser.pages.contains_key(url) {
            return Err(ScrapeError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.url = url.to_string();
        self.scrolls.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn query_selector_all(&self, locator: &Locator) -> Result<Vec<ElementInfo>> {
        Ok(self.page().map(|p| p.find(locator)).unwrap_or_default())
    }

    async fn click(&mut self, locator: &Locator, index: usize) -> Result<()> {
        let page = self.page().cloned().unwrap_or_default();
        if page.click_fails(locator) || index >= page.find(locator).len() {
            return Err(ScrapeError::Browser(format!(
                "element {}[{}] is not clickable",
                locator, index
            )));
        }
        self.browser
            .activity
            .lock()
            .unwrap()
            .clicks
            .push(format!("{}[{}]", locator, index));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        if script == SCROLL_HEIGHT_JS {
            if self.page().is_some_and(|p| p.unreadable_height) {
                return Ok(serde_json::Value::Null);
            }
            Ok(serde_json::json!(self.height()))
        } else if script == SCROLL_TO_BOTTOM_JS {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::Value::Bool(true))
        } else {
            Err(ScrapeError::Script(format!("unexpected script: {}", script)))
        }
    }

    async fn wait_for(&self, condition: WaitCondition) -> Result<()> {
        self.browser.activity.lock().unwrap().waits.push(condition);
        match condition {
            WaitCondition::NetworkIdle(timeout) if self.browser.network_never_idle => {
                Err(ScrapeError::timeout("Network idle wait", timeout))
            }
            _ => Ok(()),
        }
    }

    async fn current_html(&self) -> Result<String> {
        Ok(self.page().map(|p| p.html.clone()).unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.browser.activity.lock().unwrap().closes += 1;
        Ok(())
    }
}
