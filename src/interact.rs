//! Bounded interaction discovery
//!
//! Drives one isolated browser session through four stages in a fixed order:
//! tabs, "load more" buttons, pagination, infinite scroll. Each stage reads an
//! ordered rule table and has a hard cap, so a page can never keep the engine
//! busy past its budget. A failed sub-step is recorded and skipped; losing the
//! session itself degrades to "visited the start page only".

use crate::browser::{close_quietly, BrowserLauncher, BrowserSession, Locator, WaitCondition};
use crate::error::{Result, ScrapeError};
use crate::extract::{absolute_http_url, is_http_url};
use crate::model::{Interactions, Phase, ScraperError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const SCROLL_HEIGHT_JS: &str = "document.body.scrollHeight";
pub const SCROLL_TO_BOTTOM_JS: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

const TABS: [Locator; 4] = [
    Locator::Css("[role='tab']"),
    Locator::Css(".tab-button"),
    Locator::Css(".nav-tab"),
    Locator::Css("button[aria-selected='false']"),
];

const LOAD_MORE: [Locator; 5] = [
    Locator::Text {
        tag: "button",
        text: "Load More",
    },
    Locator::Text {
        tag: "button",
        text: "Show More",
    },
    Locator::Text {
        tag: "button",
        text: "View More",
    },
    Locator::Text {
        tag: "a",
        text: "Load More",
    },
    Locator::Css("[data-action='load-more']"),
];

const NEXT_PAGE: [Locator; 4] = [
    Locator::Css("a[rel='next']"),
    Locator::Css(".pagination a.next"),
    Locator::Text {
        tag: "a",
        text: "Next",
    },
    Locator::Css("a[aria-label='Next page']"),
];

const MAX_TABS_PER_SELECTOR: usize = 5;
const MAX_LOAD_MORE_ROUNDS: usize = 3;
const MAX_PAGE_HOPS: usize = 3;
const MAX_SCROLLS: usize = 3;

const INITIAL_SETTLE: Duration = Duration::from_secs(1);
const CLICK_SETTLE: Duration = Duration::from_millis(1500);
const PAGE_SETTLE: Duration = Duration::from_millis(500);
const PAGE_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(10);
const INITIAL_NAVIGATION_TIMEOUT: Duration = Duration::from_secs(15);
const SCROLL_IDLE_WAIT: Duration = Duration::from_secs(5);
const SCROLL_PAUSE: Duration = Duration::from_secs(2);

/// What the engine did, plus the sub-steps that failed along the way
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub interactions: Interactions,
    pub errors: Vec<ScraperError>,
}

impl Discovery {
    fn start_page_only(url: &str) -> Self {
        Self {
            interactions: Interactions::visited(url),
            errors: Vec::new(),
        }
    }
}

pub struct InteractionEngine {
    launcher: Arc<dyn BrowserLauncher>,
    timeout: Duration,
}

impl InteractionEngine {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, timeout: Duration) -> Self {
        Self { launcher, timeout }
    }

    /// Explore `url`. Never fails: a lost session or an expired budget yields
    /// the start page alone.
    pub async fn discover(&self, url: &str) -> Discovery {
        let mut slot: Option<Box<dyn BrowserSession>> = None;
        let outcome = tokio::time::timeout(self.timeout, async {
            let session = slot.insert(self.launcher.launch().await?);
            explore(session.as_mut(), url).await
        })
        .await;
        close_quietly(slot).await;

        match outcome {
            Ok(Ok(discovery)) => {
                tracing::info!(
                    url,
                    clicks = discovery.interactions.clicks.len(),
                    scrolls = discovery.interactions.scrolls,
                    pages = discovery.interactions.pages.len(),
                    "interaction discovery finished"
                );
                discovery
            }
            Ok(Err(e)) => {
                tracing::warn!(url, error = %e, "interaction discovery failed");
                Discovery::start_page_only(url)
            }
            Err(_) => {
                tracing::warn!(url, timeout_secs = self.timeout.as_secs(), "interaction discovery timed out");
                Discovery::start_page_only(url)
            }
        }
    }
}

async fn explore(session: &mut dyn BrowserSession, url: &str) -> Result<Discovery> {
    session.navigate(url, INITIAL_NAVIGATION_TIMEOUT).await?;
    pause(session, INITIAL_SETTLE).await;

    let mut explorer = Explorer {
        session,
        interactions: Interactions::visited(url),
        visited: Url::parse(url).into_iter().collect(),
        errors: Vec::new(),
    };
    explorer.activate_tabs().await;
    explorer.expand_load_more().await;
    explorer.follow_pagination().await;
    explorer.scroll().await;

    Ok(Discovery {
        interactions: explorer.interactions,
        errors: explorer.errors,
    })
}

async fn pause(session: &dyn BrowserSession, duration: Duration) {
    let _ = session.wait_for(WaitCondition::Delay(duration)).await;
}

struct Explorer<'s> {
    session: &'s mut dyn BrowserSession,
    interactions: Interactions,
    /// Parsed form of every page in `interactions.pages`
    visited: HashSet<Url>,
    errors: Vec<ScraperError>,
}

impl Explorer<'_> {
    fn record(&mut self, phase: Phase, message: String) {
        tracing::debug!(%phase, %message, "interaction step failed");
        self.errors.push(ScraperError::new(phase, message));
    }

    async fn activate_tabs(&mut self) {
        for locator in &TABS {
            let found = match self.session.query_selector_all(locator).await {
                Ok(found) => found,
                Err(e) => {
                    self.record(Phase::Click, format!("Tab lookup {} failed: {}", locator, e));
                    continue;
                }
            };
            let targets: Vec<usize> = found
                .iter()
                .enumerate()
                .filter(|(_, el)| el.visible)
                .map(|(index, _)| index)
                .take(MAX_TABS_PER_SELECTOR)
                .collect();
            for index in targets {
                match self.session.click(locator, index).await {
                    Ok(()) => {
                        self.interactions.clicks.push(format!("{}[{}]", locator, index));
                        pause(&*self.session, CLICK_SETTLE).await;
                    }
                    Err(e) => self.record(
                        Phase::Click,
                        format!("Tab click {}[{}] failed: {}", locator, index, e),
                    ),
                }
            }
        }
    }

    async fn expand_load_more(&mut self) {
        for _ in 0..MAX_LOAD_MORE_ROUNDS {
            if !self.click_first_load_more().await {
                break;
            }
        }
    }

    /// One round: the first visible match across the table gets clicked
    async fn click_first_load_more(&mut self) -> bool {
        for locator in &LOAD_MORE {
            let found = match self.session.query_selector_all(locator).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(%locator, error = %e, "load-more lookup failed");
                    continue;
                }
            };
            let Some(index) = found.iter().position(|el| el.visible) else {
                continue;
            };
            match self.session.click(locator, index).await {
                Ok(()) => {
                    self.interactions.clicks.push(format!("{}[{}]", locator, index));
                    pause(&*self.session, CLICK_SETTLE).await;
                    return true;
                }
                Err(e) => self.record(
                    Phase::Click,
                    format!("Load more click {}[{}] failed: {}", locator, index, e),
                ),
            }
        }
        false
    }

    async fn follow_pagination(&mut self) {
        for _ in 0..MAX_PAGE_HOPS {
            if !self.follow_next_link().await {
                break;
            }
        }
    }

    async fn follow_next_link(&mut self) -> bool {
        let current = match self.session.current_url().await {
            Ok(url) if is_http_url(&url) => url,
            _ => self.interactions.pages.last().cloned().unwrap_or_default(),
        };
        let base = Url::parse(&current).ok();

        for locator in &NEXT_PAGE {
            let found = match self.session.query_selector_all(locator).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(%locator, error = %e, "next-page lookup failed");
                    continue;
                }
            };
            let Some(href) = found.first().and_then(|el| el.href.clone()) else {
                continue;
            };
            let Some((next, parsed)) = absolute_http_url(base.as_ref(), &href)
                .and_then(|next| Url::parse(&next).ok().map(|parsed| (next, parsed)))
            else {
                self.record(Phase::Parse, format!("Unusable next-page link: {}", href));
                continue;
            };
            // Compare normalized forms: the start page is kept exactly as given
            if self.visited.contains(&parsed) {
                continue;
            }
            match self.session.navigate(&next, PAGE_NAVIGATION_TIMEOUT).await {
                Ok(()) => {
                    tracing::debug!(page = %next, "followed pagination");
                    self.visited.insert(parsed);
                    self.interactions.pages.push(next);
                    pause(&*self.session, PAGE_SETTLE).await;
                    return true;
                }
                Err(e) => self.record(
                    Phase::Click,
                    format!("Following next page {} failed: {}", next, e),
                ),
            }
        }
        false
    }

    async fn scroll(&mut self) {
        for _ in 0..MAX_SCROLLS {
            match self.scroll_once().await {
                Ok(true) => self.interactions.scrolls += 1,
                Ok(false) => break,
                Err(e) => {
                    self.record(Phase::Scroll, format!("Scroll failed: {}", e));
                    break;
                }
            }
        }
    }

    /// Scroll to the bottom; true when the document grew
    async fn scroll_once(&mut self) -> Result<bool> {
        let before = self.document_height().await?;
        self.session.evaluate(SCROLL_TO_BOTTOM_JS).await?;
        if self
            .session
            .wait_for(WaitCondition::NetworkIdle(SCROLL_IDLE_WAIT))
            .await
            .is_err()
        {
            pause(&*self.session, SCROLL_PAUSE).await;
        }
        let after = self.document_height().await?;
        Ok(after > before)
    }

    async fn document_height(&self) -> Result<f64> {
        self.session
            .evaluate(SCROLL_HEIGHT_JS)
            .await?
            .as_f64()
            .ok_or_else(|| ScrapeError::Script("document height is not a number".to_string()))
    }
}
