//! Static content quality scoring
//!
//! Decides whether a cheap static fetch is good enough or the page needs a
//! headless render. Visible text length is the base score; a `main`/`article`
//! landmark and a top-level heading each add a fixed bonus.

use crate::config::QualityWeights;
use crate::extract::detach_matching;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SCRIPT_STYLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script, style").expect("valid selector"));
static LANDMARK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("main, article").expect("valid selector"));
static TOP_HEADING: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3").expect("valid selector"));

/// Score markup; higher means more usable static content
pub fn score(html: &str, weights: &QualityWeights) -> usize {
    let mut doc = Html::parse_document(html);
    detach_matching(&mut doc, &SCRIPT_STYLE);
    let root = doc.root_element();

    let text_len: usize = root.text().map(|t| t.trim().chars().count()).sum();

    let mut score = text_len;
    if root.select(&LANDMARK).next().is_some() {
        score += weights.landmark_bonus;
    }
    if root.select(&TOP_HEADING).next().is_some() {
        score += weights.heading_bonus;
    }
    score
}

/// Whether a static page scoring `score` must be rendered
pub fn needs_render(score: usize, weights: &QualityWeights) -> bool {
    score < weights.threshold
}
