//! Section segmentation
//!
//! Turns markup into an ordered list of typed sections. Three passes run over
//! one cleaned parse tree:
//!
//! 1. landmarks (`header`, `nav`, `main`, `section`, `article`, `footer`)
//! 2. headings (`h1`-`h4`) with the siblings that follow them
//! 3. classed `div` blocks carrying more than 200 characters of text
//!
//! Elements claimed by an earlier pass are skipped by later ones. Survivors are
//! deduplicated on a fingerprint of their leading text, then classified.

pub mod classify;
pub mod content;

use crate::extract::{detach_matching, element_text, truncate_chars};
use crate::model::Section;
use content::{extract_region, heading_level, Region, SectionDraft};
use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;
use xxhash_rust::xxh3::xxh3_64;

const LANDMARKS: [&str; 6] = ["header", "nav", "main", "section", "article", "footer"];

/// Max siblings pulled into a heading section
const MAX_HEADING_SIBLINGS: usize = 20;

/// A classed `div` needs more text than this to become a block section
const BLOCK_MIN_TEXT: usize = 200;

/// Leading chars of text that make up a section's fingerprint
const FINGERPRINT_CHARS: usize = 200;

/// Markup that never carries page content
const NOISE: &str = "script, style, noscript, \
    .cookie-banner, .cookie-notice, [data-cookie], \
    .modal:not(.active), .popup, [role='dialog'], \
    [data-ad-slot], .ad-container, iframe[src*='ads'], \
    .newsletter-popup, .modal-backdrop, \
    [class*='advertisement'], [class*='consent']";

static NOISE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(NOISE).expect("valid noise selector"));
static LANDMARK_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    LANDMARKS
        .iter()
        .map(|tag| (*tag, Selector::parse(tag).expect("valid landmark selector")))
        .collect()
});
static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4").expect("valid selector"));
static BLOCK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div[class]").expect("valid selector"));

/// Segment markup into deduplicated, classified sections in document-pass order
pub fn segment(html: &str, base_url: &str) -> Vec<Section> {
    let mut doc = Html::parse_document(html);
    let removed = detach_matching(&mut doc, &NOISE_SELECTOR);
    let base = Url::parse(base_url).ok();

    let drafts = Passes::new(base.as_ref(), base_url).run(&doc);
    let found = drafts.len();
    let sections: Vec<Section> = dedup(drafts).into_iter().map(classify::finalize).collect();

    debug!(
        removed,
        found,
        kept = sections.len(),
        "segmented {}",
        base_url
    );
    sections
}

/// Stable fingerprint of a section's leading text
pub fn fingerprint(text: &str) -> u64 {
    xxh3_64(truncate_chars(text, FINGERPRINT_CHARS).as_bytes())
}

/// Keep the first section per fingerprint, preserving order
fn dedup(drafts: Vec<SectionDraft>) -> Vec<SectionDraft> {
    let mut seen = HashSet::new();
    drafts
        .into_iter()
        .filter(|draft| seen.insert(fingerprint(&draft.content.text)))
        .collect()
}

/// Shared state of the three extraction passes
struct Passes<'u> {
    base: Option<&'u Url>,
    source_url: &'u str,
    claimed: HashSet<NodeId>,
    drafts: Vec<SectionDraft>,
    next_index: usize,
}

impl<'u> Passes<'u> {
    fn new(base: Option<&'u Url>, source_url: &'u str) -> Self {
        Self {
            base,
            source_url,
            claimed: HashSet::new(),
            drafts: Vec::new(),
            next_index: 0,
        }
    }

    fn run(mut self, doc: &Html) -> Vec<SectionDraft> {
        let root = doc.root_element();
        self.landmark_pass(root);
        self.heading_pass(root);
        self.block_pass(root);
        self.drafts
    }

    /// Extract a region; on non-empty text record it and claim `ids`
    fn emit(&mut self, region: &Region<'_>, source: &str, ids: impl IntoIterator<Item = NodeId>) {
        let id = format!("{}-{}", source, self.next_index);
        let draft = extract_region(region, id, self.base, self.source_url);
        if draft.content.text.is_empty() {
            return;
        }
        self.claimed.extend(ids);
        self.drafts.push(draft);
        self.next_index += 1;
    }

    fn landmark_pass(&mut self, root: ElementRef<'_>) {
        for (tag, selector) in LANDMARK_SELECTORS.iter() {
            for el in root.select(selector) {
                if self.claimed.contains(&el.id()) {
                    continue;
                }
                self.emit(&Region::Element(el), tag, [el.id()]);
            }
        }
    }

    fn heading_pass(&mut self, root: ElementRef<'_>) {
        for heading in root.select(&HEADING_SELECTOR) {
            if self.claimed.contains(&heading.id()) {
                continue;
            }
            let Some(level) = heading_level(heading.value().name()) else {
                continue;
            };
            let siblings = following_siblings(heading, level);
            let ids: Vec<NodeId> = std::iter::once(heading.id())
                .chain(siblings.iter().filter(|n| n.value().is_element()).map(|n| n.id()))
                .collect();
            self.emit(&Region::Container { heading, siblings }, "section", ids);
        }
    }

    fn block_pass(&mut self, root: ElementRef<'_>) {
        for div in root.select(&BLOCK_SELECTOR) {
            if self.claimed.contains(&div.id()) {
                continue;
            }
            if element_text(div).chars().count() <= BLOCK_MIN_TEXT {
                continue;
            }
            self.emit(&Region::Element(div), "block", [div.id()]);
        }
    }
}

/// Siblings after `heading` up to the next heading of equal or higher rank.
/// Whitespace-only text and comments are skipped and not counted.
fn following_siblings(heading: ElementRef<'_>, level: u8) -> Vec<NodeRef<'_, Node>> {
    let mut collected = Vec::new();
    for node in heading.next_siblings() {
        match node.value() {
            Node::Text(text) if text.trim().is_empty() => continue,
            Node::Text(_) => {}
            Node::Element(el) => {
                if heading_level(el.name()).is_some_and(|l| l <= level) {
                    break;
                }
            }
            _ => continue,
        }
        collected.push(node);
        if collected.len() >= MAX_HEADING_SIBLINGS {
            break;
        }
    }
    collected
}
