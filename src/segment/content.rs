//! Per-region content extraction
//!
//! A region is either a real element (landmark, block) or a virtual container
//! made of a heading plus the siblings that follow it. Both are flattened to
//! the node list they cover and extracted the same way.

use crate::extract::{
    absolute_http_url, element_text, join_text, label_from_text, truncate_chars, truncate_html,
    RAW_HTML_LIMIT,
};
use crate::model::{ContentData, Image, Link};
use ego_tree::NodeRef;
use scraper::{ElementRef, Node, Selector};
use std::sync::LazyLock;
use url::Url;

/// Cap on a section's flattened text
pub const MAX_TEXT_CHARS: usize = 10_000;

const LABEL_WORDS: usize = 7;
const LABEL_CHARS: usize = 60;

static TABLE_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));

/// A section before classification
#[derive(Debug, Clone)]
pub struct SectionDraft {
    pub id: String,
    pub label: String,
    pub source_url: String,
    pub content: ContentData,
    pub raw_html: String,
    pub truncated: bool,
}

/// The markup a section is extracted from
pub enum Region<'a> {
    Element(ElementRef<'a>),
    /// Heading plus its collected following siblings
    Container {
        heading: ElementRef<'a>,
        siblings: Vec<NodeRef<'a, Node>>,
    },
}

impl<'a> Region<'a> {
    /// Every node covered by the region, in document order, excluding the
    /// region's own root element
    fn nodes(&self) -> Vec<NodeRef<'a, Node>> {
        match self {
            Region::Element(el) => el.descendants().skip(1).collect(),
            Region::Container { heading, siblings } => heading
                .descendants()
                .chain(siblings.iter().flat_map(|s| s.descendants()))
                .collect(),
        }
    }

    fn tag_name(&self) -> &str {
        match self {
            Region::Element(el) => el.value().name(),
            Region::Container { .. } => "div",
        }
    }

    fn markup(&self) -> String {
        match self {
            Region::Element(el) => el.html(),
            Region::Container { heading, siblings } => {
                let mut out = String::from("<div>");
                out.push_str(&heading.html());
                for node in siblings {
                    if let Some(el) = ElementRef::wrap(*node) {
                        out.push_str(&el.html());
                    } else if let Some(text) = node.value().as_text() {
                        out.push_str(&escape_text(text));
                    }
                }
                out.push_str("</div>");
                out
            }
        }
    }
}

pub fn is_heading(name: &str) -> bool {
    heading_level(name).is_some()
}

/// Rank of `h1`..`h6` (1 is highest)
pub fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Extract headings, text, links, images, lists, tables, label and raw markup
pub fn extract_region(
    region: &Region<'_>,
    id: String,
    base: Option<&Url>,
    source_url: &str,
) -> SectionDraft {
    let nodes = region.nodes();
    let elements: Vec<ElementRef<'_>> = nodes.iter().copied().filter_map(ElementRef::wrap).collect();

    let headings: Vec<String> = elements
        .iter()
        .filter(|el| is_heading(el.value().name()))
        .map(|el| element_text(*el))
        .filter(|t| !t.is_empty())
        .collect();

    let text = join_text(nodes.iter().filter_map(|n| n.value().as_text()).map(|t| &**t));
    let text = truncate_chars(&text, MAX_TEXT_CHARS).to_string();

    let mut links = Vec::new();
    let mut images = Vec::new();
    let mut lists = Vec::new();
    let mut tables = Vec::new();

    for el in &elements {
        match el.value().name() {
            "a" => {
                let Some(href) = el.value().attr("href") else {
                    continue;
                };
                if let Some(href) = absolute_http_url(base, href) {
                    let text = element_text(*el);
                    let text = if text.is_empty() { href.clone() } else { text };
                    links.push(Link { text, href });
                }
            }
            "img" => {
                let Some(src) = el.value().attr("src") else {
                    continue;
                };
                if let Some(src) = absolute_http_url(base, src) {
                    let alt = el.value().attr("alt").unwrap_or_default().trim().to_string();
                    images.push(Image { src, alt });
                }
            }
            "ul" | "ol" => {
                let items = list_items(*el);
                if !items.is_empty() {
                    lists.push(items);
                }
            }
            "table" => {
                let rows = table_rows(*el);
                if !rows.is_empty() {
                    tables.push(rows);
                }
            }
            _ => {}
        }
    }

    let label = headings
        .first()
        .cloned()
        .or_else(|| Some(label_from_text(&text, LABEL_WORDS, LABEL_CHARS)).filter(|l| !l.is_empty()))
        .unwrap_or_else(|| capitalize(region.tag_name()));

    let (raw_html, truncated) = truncate_html(&region.markup(), RAW_HTML_LIMIT);

    SectionDraft {
        id,
        label,
        source_url: source_url.to_string(),
        content: ContentData {
            headings,
            text,
            links,
            images,
            lists,
            tables,
        },
        raw_html,
        truncated,
    }
}

/// Text of the direct `li` children only
fn list_items(list: ElementRef<'_>) -> Vec<String> {
    list.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li")
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Rows of cell text; structure below the cell is flattened
fn table_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    table
        .select(&TABLE_ROW)
        .map(|tr| {
            tr.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(element_text)
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
