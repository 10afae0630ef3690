//! Scrape result schema
//!
//! Wire format of a single scrape. Field names follow the published JSON
//! document (`scrapedAt`, `sourceUrl`, `rawHtml`), so every struct here is
//! camelCase on the wire.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Complete result of one scrape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperResult {
    /// Exact input URL
    pub url: String,
    /// RFC 3339 UTC timestamp
    pub scraped_at: String,
    pub meta: Metadata,
    /// Never empty: a placeholder is substituted when nothing was found
    pub sections: Vec<Section>,
    pub interactions: Interactions,
    /// Append-only; a non-empty list never means the scrape aborted
    pub errors: Vec<ScraperError>,
}

impl ScraperResult {
    /// Degraded result: default metadata, placeholder section, no interactions
    /// beyond the input URL, and the given error as the only entry.
    pub fn minimal(url: &str, error: ScraperError) -> Self {
        Self {
            url: url.to_string(),
            scraped_at: timestamp(),
            meta: Metadata::default(),
            sections: vec![Section::placeholder(url)],
            interactions: Interactions::visited(url),
            errors: vec![error],
        }
    }
}

/// Current time as `2025-12-28T23:02:00Z`
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Page-level metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub description: String,
    /// Primary language subtag (`en`, `fr`, ...)
    pub language: String,
    /// Absolute canonical URL, `null` when the page declares none
    pub canonical: Option<String>,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            language: "en".to_string(),
            canonical: None,
        }
    }
}

/// One labeled, typed region of the page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// `{source}-{index}`, or `empty-0` for the placeholder
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub label: String,
    pub source_url: String,
    pub content: ContentData,
    pub raw_html: String,
    pub truncated: bool,
}

impl Section {
    /// Stand-in used when segmentation finds nothing
    pub fn placeholder(url: &str) -> Self {
        Self {
            id: "empty-0".to_string(),
            kind: SectionType::Unknown,
            label: "No Content Found".to_string(),
            source_url: url.to_string(),
            content: ContentData::default(),
            raw_html: String::new(),
            truncated: false,
        }
    }
}

/// Section classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Hero,
    Nav,
    Section,
    List,
    Grid,
    Faq,
    Pricing,
    Footer,
    Unknown,
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionType::Hero => write!(f, "hero"),
            SectionType::Nav => write!(f, "nav"),
            SectionType::Section => write!(f, "section"),
            SectionType::List => write!(f, "list"),
            SectionType::Grid => write!(f, "grid"),
            SectionType::Faq => write!(f, "faq"),
            SectionType::Pricing => write!(f, "pricing"),
            SectionType::Footer => write!(f, "footer"),
            SectionType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Content extracted from a section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentData {
    pub headings: Vec<String>,
    /// Flattened visible text, at most 10,000 characters
    pub text: String,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    pub lists: Vec<Vec<String>>,
    pub tables: Vec<Vec<Vec<String>>>,
}

/// Hyperlink with an absolute http(s) href
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// Image with an absolute src
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// What the interaction pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interactions {
    /// `selector[index]` per click, in order
    pub clicks: Vec<String>,
    /// Scroll steps that grew the document
    pub scrolls: u32,
    /// Visited URLs in visit order; the input URL is always first
    pub pages: Vec<String>,
}

impl Interactions {
    /// Only the input URL, nothing clicked or scrolled
    pub fn visited(url: &str) -> Self {
        Self {
            clicks: Vec::new(),
            scrolls: 0,
            pages: vec![url.to_string()],
        }
    }
}

/// A recorded, non-fatal failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScraperError {
    pub message: String,
    pub phase: Phase,
}

impl ScraperError {
    pub fn new(phase: Phase, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            phase,
        }
    }
}

/// Pipeline phase an error was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Static transport failure or timeout
    Fetch,
    /// Headless rendering failure or timeout
    Render,
    /// Interaction sub-step: unusable pagination href
    Parse,
    /// Interaction sub-step: tab or load-more click
    Click,
    /// Interaction sub-step: scroll step
    Scroll,
    /// Informational: rendered markup replaced thin static markup
    Fallback,
    /// Overall deadline exceeded
    Timeout,
    Unknown,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Fetch => write!(f, "fetch"),
            Phase::Render => write!(f, "render"),
            Phase::Parse => write!(f, "parse"),
            Phase::Click => write!(f, "click"),
            Phase::Scroll => write!(f, "scroll"),
            Phase::Fallback => write!(f, "fallback"),
            Phase::Timeout => write!(f, "timeout"),
            Phase::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Fetch.to_string(), "fetch");
        assert_eq!(Phase::Fallback.to_string(), "fallback");
        assert_eq!(Phase::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_section_type_serializes_lowercase() {
        let json = serde_json::to_string(&SectionType::Pricing).unwrap();
        assert_eq!(json, r#""pricing""#);
        let kind: SectionType = serde_json::from_str(r#""faq""#).unwrap();
        assert_eq!(kind, SectionType::Faq);
    }

    #[test]
    fn test_section_wire_names() {
        let value = serde_json::to_value(Section::placeholder("https://example.com")).unwrap();
        assert_eq!(value["id"], "empty-0");
        assert_eq!(value["type"], "unknown");
        assert_eq!(value["label"], "No Content Found");
        assert_eq!(value["sourceUrl"], "https://example.com");
        assert_eq!(value["rawHtml"], "");
        assert_eq!(value["truncated"], false);
        assert!(value["content"]["tables"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_minimal_result() {
        let result = ScraperResult::minimal(
            "https://example.com",
            ScraperError::new(Phase::Timeout, "Scraping timed out after 60 seconds"),
        );
        assert_eq!(result.sections.len(), 1);
        assert_eq!(result.interactions.pages, vec!["https://example.com"]);
        assert_eq!(result.meta.language, "en");
        assert_eq!(result.errors[0].phase, Phase::Timeout);

        let value = serde_json::to_value(&result).unwrap();
        assert!(value["scrapedAt"].as_str().unwrap().ends_with('Z'));
        assert!(value["meta"]["canonical"].is_null());
        assert_eq!(value["errors"][0]["phase"], "timeout");
    }
}
