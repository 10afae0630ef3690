//! Page-level metadata: title, description, language, canonical URL

use crate::extract::{absolute_http_url, join_text};
use crate::model::Metadata;
use scraper::{Html, Selector};
use url::Url;

/// Extract metadata from markup. Never fails; absent fields keep their defaults.
pub fn extract(html: &str, url: &str) -> Metadata {
    let doc = Html::parse_document(html);
    let base = Url::parse(url).ok();

    let title = select_text(&doc, "title")
        .or_else(|| select_attr(&doc, "meta[property='og:title']", "content"))
        .unwrap_or_default();

    let description = select_attr(&doc, "meta[name='description']", "content")
        .or_else(|| select_attr(&doc, "meta[property='og:description']", "content"))
        .unwrap_or_default();

    let language = doc
        .root_element()
        .value()
        .attr("lang")
        .and_then(primary_subtag)
        .unwrap_or_else(|| "en".to_string());

    let canonical = select_attr(&doc, "link[rel='canonical']", "href")
        .and_then(|href| absolute_http_url(base.as_ref(), &href));

    Metadata {
        title,
        description,
        language,
        canonical,
    }
}

fn primary_subtag(lang: &str) -> Option<String> {
    lang.trim()
        .split(['-', '_'])
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
}

fn select_text(doc: &Html, sel: &str) -> Option<String> {
    let selector = Selector::parse(sel).ok()?;
    doc.root_element()
        .select(&selector)
        .next()
        .map(|el| join_text(el.text()))
        .filter(|s| !s.is_empty())
}

fn select_attr(doc: &Html, sel: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(sel).ok()?;
    doc.root_element()
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
