//! Text, URL and DOM helpers shared by the scorer, segmenter and metadata extractor

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// Cap on a section's serialized markup
pub const RAW_HTML_LIMIT: usize = 2000;

/// Appended to markup cut at [`RAW_HTML_LIMIT`]
pub const ELLIPSIS: &str = " ...";

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Join text chunks with single spaces, collapsing all whitespace runs
pub fn join_text<'a>(chunks: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for chunk in chunks {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(chunk);
    }
    WHITESPACE.replace_all(&out, " ").into_owned()
}

/// Detach every element matching `selector` so it no longer contributes text
/// or markup. Returns how many matches were removed.
pub fn detach_matching(doc: &mut Html, selector: &Selector) -> usize {
    let ids: Vec<_> = doc.root_element().select(selector).map(|el| el.id()).collect();
    for id in &ids {
        if let Some(mut node) = doc.tree.get_mut(*id) {
            node.detach();
        }
    }
    ids.len()
}

/// Whitespace-normalised visible text of an element
pub fn element_text(el: ElementRef<'_>) -> String {
    join_text(el.text())
}

/// Byte offset of the `n`th char, or the string length
fn char_boundary(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// First `max` chars of `s`
pub fn truncate_chars(s: &str, max: usize) -> &str {
    &s[..char_boundary(s, max)]
}

/// Cut serialized markup to at most `max` chars (plus [`ELLIPSIS`]).
///
/// When a closing tag starts within the last 20% of the budget the cut lands
/// right after it (or right before it if its `>` falls past the budget).
pub fn truncate_html(html: &str, max: usize) -> (String, bool) {
    if html.chars().count() <= max {
        return (html.to_string(), false);
    }

    let cut = char_boundary(html, max);
    let floor = char_boundary(html, max * 4 / 5);
    let head = &html[..cut];

    let end = match head.rfind("</") {
        Some(open) if open >= floor => match head[open..].find('>') {
            Some(close) => open + close + 1,
            None => open,
        },
        _ => cut,
    };

    (format!("{}{}", &html[..end], ELLIPSIS), true)
}

/// Human-readable label from the leading words of `text`
pub fn label_from_text(text: &str, max_words: usize, max_chars: usize) -> String {
    let label = text
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ");

    if label.chars().count() <= max_chars {
        return label;
    }

    let head = truncate_chars(&label, max_chars);
    match head.rfind(' ') {
        Some(i) => head[..i].to_string(),
        None => head.to_string(),
    }
}

/// Whether `url` is an absolute http(s) URL
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Resolve `href` against `base`, keeping only http(s) results
pub fn absolute_http_url(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_text() {
        let chunks = ["  Hello\n", "", "  world  ", "\t again"];
        assert_eq!(join_text(chunks), "Hello world again");
        assert_eq!(join_text(["multi   space\n\ninside"]), "multi space inside");
        assert_eq!(join_text(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_detach_matching() {
        let mut doc = Html::parse_document(
            "<body><p>keep</p><script>var x = 1;</script><style>p {}</style></body>",
        );
        let sel = Selector::parse("script, style").unwrap();
        assert_eq!(detach_matching(&mut doc, &sel), 2);
        assert_eq!(element_text(doc.root_element()), "keep");
        assert!(!doc.root_element().html().contains("script"));
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_truncate_html_short_is_exact() {
        let html = "<div><p>short</p></div>";
        let (raw, truncated) = truncate_html(html, RAW_HTML_LIMIT);
        assert_eq!(raw, html);
        assert!(!truncated);

        let exact = "x".repeat(RAW_HTML_LIMIT);
        let (raw, truncated) = truncate_html(&exact, RAW_HTML_LIMIT);
        assert_eq!(raw, exact);
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_html_breaks_at_closing_tag() {
        // closing tag ends at char 1900, inside the last 20% of the budget
        let mut html = format!("<div>{}</p>", "a".repeat(1890));
        html.push_str(&"b".repeat(500));
        let (raw, truncated) = truncate_html(&html, RAW_HTML_LIMIT);
        assert!(truncated);
        assert!(raw.ends_with("</p> ..."));
        assert_eq!(raw.chars().count(), 1899 + ELLIPSIS.len());
    }

    #[test]
    fn test_truncate_html_hard_cut_without_late_tag() {
        let html = format!("<p>x</p>{}", "y".repeat(3000));
        let (raw, truncated) = truncate_html(&html, RAW_HTML_LIMIT);
        assert!(truncated);
        assert_eq!(raw.chars().count(), RAW_HTML_LIMIT + ELLIPSIS.len());
    }

    #[test]
    fn test_truncate_html_split_closing_tag() {
        // "</section>" starts inside the budget but its '>' lies beyond it
        let html = format!("{}</section>{}", "z".repeat(1995), "q".repeat(100));
        let (raw, truncated) = truncate_html(&html, RAW_HTML_LIMIT);
        assert!(truncated);
        assert_eq!(raw, format!("{}{}", "z".repeat(1995), ELLIPSIS));
    }

    #[test]
    fn test_label_from_text() {
        assert_eq!(
            label_from_text("one two three four five six seven eight", 7, 60),
            "one two three four five six seven"
        );
        let long = "Supercalifragilistic expialidocious words keep going past the sixty char limit";
        let label = label_from_text(long, 7, 60);
        assert!(label.chars().count() <= 60);
        assert!(long.starts_with(&label));
        assert!(!label.ends_with(' '));
        assert_eq!(label_from_text("", 7, 60), "");
    }

    #[test]
    fn test_absolute_http_url() {
        let base = Url::parse("https://example.com/docs/page").unwrap();
        assert_eq!(
            absolute_http_url(Some(&base), "/about"),
            Some("https://example.com/about".to_string())
        );
        assert_eq!(
            absolute_http_url(Some(&base), "next"),
            Some("https://example.com/docs/next".to_string())
        );
        assert_eq!(
            absolute_http_url(Some(&base), "https://other.org/x"),
            Some("https://other.org/x".to_string())
        );
        assert_eq!(absolute_http_url(Some(&base), "mailto:a@b.c"), None);
        assert_eq!(absolute_http_url(Some(&base), "javascript:void(0)"), None);
        assert_eq!(absolute_http_url(Some(&base), "  "), None);
        assert_eq!(absolute_http_url(None, "/relative"), None);
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://x"));
        assert!(!is_http_url("example.com"));
    }
}
