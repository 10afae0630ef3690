//! Section type classification
//!
//! An ordered rule table, first match wins. Each rule looks at the lowercased
//! label and text plus the extracted content counts.

use super::content::SectionDraft;
use crate::model::{Section, SectionType};

const CURRENCY_SYMBOLS: [char; 5] = ['$', '€', '£', '¥', '₹'];

struct Signals<'a> {
    label: String,
    text: String,
    draft: &'a SectionDraft,
}

impl<'a> Signals<'a> {
    fn new(draft: &'a SectionDraft) -> Self {
        Self {
            label: draft.label.to_lowercase(),
            text: draft.content.text.to_lowercase(),
            draft,
        }
    }

    fn label_has(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.label.contains(w))
    }
}

type Rule = (SectionType, fn(&Signals<'_>) -> bool);

const RULES: [Rule; 7] = [
    (SectionType::Hero, is_hero),
    (SectionType::Nav, is_nav),
    (SectionType::Footer, is_footer),
    (SectionType::List, is_list),
    (SectionType::Grid, is_grid),
    (SectionType::Faq, is_faq),
    (SectionType::Pricing, is_pricing),
];

fn is_hero(s: &Signals<'_>) -> bool {
    s.label_has(&["hero", "banner", "welcome"]) && !s.draft.content.images.is_empty()
}

fn is_nav(s: &Signals<'_>) -> bool {
    s.label_has(&["nav", "menu"])
}

fn is_footer(s: &Signals<'_>) -> bool {
    s.label_has(&["footer", "copyright"]) || s.text.contains("contact us")
}

fn is_list(s: &Signals<'_>) -> bool {
    s.draft.content.lists.len() > 1
}

fn is_grid(s: &Signals<'_>) -> bool {
    s.draft.content.images.len() > 4
}

fn is_faq(s: &Signals<'_>) -> bool {
    s.label_has(&["faq", "question", "answer"])
        && (s.text.contains('?') || s.text.contains("q:") || s.text.contains("a:"))
}

fn is_pricing(s: &Signals<'_>) -> bool {
    s.label_has(&["pricing", "plan", "price"]) && s.text.contains(CURRENCY_SYMBOLS)
}

/// Type for a draft; `section` when no rule matches
pub fn classify(draft: &SectionDraft) -> SectionType {
    let signals = Signals::new(draft);
    RULES
        .iter()
        .find(|(_, matches)| matches(&signals))
        .map(|(kind, _)| *kind)
        .unwrap_or(SectionType::Section)
}

/// Freeze a draft into its final, typed section
pub fn finalize(draft: SectionDraft) -> Section {
    let kind = classify(&draft);
    Section {
        id: draft.id,
        kind,
        label: draft.label,
        source_url: draft.source_url,
        content: draft.content,
        raw_html: draft.raw_html,
        truncated: draft.truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentData, Image};

    fn draft(label: &str, text: &str) -> SectionDraft {
        SectionDraft {
            id: "section-0".to_string(),
            label: label.to_string(),
            source_url: "https://example.com".to_string(),
            content: ContentData {
                text: text.to_string(),
                ..ContentData::default()
            },
            raw_html: String::new(),
            truncated: false,
        }
    }

    fn images(n: usize) -> Vec<Image> {
        (0..n)
            .map(|i| Image {
                src: format!("https://example.com/{i}.png"),
                alt: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_hero_requires_images() {
        let mut d = draft("Welcome to Acme", "Build faster");
        assert_eq!(classify(&d), SectionType::Section);
        d.content.images = images(1);
        assert_eq!(classify(&d), SectionType::Hero);
    }

    #[test]
    fn test_nav_and_footer() {
        assert_eq!(classify(&draft("Main Menu", "Home About")), SectionType::Nav);
        assert_eq!(classify(&draft("Copyright 2025", "All rights")), SectionType::Footer);
        assert_eq!(
            classify(&draft("Reach out", "Feel free to Contact Us anytime")),
            SectionType::Footer
        );
    }

    #[test]
    fn test_priority_order() {
        // nav beats footer
        assert_eq!(classify(&draft("Footer navigation", "x")), SectionType::Nav);

        // footer beats list
        let mut d = draft("Links", "contact us");
        d.content.lists = vec![vec!["a".into()], vec!["b".into()]];
        assert_eq!(classify(&d), SectionType::Footer);

        // list beats grid
        let mut d = draft("Gallery", "photos");
        d.content.lists = vec![vec!["a".into()], vec!["b".into()]];
        d.content.images = images(6);
        assert_eq!(classify(&d), SectionType::List);
    }

    #[test]
    fn test_list_and_grid_thresholds() {
        let mut d = draft("Things", "stuff");
        d.content.lists = vec![vec!["a".into()]];
        assert_eq!(classify(&d), SectionType::Section);
        d.content.lists.push(vec!["b".into()]);
        assert_eq!(classify(&d), SectionType::List);

        let mut d = draft("Gallery", "photos");
        d.content.images = images(4);
        assert_eq!(classify(&d), SectionType::Section);
        d.content.images = images(5);
        assert_eq!(classify(&d), SectionType::Grid);
    }

    #[test]
    fn test_faq_needs_question_markers() {
        assert_eq!(classify(&draft("FAQ", "Shipping takes two days")), SectionType::Section);
        assert_eq!(classify(&draft("FAQ", "How long is shipping?")), SectionType::Faq);
        assert_eq!(
            classify(&draft("Common Questions", "Q: shipping A: two days")),
            SectionType::Faq
        );
    }

    #[test]
    fn test_pricing_needs_currency() {
        assert_eq!(classify(&draft("Pricing", "Contact sales")), SectionType::Section);
        assert_eq!(classify(&draft("Pricing", "Pro plan $29/mo")), SectionType::Pricing);
        assert_eq!(classify(&draft("Choose a plan", "€9 per month")), SectionType::Pricing);
    }

    #[test]
    fn test_finalize_keeps_fields() {
        let section = finalize(draft("Main Menu", "Home"));
        assert_eq!(section.id, "section-0");
        assert_eq!(section.kind, SectionType::Nav);
        assert_eq!(section.label, "Main Menu");
    }
}
