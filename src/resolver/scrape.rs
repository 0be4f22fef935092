//! HTML extraction for YouTube pages.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Suffix YouTube appends to every page title
pub const TITLE_SUFFIX: &str = " - YouTube";

fn external_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#""externalId":"(.*?)""#).expect("externalId pattern is valid")
    })
}

/// Page title with the YouTube suffix removed
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document.select(&selector).next()?;

    let text: String = title.text().collect();
    let text = text.replace(TITLE_SUFFIX, "").trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Channel id embedded in a channel page's bootstrap data.
///
/// Only `<script>` bodies are searched; the first `"externalId"` wins.
pub fn channel_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script").ok()?;

    document.select(&selector).find_map(|script| {
        let body: String = script.text().collect();
        if !body.contains("externalId") {
            return None;
        }
        external_id_pattern()
            .captures(&body)
            .map(|caps| caps[1].to_string())
            .filter(|id| !id.is_empty())
    })
}
