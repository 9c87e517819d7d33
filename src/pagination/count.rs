use crate::session::{ElementRef, PageSession, Query};
use crate::ScraperError;
use regex::Regex;
use std::sync::LazyLock;

static COUNT_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("count pattern is valid"));

/// Reads the number out of indicator text such as "1,204 items"
///
/// Text without the word "items" carries no count.
pub fn parse_item_count(text: &str) -> Option<usize> {
    if !text.contains("items") {
        return None;
    }

    let digits = COUNT_DIGITS.find(text)?.as_str().replace(',', "");
    digits.parse().ok()
}

/// First item count shown by an element matching `indicator` inside `scope`
///
/// `None` means the page shows no count and the total is unknown.
pub async fn find_item_count(
    session: &mut dyn PageSession,
    scope: &ElementRef,
    indicator: &Query,
) -> Result<Option<usize>, ScraperError> {
    for element in session.find_all(Some(scope), indicator).await? {
        let text = session.text(&element).await?;
        if let Some(count) = parse_item_count(&text) {
            tracing::debug!("Page reports {} items", count);
            return Ok(Some(count));
        }
    }
    Ok(None)
}
