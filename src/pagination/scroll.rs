use super::carousel::PaginationCollector;
use crate::session::{PageSession, Query};
use crate::ScraperError;
use indexmap::IndexSet;
use serde_json::Value;

pub const SCROLL_HEIGHT_SCRIPT: &str = "return document.body.scrollHeight";
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Items of an infinitely scrolling page
#[derive(Debug, Clone)]
pub struct ScrollLayout {
    pub items: Query,
    pub link_attribute: String,
    /// Tracking suffix removed from every collected link
    pub strip: Option<String>,
}

impl PaginationCollector {
    /// Scrolls to the bottom until the page height stops growing, then reads
    /// every item link
    ///
    /// `max_scrolls` bounds the loop for pages that never stop growing.
    pub async fn scroll_until_stable(
        &self,
        session: &mut dyn PageSession,
        layout: &ScrollLayout,
        max_scrolls: u32,
    ) -> Result<Vec<String>, ScraperError> {
        let mut last_height = page_height(session).await?;
        let mut scrolls = 0u32;
        let mut settled = false;

        while scrolls < max_scrolls {
            session.execute(SCROLL_TO_BOTTOM_SCRIPT, &[]).await?;
            scrolls += 1;
            self.scheduler().sleep(self.min_wait(), None).await?;

            let height = page_height(session).await?;
            tracing::debug!("Scroll {}: page height {}", scrolls, height);
            if height == last_height {
                settled = true;
                break;
            }
            last_height = height;
        }

        if !settled {
            tracing::warn!("Stopped scrolling after {} steps", max_scrolls);
        }

        let mut links = IndexSet::new();
        for element in session.find_all(None, &layout.items).await? {
            let Some(link) = session.attribute(&element, &layout.link_attribute).await? else {
                continue;
            };
            let link = match &layout.strip {
                Some(suffix) => link.replace(suffix.as_str(), ""),
                None => link,
            };
            links.insert(link);
        }

        tracing::info!("Collected {} links after {} scrolls", links.len(), scrolls);
        Ok(links.into_iter().collect())
    }
}

async fn page_height(session: &mut dyn PageSession) -> Result<i64, ScraperError> {
    match session.execute(SCROLL_HEIGHT_SCRIPT, &[]).await? {
        Value::Number(n) => Ok(n.as_f64().map(|h| h as i64).unwrap_or_default()),
        other => Err(ScraperError::TransientRemote(format!(
            "page height is not a number: {}",
            other
        ))),
    }
}
