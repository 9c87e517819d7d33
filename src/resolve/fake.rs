//! In-memory artwork source for unit tests

use super::{ArtworkSource, SearchPage};
use crate::metadata::ArtworkMetadata;
use crate::ScraperError;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

/// A painting record as the API returns it
pub(crate) fn painting(id: &str, artist: &str, work: &str) -> ArtworkMetadata {
    ArtworkMetadata::from_value(json!({
        "id": id,
        "artistUrl": artist,
        "url": work,
        "title": work.replace('-', " "),
        "image": format!("https://uploads.example.org/images/{}/{}.jpg", artist, work),
    }))
}

#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    pub paintings: HashMap<String, ArtworkMetadata>,
    pub searches: HashMap<(String, Option<String>), SearchPage>,
    pub pages: HashMap<String, String>,
    pub search_calls: Vec<(String, Option<String>)>,
    pub painting_calls: Vec<String>,
    pub page_calls: Vec<String>,
    /// Page fetches fail as if every retry had been used up
    pub page_failure: Option<String>,
}

impl FakeSource {
    pub fn add_painting(&mut self, record: ArtworkMetadata) {
        let id = record.get_str("id").unwrap_or_default();
        self.paintings.insert(id, record);
    }

    pub fn add_search(&mut self, term: &str, token: Option<&str>, page: SearchPage) {
        self.searches
            .insert((term.to_string(), token.map(str::to_string)), page);
    }
}

#[async_trait]
impl ArtworkSource for FakeSource {
    async fn search(&mut self, term: &str, token: Option<&str>) -> Result<SearchPage, ScraperError> {
        let key = (term.to_string(), token.map(str::to_string));
        self.search_calls.push(key.clone());
        Ok(self.searches.get(&key).cloned().unwrap_or_default())
    }

    async fn painting(&mut self, id: &str) -> Result<ArtworkMetadata, ScraperError> {
        self.painting_calls.push(id.to_string());
        self.paintings
            .get(id)
            .cloned()
            .ok_or_else(|| ScraperError::NotFound(format!("painting {}", id)))
    }

    async fn page_html(&mut self, link: &str) -> Result<String, ScraperError> {
        self.page_calls.push(link.to_string());
        if let Some(reason) = &self.page_failure {
            return Err(ScraperError::RetriesExhausted {
                attempts: 3,
                last_error: reason.clone(),
            });
        }
        self.pages
            .get(link)
            .cloned()
            .ok_or_else(|| ScraperError::TransientRemote(format!("{} did not load", link)))
    }
}
