use crate::metadata::ArtworkMetadata;
use crate::ScraperError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// One page of search results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPage {
    /// Result items; each carries at least an `id`
    #[serde(default)]
    pub data: Vec<Value>,

    /// Token for the next page, if the source hands one out
    #[serde(rename = "paginationToken", default)]
    pub pagination_token: Option<String>,

    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}

impl SearchPage {
    /// Ids of the result items, in result order
    pub fn ids(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|item| match item.get("id")? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }
}

/// External data source the lookup strategies query
#[async_trait]
pub trait ArtworkSource: Send {
    /// Free-text search; `token` continues a previous search
    async fn search(&mut self, term: &str, token: Option<&str>) -> Result<SearchPage, ScraperError>;

    /// Full record of one item
    async fn painting(&mut self, id: &str) -> Result<ArtworkMetadata, ScraperError>;

    /// Raw HTML of a page on the source's site
    async fn page_html(&mut self, link: &str) -> Result<String, ScraperError>;
}
