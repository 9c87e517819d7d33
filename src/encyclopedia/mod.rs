//! Encyclopedia module
//!
//! Artist pages link to an encyclopedia article. This module reads the lead
//! section of that article and the knowledge-base entity the article is tied
//! to.

use crate::http::{build_http_client, check_status};
use crate::knowledge::is_entity_id;
use crate::ScraperError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// An article link split into language edition and title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikipediaLink {
    pub language: String,
    pub title: String,
}

impl WikipediaLink {
    /// Parses `https://<lang>.wikipedia.org/wiki/<Title>`
    pub fn parse(link: &str) -> Result<Self, ScraperError> {
        let url = Url::parse(link)?;
        let host = url.host_str().unwrap_or_default();
        let language = host.split('.').next().unwrap_or_default().to_string();

        let raw_title = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        let title = urlencoding::decode(raw_title)
            .map(|t| t.into_owned())
            .unwrap_or_else(|_| raw_title.to_string());

        if language.is_empty() || title.is_empty() {
            return Err(ScraperError::InvalidParameter(format!(
                "not an encyclopedia article link: {}",
                link
            )));
        }

        Ok(Self { language, title })
    }
}

/// Source of artist descriptions
#[async_trait]
pub trait EncyclopediaClient: Send + Sync {
    /// Plain text of the article's lead section
    async fn description(&self, article: &WikipediaLink) -> Result<String, ScraperError>;

    /// Knowledge-base entity id of the article's subject
    async fn entity_id(&self, article: &WikipediaLink) -> Result<String, ScraperError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    wikibase_item: Option<String>,
}

/// Client for the MediaWiki action API
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    client: Client,
    api_base: Option<String>,
}

impl WikipediaClient {
    /// Client addressing each language edition on its own host
    pub fn new() -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(60))?,
            api_base: None,
        })
    }

    /// Client sending every request to `api_base`, whatever the language
    pub fn with_api_base(api_base: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            api_base: Some(api_base.trim_end_matches('/').to_string()),
            ..Self::new()?
        })
    }

    fn endpoint(&self, language: &str) -> String {
        match &self.api_base {
            Some(base) => format!("{}/w/api.php", base),
            None => format!("https://{}.wikipedia.org/w/api.php", language),
        }
    }

    async fn page(&self, article: &WikipediaLink, params: &[(&str, &str)]) -> Result<ApiPage, ScraperError> {
        let response = self
            .client
            .get(self.endpoint(&article.language))
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("redirects", "1"),
                ("titles", article.title.as_str()),
            ])
            .query(params)
            .send()
            .await?;
        let body: ApiResponse = check_status(response)?.json().await?;

        body.query
            .and_then(|q| q.pages.into_iter().next())
            .filter(|page| !page.missing)
            .ok_or_else(|| {
                ScraperError::NotFound(format!(
                    "no {} encyclopedia article titled {}",
                    article.language, article.title
                ))
            })
    }
}

#[async_trait]
impl EncyclopediaClient for WikipediaClient {
    async fn description(&self, article: &WikipediaLink) -> Result<String, ScraperError> {
        let page = self
            .page(
                article,
                &[("prop", "extracts"), ("exintro", "1"), ("explaintext", "1")],
            )
            .await?;

        let extract = page.extract.unwrap_or_default();
        Ok(urlencoding::decode(&extract)
            .map(|text| text.into_owned())
            .unwrap_or(extract))
    }

    async fn entity_id(&self, article: &WikipediaLink) -> Result<String, ScraperError> {
        let page = self.page(article, &[("prop", "pageprops")]).await?;

        page.pageprops
            .and_then(|props| props.wikibase_item)
            .filter(|id| is_entity_id(id))
            .ok_or_else(|| {
                ScraperError::NotFound(format!("article {} has no knowledge-base entity", article.title))
            })
    }
}
