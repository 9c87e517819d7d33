//! Google Arts & Culture scraper driven through a page session

use super::{ArtScraper, ScrapeSession};
use crate::config::{Config, GoogleArtConfig};
use crate::ident::{path_segments, Identifier};
use crate::metadata::{ArtworkMetadata, GOOGLEART_FIELDS};
use crate::pacing::WaitScheduler;
use crate::session::{html_text, PageSession, Query, WebDriverSession, KEY_ESCAPE};
use crate::ScraperError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use std::sync::Arc;
use url::Url;

/// Name/value pairs of a metadata list
///
/// Every `<li>` is expected to start with a `<span>` naming the field
/// (`<li><span>Date Created:</span> 1889</li>`). Names are lower-cased and
/// lose their trailing colon; items without a name are ignored.
pub fn parse_metadata_list(fragment: &str) -> Vec<(String, String)> {
    let html = Html::parse_fragment(fragment);
    let (Ok(item_selector), Ok(name_selector)) = (Selector::parse("li"), Selector::parse("span"))
    else {
        return Vec::new();
    };

    let mut fields = Vec::new();
    for item in html.select(&item_selector) {
        let Some(label) = item.select(&name_selector).next() else {
            continue;
        };
        let label: String = label.text().collect();
        let name = label.trim().trim_end_matches(':').trim().to_lowercase();
        if name.is_empty() {
            continue;
        }

        let text: String = item.text().collect();
        let value = text.strip_prefix(label.as_str()).unwrap_or(&text).trim();
        fields.push((name, value.to_string()));
    }
    fields
}

/// Last path segment of an artwork link, the id the page keys its blocks by
fn paint_id(link: &str) -> Result<String, ScraperError> {
    let url = Url::parse(link)?;
    path_segments(&url)
        .pop()
        .ok_or_else(|| ScraperError::InvalidParameter(format!("artwork link has no id: {}", link)))
}

/// Artwork scraper for artsandculture.google.com asset pages
pub struct GoogleArtScraper {
    session: ScrapeSession,
    page: Box<dyn PageSession>,
    config: GoogleArtConfig,
}

impl GoogleArtScraper {
    /// Starts a browser session on the configured WebDriver server
    pub async fn connect(config: &Config) -> Result<Self, ScraperError> {
        let page = WebDriverSession::start(&config.googleart.webdriver_url, &config.googleart.browser)
            .await?;
        Self::new(config, Box::new(page), Arc::new(WaitScheduler::new()))
    }

    /// Scraper driving `page`, which it owns until [`ArtScraper::close`]
    pub fn new(
        config: &Config,
        page: Box<dyn PageSession>,
        scheduler: Arc<WaitScheduler>,
    ) -> Result<Self, ScraperError> {
        let session =
            ScrapeSession::from_config(&config.scraper, config.googleart_min_wait(), scheduler)?;
        Ok(Self {
            session,
            page,
            config: config.googleart.clone(),
        })
    }

    /// Free-text description of the loaded artwork
    ///
    /// Pages without a description put the metadata block where the
    /// description would be; both cases give an empty text.
    pub async fn get_main_text(&mut self) -> Result<String, ScraperError> {
        self.session.open_page(self.page.as_mut()).await?;
        self.session.pace(false).await?;

        let Some(block) = self.page.find(None, &self.config.main_text).await? else {
            return Ok(String::new());
        };
        let id = self.page.attribute(&block, "id").await?.unwrap_or_default();
        if id.starts_with(&self.config.metadata_prefix) {
            return Ok(String::new());
        }

        let inner = self.page.attribute(&block, "innerHTML").await?.unwrap_or_default();
        Ok(html_text(&inner))
    }
}

#[async_trait]
impl ArtScraper for GoogleArtScraper {
    fn session(&self) -> &ScrapeSession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut ScrapeSession {
        &mut self.session
    }

    fn compute_identifier(&self, link: &str) -> Result<Identifier, ScraperError> {
        Identifier::from_link(link)
    }

    async fn resolve_metadata(&mut self) -> Result<ArtworkMetadata, ScraperError> {
        let link = self.session.link()?.to_string();
        let id = paint_id(&link)?;

        let main_text = self.get_main_text().await?;

        let block = Query::xpath(format!(
            r#"//*[@id="{}{}"]"#,
            self.config.metadata_prefix, id
        ));
        let inner = self
            .session
            .retry()
            .run_with("metadata block", self.page.as_mut(), |page| {
                let block = block.clone();
                Box::pin(async move {
                    let element = page.require(None, &block).await?;
                    Ok(page.attribute(&element, "innerHTML").await?.unwrap_or_default())
                })
            })
            .await?;

        let mut metadata = ArtworkMetadata::new();
        metadata.insert("main_text", main_text);
        for (name, value) in parse_metadata_list(&inner) {
            metadata.insert(name, value);
        }
        metadata.insert("id", id);
        metadata.ensure_fields(GOOGLEART_FIELDS);

        tracing::debug!("Read {} metadata fields from {}", metadata.len(), link);
        Ok(metadata)
    }

    async fn image_suffix(&mut self) -> Result<String, ScraperError> {
        Ok(".png".to_string())
    }

    /// Opens the zoomed view, screenshots the image and closes the view
    async fn fetch_image(&mut self) -> Result<Vec<u8>, ScraperError> {
        self.session.open_page(self.page.as_mut()).await?;
        self.session.pace(true).await?;

        let image = self.config.image.clone();
        let body = self.config.page_body.clone();
        let scheduler = Arc::clone(self.session.scheduler());
        let min_wait = self.session.min_wait();

        let bytes = self
            .session
            .retry()
            .run_with("image capture", self.page.as_mut(), |page| {
                let image = image.clone();
                let body = body.clone();
                let scheduler = Arc::clone(&scheduler);
                Box::pin(async move {
                    let element = page.require(None, &image).await?;
                    page.click(&element).await?;

                    let captured = async {
                        scheduler.sleep(2.0 * min_wait, None).await?;
                        let element = page.require(None, &image).await?;
                        let bytes = page.capture(&element).await?;
                        scheduler.sleep(min_wait, None).await?;
                        Ok::<_, ScraperError>(bytes)
                    }
                    .await;

                    // The zoomed view must be closed before the next attempt clicks again
                    let dismissed = match page.require(None, &body).await {
                        Ok(body) => page.send_keys(&body, KEY_ESCAPE).await,
                        Err(e) => Err(e),
                    };

                    match (captured, dismissed) {
                        (Ok(bytes), Ok(())) => Ok(bytes),
                        (Ok(_), Err(e)) => Err(e),
                        (Err(e), dismissed) => {
                            if let Err(closing) = dismissed {
                                tracing::warn!("Could not close the zoomed image: {}", closing);
                            }
                            Err(e)
                        }
                    }
                })
            })
            .await?;

        Ok(bytes)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.page.close().await
    }
}
