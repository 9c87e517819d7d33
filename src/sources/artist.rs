//! Artist scraper: works from the artist page, a description from the
//! encyclopedia and structured metadata from the knowledge base

use super::{ScrapeSession, SessionState};
use crate::config::{ArtistConfig, Config};
use crate::encyclopedia::{EncyclopediaClient, WikipediaClient, WikipediaLink};
use crate::ident::Identifier;
use crate::knowledge::{KnowledgeBase, SparqlClient, DEFAULT_ARTIST_QUERY};
use crate::metadata::ArtistMetadata;
use crate::output::{write_link_list, ArtistArtifacts};
use crate::pacing::WaitScheduler;
use crate::pagination::{find_item_count, CarouselLayout, PaginationCollector, ScrollLayout};
use crate::session::{PageSession, WebDriverSession};
use crate::ScraperError;
use std::path::Path;
use std::sync::Arc;

/// Tracking suffix the index page appends to artist links
pub const ARTIST_LINK_SUFFIX: &str = "?categoryId=artist";

/// Everything gathered about one artist
#[derive(Debug, Clone)]
pub struct ArtistInformation {
    pub works: Vec<String>,
    pub description: String,
    pub metadata: ArtistMetadata,
}

/// Scraper for artist entity pages
pub struct ArtistScraper {
    session: ScrapeSession,
    page: Box<dyn PageSession>,
    encyclopedia: Box<dyn EncyclopediaClient>,
    knowledge: Box<dyn KnowledgeBase>,
    collector: PaginationCollector,
    config: ArtistConfig,
}

impl ArtistScraper {
    /// Starts a browser session and connects to the public encyclopedia and
    /// knowledge base
    pub async fn connect(config: &Config) -> Result<Self, ScraperError> {
        let page = WebDriverSession::start(&config.googleart.webdriver_url, &config.googleart.browser)
            .await?;
        let template = config
            .artist
            .sparql_query
            .as_deref()
            .unwrap_or(DEFAULT_ARTIST_QUERY);
        let knowledge = SparqlClient::new(&config.artist.sparql_endpoint, template)?;

        Self::new(
            config,
            Box::new(page),
            Box::new(WikipediaClient::new()?),
            Box::new(knowledge),
            Arc::new(WaitScheduler::new()),
        )
    }

    pub fn new(
        config: &Config,
        page: Box<dyn PageSession>,
        encyclopedia: Box<dyn EncyclopediaClient>,
        knowledge: Box<dyn KnowledgeBase>,
        scheduler: Arc<WaitScheduler>,
    ) -> Result<Self, ScraperError> {
        let min_wait = config.artist_min_wait();
        let session = ScrapeSession::from_config(&config.scraper, min_wait, Arc::clone(&scheduler))?;
        let collector = PaginationCollector::new(
            scheduler,
            min_wait,
            config.artist.stall_limit,
            config.artist.latency_scale,
        )?;

        Ok(Self {
            session,
            page,
            encyclopedia,
            knowledge,
            collector,
            config: config.artist.clone(),
        })
    }

    pub fn session(&self) -> &ScrapeSession {
        &self.session
    }

    /// Makes `link` the current artist
    ///
    /// With skip-existing on, an artist whose three files are already saved
    /// ends up [`SessionState::Skipped`].
    pub fn load_link(&mut self, link: &str) -> Result<SessionState, ScraperError> {
        if self.session.current_link() == Some(link) {
            return Ok(self.session.state());
        }

        let artist = Identifier::for_artist(link)?;
        self.session.set_link(link);
        if self.session.store().artist_complete(&artist) {
            tracing::info!("Skipping {}: output already present", link);
            self.session.set_state(SessionState::Skipped);
        }
        Ok(self.session.state())
    }

    /// Links to every work shown in the artist's works carousel
    ///
    /// # Errors
    ///
    /// `NotFound` when the page has no works section or it lists no works.
    pub async fn get_artist_works(&mut self) -> Result<Vec<String>, ScraperError> {
        self.session.open_page(self.page.as_mut()).await?;
        let link = self.session.link()?.to_string();

        let heading = self.config.works_heading.clone();
        let section = self.config.works_section.clone();
        let container = self
            .session
            .retry()
            .run_with("works section", self.page.as_mut(), |page| {
                let heading = heading.clone();
                let section = section.clone();
                Box::pin(async move {
                    let heading = page.require(None, &heading).await?;
                    page.require(Some(&heading), &section).await
                })
            })
            .await
            .map_err(|e| match e {
                ScraperError::RetriesExhausted { .. } => {
                    ScraperError::NotFound(format!("no works section on {}", link))
                }
                other => other,
            })?;

        let target =
            find_item_count(self.page.as_mut(), &container, &self.config.count_indicator).await?;
        if target.is_none() {
            tracing::debug!("No item count on {}, relying on stalls", link);
        }

        let layout = CarouselLayout::from_config(&self.config);
        let report = self
            .collector
            .collect(self.page.as_mut(), &container, &layout, target)
            .await?;

        if report.items.is_empty() {
            return Err(ScraperError::NotFound(format!("no works listed on {}", link)));
        }
        tracing::info!("Found {} works on {}", report.items.len(), link);
        Ok(report.items)
    }

    /// Encyclopedia article linked from the artist page, if any
    pub async fn wikipedia_link(&mut self) -> Result<Option<WikipediaLink>, ScraperError> {
        self.session.open_page(self.page.as_mut()).await?;

        let Some(element) = self.page.find(None, &self.config.wikipedia_link).await? else {
            return Ok(None);
        };
        match self.page.attribute(&element, "href").await? {
            Some(href) => WikipediaLink::parse(&href).map(Some),
            None => Ok(None),
        }
    }

    /// Lead section of the artist's encyclopedia article
    pub async fn get_artist_description(&mut self) -> Result<String, ScraperError> {
        let article = self.required_article().await?;
        let encyclopedia = self.encyclopedia.as_ref();
        let article = &article;

        self.session
            .retry()
            .run("artist description", move || encyclopedia.description(article))
            .await
    }

    /// Knowledge-base metadata of the artist
    pub async fn get_artist_metadata(&mut self) -> Result<ArtistMetadata, ScraperError> {
        let article = self.required_article().await?;
        let encyclopedia = self.encyclopedia.as_ref();
        let knowledge = self.knowledge.as_ref();
        let article = &article;
        let retry = self.session.retry();

        let entity = retry
            .run("entity lookup", move || encyclopedia.entity_id(article))
            .await?;
        let entity = entity.as_str();
        retry
            .run("artist metadata", move || knowledge.artist_metadata(entity))
            .await
    }

    /// Works, description and metadata of the loaded artist
    ///
    /// An artist without works is an error; a missing description or
    /// metadata document is recorded as empty.
    pub async fn get_artist_information(&mut self) -> Result<ArtistInformation, ScraperError> {
        let works = self.get_artist_works().await?;

        let description = match self.get_artist_description().await {
            Ok(description) => description,
            Err(ScraperError::NotFound(reason)) => {
                tracing::warn!("No description: {}", reason);
                String::new()
            }
            Err(e) => return Err(e),
        };

        let metadata = match self.get_artist_metadata().await {
            Ok(metadata) => metadata,
            Err(ScraperError::NotFound(reason)) => {
                tracing::warn!("No knowledge-base metadata: {}", reason);
                ArtistMetadata::new()
            }
            Err(e) => return Err(e),
        };

        self.session.set_state(SessionState::MetadataResolved);
        Ok(ArtistInformation {
            works,
            description,
            metadata,
        })
    }

    /// Gathers and saves everything about `link`
    ///
    /// Returns `None` when the artist was skipped.
    pub async fn save_artist_information(
        &mut self,
        link: &str,
    ) -> Result<Option<ArtistArtifacts>, ScraperError> {
        if self.load_link(link)? == SessionState::Skipped {
            return Ok(None);
        }

        let artist = Identifier::for_artist(link)?;
        let info = self.get_artist_information().await?;
        let files = self.session.store().write_artist(
            &artist,
            &info.works,
            &info.description,
            &info.metadata,
        )?;
        Ok(Some(files))
    }

    /// Links to every artist on the index page, optionally written to
    /// `output` one per line
    pub async fn collect_artist_index(&mut self, output: Option<&Path>) -> Result<Vec<String>, ScraperError> {
        let index = self.config.index_page.clone();
        self.session.open_url(self.page.as_mut(), &index).await?;

        let layout = ScrollLayout {
            items: self.config.index_items.clone(),
            link_attribute: "href".to_string(),
            strip: Some(ARTIST_LINK_SUFFIX.to_string()),
        };
        let links = self
            .collector
            .scroll_until_stable(self.page.as_mut(), &layout, self.config.max_scrolls)
            .await?;

        if let Some(path) = output {
            write_link_list(path, &links)?;
            tracing::info!("Wrote {} artist links to {}", links.len(), path.display());
        }
        Ok(links)
    }

    pub async fn close(&mut self) -> Result<(), ScraperError> {
        self.page.close().await
    }

    async fn required_article(&mut self) -> Result<WikipediaLink, ScraperError> {
        self.wikipedia_link().await?.ok_or_else(|| {
            ScraperError::NotFound(format!(
                "no encyclopedia article linked from {}",
                self.session.current_link().unwrap_or_default()
            ))
        })
    }
}
