//! Per-source scrapers
//!
//! This module composes the engine into scrapers for concrete sites:
//! - A shared session helper owning pacing, retry, the cache and the store
//! - The [`ArtScraper`] capability implemented once per artwork source
//! - The artist scraper for works, descriptions and knowledge-base metadata

mod artist;
mod googleart;
mod wikiart;

pub use artist::{ArtistInformation, ArtistScraper, ARTIST_LINK_SUFFIX};
pub use googleart::{parse_metadata_list, GoogleArtScraper};
pub use wikiart::{image_suffix, WikiArtClient, WikiArtScraper};

use crate::cache::ArtworkCache;
use crate::config::ScraperConfig;
use crate::ident::Identifier;
use crate::metadata::ArtworkMetadata;
use crate::output::{ArtifactStore, WriteOutcome};
use crate::pacing::{RetryExecutor, WaitScheduler};
use crate::session::PageSession;
use crate::ScraperError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Where a scraper stands with its current link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LinkLoaded,
    MetadataResolved,
    ImageFetched,
    /// Complete output already exists; nothing will be fetched
    Skipped,
}

/// State shared by every scraper: pacing, retry, cache, store and the
/// current link
pub struct ScrapeSession {
    scheduler: Arc<WaitScheduler>,
    retry: RetryExecutor,
    cache: ArtworkCache,
    store: ArtifactStore,
    min_wait: f64,
    link: Option<String>,
    state: SessionState,
    last_request: Option<Instant>,
    page_url: Option<String>,
}

impl ScrapeSession {
    pub fn new(
        scheduler: Arc<WaitScheduler>,
        store: ArtifactStore,
        min_wait: f64,
        max_retries: u32,
    ) -> Result<Self, ScraperError> {
        let retry = RetryExecutor::new(Arc::clone(&scheduler), max_retries, min_wait)?;

        Ok(Self {
            scheduler,
            retry,
            cache: ArtworkCache::new(),
            store,
            min_wait,
            link: None,
            state: SessionState::Idle,
            last_request: None,
            page_url: None,
        })
    }

    /// Session writing to the configured output directory, paced at `min_wait`
    pub fn from_config(
        config: &ScraperConfig,
        min_wait: f64,
        scheduler: Arc<WaitScheduler>,
    ) -> Result<Self, ScraperError> {
        let store = ArtifactStore::new(config.output_dir.clone(), config.skip_existing);
        Self::new(scheduler, store, min_wait, config.max_retries)
    }

    /// The loaded link
    pub fn link(&self) -> Result<&str, ScraperError> {
        self.link.as_deref().ok_or_else(|| {
            ScraperError::InvalidParameter("load a link or supply one first".to_string())
        })
    }

    pub fn current_link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Replaces the loaded link; the cache keeps its entry until a fetch
    /// for the new link replaces it
    pub fn set_link(&mut self, link: &str) {
        self.link = Some(link.to_string());
        self.state = SessionState::LinkLoaded;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn set_state(&mut self, state: SessionState) {
        if state != self.state {
            tracing::trace!("Session state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    pub fn cache_mut(&mut self) -> &mut ArtworkCache {
        &mut self.cache
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    pub fn scheduler(&self) -> &Arc<WaitScheduler> {
        &self.scheduler
    }

    pub fn min_wait(&self) -> f64 {
        self.min_wait
    }

    /// Waits out the residual gap since the last request
    ///
    /// With `update` the current time becomes the new reference point;
    /// without it, reads that piggyback on an already loaded page do not
    /// push the next request further out.
    pub async fn pace(&mut self, update: bool) -> Result<Duration, ScraperError> {
        let slept = self
            .scheduler
            .enforce_gap(self.last_request, self.min_wait, None)
            .await?;
        if update {
            self.last_request = Some(Instant::now());
        }
        Ok(slept)
    }

    /// Points `page` at the loaded link unless it is already there
    pub async fn open_page(&mut self, page: &mut dyn PageSession) -> Result<(), ScraperError> {
        let link = self.link()?.to_string();
        self.open_url(page, &link).await
    }

    /// Points `page` at `url` unless it is already there
    pub async fn open_url(&mut self, page: &mut dyn PageSession, url: &str) -> Result<(), ScraperError> {
        if self.page_url.as_deref() == Some(url) {
            return Ok(());
        }

        self.pace(true).await?;
        let label = format!("loading {}", url);
        self.retry
            .run_with(&label, page, |page| {
                let url = url.to_string();
                Box::pin(async move { page.navigate(&url).await })
            })
            .await?;

        tracing::debug!("Loaded {}", url);
        self.page_url = Some(url.to_string());
        Ok(())
    }
}

/// One artwork source
///
/// Implementors supply identity, metadata resolution and image bytes; link
/// handling, caching, skip-existing and persistence are shared.
#[async_trait]
pub trait ArtScraper: Send {
    fn session(&self) -> &ScrapeSession;

    fn session_mut(&mut self) -> &mut ScrapeSession;

    /// Identifier under which the artifacts of `link` are stored
    fn compute_identifier(&self, link: &str) -> Result<Identifier, ScraperError>;

    /// Fetches the metadata of the loaded link from the source
    async fn resolve_metadata(&mut self) -> Result<ArtworkMetadata, ScraperError>;

    /// File suffix of the loaded artwork's image, dot included
    async fn image_suffix(&mut self) -> Result<String, ScraperError>;

    /// Fetches the image bytes of the loaded link
    async fn fetch_image(&mut self) -> Result<Vec<u8>, ScraperError>;

    /// Identifier of the loaded link
    fn identifier(&self) -> Result<Identifier, ScraperError> {
        self.compute_identifier(self.session().link()?)
    }

    /// Makes `link` the current link
    ///
    /// Loading the current link again changes nothing. When skip-existing is
    /// on and the metadata and image of the link are already saved, the
    /// session ends up [`SessionState::Skipped`].
    async fn load_link(&mut self, link: &str) -> Result<SessionState, ScraperError> {
        if self.session().current_link() == Some(link) {
            return Ok(self.session().state());
        }

        let id = self.compute_identifier(link)?;
        self.session_mut().set_link(link);

        if self.session().store().artwork_complete(&id) {
            tracing::info!("Skipping {}: output already present", link);
            self.session_mut().set_state(SessionState::Skipped);
        }
        Ok(self.session().state())
    }

    /// Metadata of `link`, or of the loaded link when `link` is `None`
    ///
    /// The record is fetched at most once per link; `extras` are merged into
    /// the returned copy only.
    async fn get_metadata(
        &mut self,
        link: Option<&str>,
        extras: Vec<(String, Value)>,
    ) -> Result<ArtworkMetadata, ScraperError> {
        if let Some(link) = link {
            self.load_link(link).await?;
        }
        let link = self.session().link()?.to_string();

        let mut cache = std::mem::take(self.session_mut().cache_mut());
        let result = cache.get_or_fetch(&link, || self.fetch_record(), extras).await;
        *self.session_mut().cache_mut() = cache;

        let metadata = result?;
        if self.session().state() == SessionState::LinkLoaded {
            self.session_mut().set_state(SessionState::MetadataResolved);
        }
        Ok(metadata)
    }

    /// Metadata saved by an earlier run when skip-existing allows it,
    /// otherwise a fresh resolution
    async fn fetch_record(&mut self) -> Result<ArtworkMetadata, ScraperError> {
        let id = self.identifier()?;
        let saved = {
            let store = self.session().store();
            if store.should_skip(&store.metadata_path(&id)) {
                store.read_artwork_metadata(&id)
            } else {
                None
            }
        };

        match saved {
            Some(metadata) => {
                tracing::debug!("Reusing saved metadata of {}", id);
                Ok(metadata)
            }
            None => self.resolve_metadata().await,
        }
    }

    /// Writes the metadata of the loaded link to `path` or its default place
    async fn save_metadata(&mut self, path: Option<&Path>) -> Result<WriteOutcome, ScraperError> {
        let id = self.identifier()?;
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.session().store().metadata_path(&id),
        };
        if self.session().store().should_skip(&target) {
            return Ok(WriteOutcome::Skipped(target));
        }

        let metadata = self.get_metadata(None, Vec::new()).await?;
        Ok(self
            .session()
            .store()
            .write_artwork_metadata(&id, &metadata, path)?)
    }

    /// Saves the image of `link` (or the loaded link) to `path` or its
    /// default place
    ///
    /// An explicit path whose extension differs from the image's is
    /// corrected. Existing files are kept when skip-existing is on, and
    /// nothing is fetched in that case.
    async fn save_image(
        &mut self,
        path: Option<&Path>,
        link: Option<&str>,
    ) -> Result<WriteOutcome, ScraperError> {
        if let Some(link) = link {
            self.load_link(link).await?;
        }
        let id = self.identifier()?;

        if path.is_none() && self.session().state() == SessionState::Skipped {
            if let Some(existing) = self.session().store().existing_image(&id) {
                return Ok(WriteOutcome::Skipped(existing));
            }
        }

        let suffix = self.image_suffix().await?;
        let target = self.session().store().image_path(&id, path, &suffix);
        if self.session().store().should_skip(&target) {
            return Ok(WriteOutcome::Skipped(target));
        }

        let bytes = self.fetch_image().await?;
        let outcome = self.session().store().write_image(&target, &bytes)?;
        self.session_mut().set_state(SessionState::ImageFetched);
        Ok(outcome)
    }

    /// Loads `link` and saves its metadata and image
    async fn scrape(&mut self, link: &str) -> Result<SessionState, ScraperError> {
        if self.load_link(link).await? == SessionState::Skipped {
            return Ok(SessionState::Skipped);
        }
        self.save_metadata(None).await?;
        self.save_image(None, None).await?;
        Ok(self.session().state())
    }

    /// Releases whatever the source holds on to
    async fn close(&mut self) -> Result<(), ScraperError> {
        Ok(())
    }
}
