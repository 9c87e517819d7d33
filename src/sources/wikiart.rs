//! WikiArt scraper over the JSON API
//!
//! Every call carries the session key obtained from the login endpoint and is
//! paced against the previous call. A key the server rejects is replaced once
//! by logging in again.

use super::{ArtScraper, ScrapeSession};
use crate::config::{Config, WikiArtConfig};
use crate::credentials::{CredentialProvider, FileCredentialStore};
use crate::http::{build_http_client, check_status};
use crate::ident::Identifier;
use crate::metadata::{ArtworkMetadata, WIKIART_FIELDS};
use crate::pacing::{RetryExecutor, WaitScheduler};
use crate::resolve::{ArtworkSource, MetadataResolver, SearchPage};
use crate::ScraperError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use url::Url;

/// Client for the WikiArt API
pub struct WikiArtClient {
    http: Client,
    api_base: String,
    credentials: Box<dyn CredentialProvider>,
    session_key: Option<String>,
    scheduler: Arc<WaitScheduler>,
    retry: RetryExecutor,
    min_wait: f64,
    last_request: Mutex<Option<Instant>>,
}

impl WikiArtClient {
    /// Creates a client, reusing a cached session key or logging in
    pub async fn connect(
        config: &WikiArtConfig,
        credentials: Box<dyn CredentialProvider>,
        scheduler: Arc<WaitScheduler>,
        retry: RetryExecutor,
        min_wait: f64,
    ) -> Result<Self, ScraperError> {
        let mut client = Self {
            http: build_http_client(Duration::from_secs(config.timeout_secs))?,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
            session_key: None,
            scheduler,
            retry,
            min_wait,
            last_request: Mutex::new(None),
        };

        match client.credentials.load_token().await? {
            Some(token) => {
                tracing::debug!("Reusing cached WikiArt session");
                client.session_key = Some(token);
            }
            None => client.login().await?,
        }
        Ok(client)
    }

    /// Exchanges the API keys for a new session key and caches it
    pub async fn login(&mut self) -> Result<(), ScraperError> {
        let keys = self.credentials.keys().await?;
        let url = format!("{}/en/Api/2/login", self.api_base);

        self.pace().await?;
        let response = self
            .http
            .get(&url)
            .query(&[
                ("accessCode", keys.access_key.as_str()),
                ("secretCode", keys.secret_key.as_str()),
            ])
            .send()
            .await;
        self.touch();

        let body: Value = check_status(response?)?.json().await?;
        let key = body
            .get("SessionKey")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ScraperError::Credentials("login reply carries no session key".to_string())
            })?
            .to_string();

        self.credentials.persist_token(&key).await?;
        self.session_key = Some(key);
        tracing::info!("Logged in to the WikiArt API");
        Ok(())
    }

    /// GETs an API endpoint, logging in again once if the key is rejected
    async fn get_json(&mut self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, ScraperError> {
        let url = format!("{}/en/api/2/{}", self.api_base, endpoint);

        match self.get_with_retry(&url, params).await {
            Err(ScraperError::Credentials(reason)) => {
                tracing::warn!("WikiArt session rejected ({}), logging in again", reason);
                self.credentials.invalidate_token().await?;
                self.login().await?;
                self.get_with_retry(&url, params).await
            }
            other => other,
        }
    }

    async fn get_with_retry(&self, url: &str, params: &[(&str, String)]) -> Result<Value, ScraperError> {
        self.retry
            .run(url, move || async move {
                let response = self.send(url, params, true).await?;
                Ok(response.json::<Value>().await?)
            })
            .await
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&str, String)],
        authenticated: bool,
    ) -> Result<reqwest::Response, ScraperError> {
        let mut request = self.http.get(url).query(params);
        if authenticated {
            let key = self.session_key.as_deref().ok_or_else(|| {
                ScraperError::Credentials("not logged in to the WikiArt API".to_string())
            })?;
            request = request.query(&[("authSessionKey", key)]);
        }

        self.pace().await?;
        tracing::trace!("GET {}", url);
        let response = request.send().await;
        self.touch();
        check_status(response?)
    }

    async fn pace(&self) -> Result<Duration, ScraperError> {
        let last = *lock(&self.last_request);
        self.scheduler.enforce_gap(last, self.min_wait, None).await
    }

    fn touch(&self) {
        *lock(&self.last_request) = Some(Instant::now());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[async_trait]
impl ArtworkSource for WikiArtClient {
    async fn search(&mut self, term: &str, token: Option<&str>) -> Result<SearchPage, ScraperError> {
        let mut params = vec![("term", term.to_string())];
        if let Some(token) = token {
            params.push(("paginationToken", token.to_string()));
        }

        let body = self.get_json("PaintingSearch", &params).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn painting(&mut self, id: &str) -> Result<ArtworkMetadata, ScraperError> {
        let body = self.get_json("Painting", &[("id", id.to_string())]).await?;
        if !body.is_object() {
            return Err(ScraperError::NotFound(format!("painting {}", id)));
        }
        Ok(ArtworkMetadata::from_value(body))
    }

    async fn page_html(&mut self, link: &str) -> Result<String, ScraperError> {
        let this = &*self;
        this.retry
            .run(link, move || async move {
                let response = this.send(link, &[], false).await?;
                Ok(response.text().await?)
            })
            .await
    }
}

/// File suffix of an image URL, dot included; empty when the path has none
pub fn image_suffix(image_url: &str) -> Result<String, ScraperError> {
    let url = Url::parse(image_url)?;
    Ok(Path::new(url.path())
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default())
}

/// Artwork scraper for wikiart.org links
pub struct WikiArtScraper {
    session: ScrapeSession,
    source: Box<dyn ArtworkSource>,
    resolver: MetadataResolver,
    http: Client,
}

impl WikiArtScraper {
    /// Scraper talking to the live API with file-backed credentials
    pub async fn connect(config: &Config) -> Result<Self, ScraperError> {
        let credentials = FileCredentialStore::new(
            config.wikiart.credentials_path.clone(),
            config.wikiart.session_path.clone(),
        );
        let scheduler = Arc::new(WaitScheduler::new());
        let min_wait = config.wikiart_min_wait();
        let retry = RetryExecutor::new(Arc::clone(&scheduler), config.scraper.max_retries, min_wait)?;

        let client = WikiArtClient::connect(
            &config.wikiart,
            Box::new(credentials),
            Arc::clone(&scheduler),
            retry,
            min_wait,
        )
        .await?;
        Self::new(config, Box::new(client), scheduler)
    }

    /// Scraper resolving metadata through `source`
    pub fn new(
        config: &Config,
        source: Box<dyn ArtworkSource>,
        scheduler: Arc<WaitScheduler>,
    ) -> Result<Self, ScraperError> {
        let session = ScrapeSession::from_config(&config.scraper, config.wikiart_min_wait(), scheduler)?;

        Ok(Self {
            session,
            source,
            resolver: MetadataResolver::with_default_strategies(config.wikiart.max_search_pages),
            http: build_http_client(Duration::from_secs(config.wikiart.timeout_secs))?,
        })
    }

    /// URL of the loaded artwork's image
    async fn image_url(&mut self) -> Result<String, ScraperError> {
        let metadata = self.get_metadata(None, Vec::new()).await?;
        metadata
            .get_str("image")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ScraperError::NotFound(format!(
                    "no image URL in the metadata of {}",
                    metadata.get_str("link").unwrap_or_default()
                ))
            })
    }
}

#[async_trait]
impl ArtScraper for WikiArtScraper {
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
        let mut metadata = self.resolver.resolve(self.source.as_mut(), &link).await?;
        metadata.ensure_fields(WIKIART_FIELDS);
        Ok(metadata)
    }

    async fn image_suffix(&mut self) -> Result<String, ScraperError> {
        let url = self.image_url().await?;
        image_suffix(&url)
    }

    async fn fetch_image(&mut self) -> Result<Vec<u8>, ScraperError> {
        let url = self.image_url().await?;
        self.session.pace(true).await?;

        let http = &self.http;
        let url = url.as_str();
        let bytes = self
            .session
            .retry()
            .run("image download", move || async move {
                let response = check_status(http.get(url).send().await?)?;
                Ok(response.bytes().await?.to_vec())
            })
            .await?;

        tracing::debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::WriteOutcome;
    use crate::resolve::fake::{painting, FakeSource};
    use crate::sources::SessionState;
    use serde_json::json;
    use tempfile::TempDir;

    const LINK: &str = "https://www.wikiart.org/en/claude-monet/water-lilies-1916";

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.scraper.output_dir = dir.path().to_path_buf();
        config.scraper.max_retries = 2;
        config.wikiart.min_wait = Some(0.001);
        config
    }

    fn source() -> FakeSource {
        let mut source = FakeSource::default();
        source.add_painting(painting("p1", "claude-monet", "water-lilies-1916"));
        source.add_search(
            "claude monet water lilies",
            None,
            SearchPage {
                data: vec![json!({"id": "p1"})],
                ..SearchPage::default()
            },
        );
        source
    }

    fn scraper(dir: &TempDir, source: FakeSource) -> WikiArtScraper {
        WikiArtScraper::new(&config(dir), Box::new(source), Arc::new(WaitScheduler::with_seed(2)))
            .unwrap()
    }

    #[test]
    fn test_image_suffix() {
        assert_eq!(
            image_suffix("https://uploads.wikiart.org/images/claude-monet/water-lilies.jpg").unwrap(),
            ".jpg"
        );
        assert_eq!(image_suffix("https://example.org/image").unwrap(), "");
        assert!(image_suffix("not a url").is_err());
    }

    #[tokio::test]
    async fn test_metadata_resolved_and_completed() {
        let dir = TempDir::new().unwrap();
        let mut scraper = scraper(&dir, source());

        let metadata = scraper
            .get_metadata(Some(LINK), vec![("collection".to_string(), json!("Orangerie"))])
            .await
            .unwrap();

        assert_eq!(metadata.get_str("id").as_deref(), Some("p1"));
        assert_eq!(metadata.get_str("link").as_deref(), Some(LINK));
        assert_eq!(metadata.get_str("collection").as_deref(), Some("Orangerie"));
        assert_eq!(metadata.get("genres"), Some(&json!([])));
        assert_eq!(metadata.get_str("description").as_deref(), Some(""));
        assert_eq!(scraper.session().state(), SessionState::MetadataResolved);

        // Served from the cache, without the extra
        let again = scraper.get_metadata(None, Vec::new()).await.unwrap();
        assert!(!again.contains_key("collection"));
        assert_eq!(scraper.image_suffix().await.unwrap(), ".jpg");
    }

    #[tokio::test]
    async fn test_save_metadata_layout() {
        let dir = TempDir::new().unwrap();
        let mut scraper = scraper(&dir, source());
        scraper.load_link(LINK).await.unwrap();

        let outcome = scraper.save_metadata(None).await.unwrap();
        let expected = dir
            .path()
            .join("claude-monet_water-lilies-1916")
            .join("metadata.json");
        assert_eq!(outcome, WriteOutcome::Written(expected.clone()));

        let saved: Value = serde_json::from_str(&std::fs::read_to_string(expected).unwrap()).unwrap();
        assert_eq!(saved["artistUrl"], json!("claude-monet"));

        assert!(matches!(
            scraper.save_metadata(None).await.unwrap(),
            WriteOutcome::Skipped(_)
        ));
    }

    #[tokio::test]
    async fn test_complete_output_skips_without_lookups() {
        let dir = TempDir::new().unwrap();
        let artwork = dir.path().join("claude-monet_water-lilies-1916");
        std::fs::create_dir_all(&artwork).unwrap();
        std::fs::write(artwork.join("metadata.json"), r#"{"id":"p1"}"#).unwrap();
        std::fs::write(artwork.join("artwork.jpg"), b"jpeg").unwrap();

        // An empty source fails every lookup, so any resolution would error
        let mut scraper = scraper(&dir, FakeSource::default());
        assert_eq!(scraper.load_link(LINK).await.unwrap(), SessionState::Skipped);
        assert!(matches!(
            scraper.save_metadata(None).await.unwrap(),
            WriteOutcome::Skipped(_)
        ));
        assert_eq!(
            scraper.save_image(None, None).await.unwrap(),
            WriteOutcome::Skipped(artwork.join("artwork.jpg"))
        );
        assert_eq!(scraper.scrape(LINK).await.unwrap(), SessionState::Skipped);
    }

    #[tokio::test]
    async fn test_saved_metadata_reused() {
        let dir = TempDir::new().unwrap();
        let artwork = dir.path().join("claude-monet_water-lilies-1916");
        std::fs::create_dir_all(&artwork).unwrap();
        std::fs::write(artwork.join("metadata.json"), r#"{"id":"p1","title":"saved"}"#).unwrap();

        let mut scraper = scraper(&dir, FakeSource::default());
        assert_eq!(scraper.load_link(LINK).await.unwrap(), SessionState::LinkLoaded);
        let metadata = scraper.get_metadata(None, Vec::new()).await.unwrap();
        assert_eq!(metadata.get_str("title").as_deref(), Some("saved"));
    }

    #[tokio::test]
    async fn test_unresolvable_link_not_found() {
        let dir = TempDir::new().unwrap();
        let mut scraper = scraper(&dir, FakeSource::default());

        let result = scraper.get_metadata(Some(LINK), Vec::new()).await;
        assert!(matches!(result, Err(ScraperError::NotFound(_))));
        assert_eq!(scraper.session().state(), SessionState::LinkLoaded);
    }

    #[tokio::test]
    async fn test_metadata_requires_link() {
        let dir = TempDir::new().unwrap();
        let mut scraper = scraper(&dir, source());
        let result = scraper.get_metadata(None, Vec::new()).await;
        assert!(matches!(result, Err(ScraperError::InvalidParameter(_))));
    }
}
