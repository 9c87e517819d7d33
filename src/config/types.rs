use crate::session::Query;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for ArtScraper
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub wikiart: WikiArtConfig,
    pub googleart: GoogleArtConfig,
    pub artist: ArtistConfig,
}

/// Options shared by every scraper
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Where artifacts are written
    pub output_dir: PathBuf,

    /// Skip already-complete outputs
    pub skip_existing: bool,

    /// Pacing floor in seconds
    pub min_wait: f64,

    /// Retry bound for transient failures
    pub max_retries: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            skip_existing: true,
            min_wait: 5.0,
            max_retries: 3,
        }
    }
}

/// WikiArt API client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WikiArtConfig {
    /// Scheme and host of the API (no trailing slash)
    pub api_base: String,

    /// Minimum gap between API requests in seconds; overrides `scraper.min-wait`
    pub min_wait: Option<f64>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// File holding the access key and secret key, one per line
    pub credentials_path: PathBuf,

    /// File caching the session token between runs
    pub session_path: PathBuf,

    /// Upper bound on search pages read when enumerating an artist's works
    pub max_search_pages: u32,
}

impl Default for WikiArtConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.wikiart.org".to_string(),
            min_wait: Some(0.3),
            timeout_secs: 150,
            credentials_path: PathBuf::from(".wiki_api"),
            session_path: PathBuf::from(".wiki_session"),
            max_search_pages: 50,
        }
    }
}

/// Google Arts & Culture artwork page configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GoogleArtConfig {
    /// URL of a running WebDriver server (geckodriver, chromedriver, ...)
    pub webdriver_url: String,

    /// Browser name requested from the WebDriver server
    pub browser: String,

    /// Pacing floor in seconds; overrides `scraper.min-wait`
    pub min_wait: Option<f64>,

    /// Block holding the free-text description of the artwork
    pub main_text: Query,

    /// Element showing the artwork image
    pub image: Query,

    /// Element receiving the Escape key after an image capture
    pub page_body: Query,

    /// Id prefix of the metadata block; the artwork id is appended
    pub metadata_prefix: String,
}

impl Default for GoogleArtConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser: "firefox".to_string(),
            min_wait: None,
            main_text: Query::xpath("/html/body/div[3]/div[3]/div/div/div[5]/section[1]/div"),
            image: Query::xpath("/html/body/div[3]/div[3]/div/div/div[2]/div[3]"),
            page_body: Query::xpath("/html/body"),
            metadata_prefix: "metadata-".to_string(),
        }
    }
}

/// Artist page configuration (works, description, knowledge-base metadata)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArtistConfig {
    /// Pacing floor in seconds; overrides `scraper.min-wait`
    pub min_wait: Option<f64>,

    /// Consecutive attempts without new items before pagination gives up
    pub stall_limit: u32,

    /// Multiplier applied to the observed page latency when pacing clicks
    pub latency_scale: f64,

    /// SPARQL endpoint of the knowledge base
    pub sparql_endpoint: String,

    /// Replacement for the built-in artist query; must contain `person_id`
    pub sparql_query: Option<String>,

    /// Heading that marks the works carousel
    pub works_heading: Query,

    /// Carousel container, relative to the heading
    pub works_section: Query,

    /// Elements searched for an "N items" count
    pub count_indicator: Query,

    /// Control that reveals more works
    pub reveal_control: Query,

    /// Elements linking to individual works
    pub work_items: Query,

    /// Attribute whose presence marks the reveal control as actionable
    pub actionable_attribute: String,

    /// Link from the artist page to the encyclopedia article
    pub wikipedia_link: Query,

    /// Page listing every artist
    pub index_page: String,

    /// Elements linking to artist pages on the index page
    pub index_items: Query,

    /// Upper bound on scroll steps on the index page
    pub max_scrolls: u32,
}

impl Default for ArtistConfig {
    fn default() -> Self {
        Self {
            min_wait: None,
            stall_limit: 3,
            latency_scale: 1.0,
            sparql_endpoint: "https://query.wikidata.org/sparql".to_string(),
            sparql_query: None,
            works_heading: Query::xpath(r#"//*[contains(text(), "Discover this artist")]"#),
            works_section: Query::xpath("../.."),
            count_indicator: Query::tag_name("h3"),
            reveal_control: Query::xpath(r#".//*[contains(@data-gaaction,"rightArrow")]"#),
            work_items: Query::xpath(r#"//*[contains(@href,"/asset/")]"#),
            actionable_attribute: "tabindex".to_string(),
            wikipedia_link: Query::xpath(r#"//*[contains(@href,"wikipedia")]"#),
            index_page: "https://artsandculture.google.com/category/artist".to_string(),
            index_items: Query::xpath(r#"//*[contains(@href,"categoryId=artist")]"#),
            max_scrolls: 500,
        }
    }
}

impl Config {
    /// Makes `min_wait` the pacing floor of every source
    ///
    /// Per-source floors from the file are replaced too, so a command-line
    /// override reaches the WikiArt API, whose floor is set by default.
    pub fn set_min_wait(&mut self, min_wait: f64) {
        self.scraper.min_wait = min_wait;
        self.wikiart.min_wait = Some(min_wait);
        self.googleart.min_wait = Some(min_wait);
        self.artist.min_wait = Some(min_wait);
    }

    /// Effective pacing floor for the WikiArt API
    pub fn wikiart_min_wait(&self) -> f64 {
        self.wikiart.min_wait.unwrap_or(self.scraper.min_wait)
    }

    /// Effective pacing floor for artwork pages
    pub fn googleart_min_wait(&self) -> f64 {
        self.googleart.min_wait.unwrap_or(self.scraper.min_wait)
    }

    /// Effective pacing floor for artist pages
    pub fn artist_min_wait(&self) -> f64 {
        self.artist.min_wait.unwrap_or(self.scraper.min_wait)
    }
}
