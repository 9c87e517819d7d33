//! ArtScraper: artwork images and metadata from art aggregation sites
//!
//! This crate extracts artwork images and structured metadata about artists and
//! artworks from a museum aggregation site (Google Arts & Culture) and a
//! crowd-sourced art encyclopedia (WikiArt), pacing every request to stay below
//! unknown rate limits.

pub mod cache;
pub mod config;
pub mod credentials;
pub mod encyclopedia;
pub mod http;
pub mod ident;
pub mod knowledge;
pub mod metadata;
pub mod output;
pub mod pacing;
pub mod pagination;
pub mod resolve;
pub mod session;
pub mod sources;

use thiserror::Error;

/// Main error type for ArtScraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Transient remote error: {0}")]
    TransientRemote(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Candidate {found} does not match {expected}")]
    ValidationMismatch { expected: String, found: String },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("WebDriver command {command} failed: {message}")]
    WebDriver { command: String, message: String },

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScraperError {
    /// Whether a retry loop may absorb this error
    ///
    /// Bad parameters and exhausted lookups are final; everything that comes
    /// from talking to a remote system is worth another attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Config(_)
                | Self::InvalidParameter(_)
                | Self::NotFound(_)
                | Self::Credentials(_)
                | Self::Unsupported(_)
                | Self::RetriesExhausted { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the persistence collaborator
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for ArtScraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::ArtworkCache;
pub use config::Config;
pub use ident::{Identifier, LinkSlugs};
pub use metadata::{ArtistMetadata, ArtworkMetadata};
pub use pacing::{RetryExecutor, WaitScheduler};
pub use pagination::PaginationCollector;
pub use resolve::MetadataResolver;
pub use session::PageSession;
pub use sources::{ArtScraper, ArtistScraper, GoogleArtScraper, WikiArtScraper};
