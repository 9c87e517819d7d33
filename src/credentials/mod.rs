//! Credential store module
//!
//! API keys and the session token live in small local files. Instead of
//! reading them as a side effect of constructing a client, a
//! [`CredentialProvider`] is handed to whoever needs them.

mod prompt;

pub use prompt::{Prompter, StdinPrompter};

use crate::ScraperError;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// Access/secret key pair
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKeys {
    pub access_key: String,
    pub secret_key: String,
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl ApiKeys {
    /// Parses the key file format: access key and secret key on the first
    /// two lines
    pub fn parse(contents: &str) -> Result<Self, ScraperError> {
        let mut lines = contents.lines().map(str::trim);
        let access_key = lines.next().unwrap_or_default().to_string();
        let secret_key = lines.next().unwrap_or_default().to_string();

        if access_key.is_empty() || secret_key.is_empty() {
            return Err(ScraperError::Credentials(
                "key file needs the access key and the secret key on separate lines".to_string(),
            ));
        }
        Ok(Self {
            access_key,
            secret_key,
        })
    }

    pub fn to_file_contents(&self) -> String {
        format!("{}\n{}\n", self.access_key, self.secret_key)
    }
}

/// Lifecycle of the API credentials and the cached session token
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Stored keys, or `None` when nothing has been stored yet
    async fn load(&self) -> Result<Option<ApiKeys>, ScraperError>;

    /// Obtains keys for a first run, typically by asking the user
    async fn init(&self) -> Result<ApiKeys, ScraperError>;

    /// Stores keys for later runs
    async fn persist(&self, keys: &ApiKeys) -> Result<(), ScraperError>;

    /// Session token left by a previous run
    async fn load_token(&self) -> Result<Option<String>, ScraperError>;

    async fn persist_token(&self, token: &str) -> Result<(), ScraperError>;

    /// Forgets a token the server rejected
    async fn invalidate_token(&self) -> Result<(), ScraperError>;

    /// Stored keys, initialising and persisting them on first use
    async fn keys(&self) -> Result<ApiKeys, ScraperError> {
        if let Some(keys) = self.load().await? {
            return Ok(keys);
        }
        let keys = self.init().await?;
        self.persist(&keys).await?;
        Ok(keys)
    }
}

/// Credentials kept in two files
pub struct FileCredentialStore {
    keys_path: PathBuf,
    token_path: PathBuf,
    prompter: Box<dyn Prompter>,
}

impl FileCredentialStore {
    pub fn new(keys_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self::with_prompter(keys_path, token_path, Box::new(StdinPrompter))
    }

    pub fn with_prompter(
        keys_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            keys_path: keys_path.into(),
            token_path: token_path.into(),
            prompter,
        }
    }

    pub fn keys_path(&self) -> &Path {
        &self.keys_path
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }
}

async fn read_optional(path: &Path) -> Result<Option<String>, ScraperError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl CredentialProvider for FileCredentialStore {
    async fn load(&self) -> Result<Option<ApiKeys>, ScraperError> {
        match read_optional(&self.keys_path).await? {
            Some(contents) => ApiKeys::parse(&contents).map(Some),
            None => Ok(None),
        }
    }

    async fn init(&self) -> Result<ApiKeys, ScraperError> {
        tracing::info!("No API keys found at {}", self.keys_path.display());
        self.prompter
            .notice("WikiArt API keys can be obtained from https://www.wikiart.org/en/App/GetApi")?;

        let access_key = self.prompter.ask("WikiArt Access Key? ")?;
        let secret_key = self.prompter.ask("WikiArt Secret Key? ")?;
        ApiKeys::parse(&format!("{}\n{}", access_key, secret_key))
    }

    async fn persist(&self, keys: &ApiKeys) -> Result<(), ScraperError> {
        tokio::fs::write(&self.keys_path, keys.to_file_contents()).await?;
        tracing::debug!("Stored API keys at {}", self.keys_path.display());
        Ok(())
    }

    async fn load_token(&self) -> Result<Option<String>, ScraperError> {
        Ok(read_optional(&self.token_path)
            .await?
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()))
    }

    async fn persist_token(&self, token: &str) -> Result<(), ScraperError> {
        tokio::fs::write(&self.token_path, token).await?;
        Ok(())
    }

    async fn invalidate_token(&self) -> Result<(), ScraperError> {
        match tokio::fs::remove_file(&self.token_path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
