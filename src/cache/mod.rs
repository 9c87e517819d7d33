//! Single-slot metadata cache
//!
//! A scraper session works on one link at a time, and the same link is often
//! asked for repeatedly (metadata, then its directory, then the image URL). The
//! cache keeps the last fetched record so those calls cost one fetch.

use crate::metadata::ArtworkMetadata;
use crate::ScraperError;
use serde_json::Value;
use std::future::Future;

/// The cached record and the link it was fetched for
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub link: String,
    pub data: ArtworkMetadata,
}

/// Caches the metadata of the most recently fetched link
///
/// Loading a different link replaces the entry; there is never more than one.
#[derive(Debug, Default)]
pub struct ArtworkCache {
    entry: Option<CacheEntry>,
}

impl ArtworkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `link`, calling `fetch` only on a miss
    ///
    /// On a miss the fetched record is tagged with a `link` field and stored,
    /// replacing any previous entry. `extras` are merged into the returned copy
    /// on every call, hits included, but never into the cached record. A failed
    /// fetch leaves the previous entry untouched.
    pub async fn get_or_fetch<F, Fut, I>(
        &mut self,
        link: &str,
        fetch: F,
        extras: I,
    ) -> Result<ArtworkMetadata, ScraperError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ArtworkMetadata, ScraperError>>,
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut data = match self.lookup(link) {
            Some(cached) => {
                tracing::trace!("Metadata cache hit for {}", link);
                cached.clone()
            }
            None => {
                tracing::debug!("Metadata cache miss for {}", link);
                let mut fetched = fetch().await?;
                fetched.insert("link", link);
                self.store(link, fetched.clone());
                fetched
            }
        };

        data.merge(extras);
        Ok(data)
    }

    /// The cached record, if it belongs to `link`
    pub fn lookup(&self, link: &str) -> Option<&ArtworkMetadata> {
        self.entry
            .as_ref()
            .filter(|entry| entry.link == link)
            .map(|entry| &entry.data)
    }

    /// Replaces the cached entry
    pub fn store(&mut self, link: &str, data: ArtworkMetadata) {
        self.entry = Some(CacheEntry {
            link: link.to_string(),
            data,
        });
    }

    /// Drops the cached entry
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Link of the cached entry, if any
    pub fn cached_link(&self) -> Option<&str> {
        self.entry.as_ref().map(|entry| entry.link.as_str())
    }
}
