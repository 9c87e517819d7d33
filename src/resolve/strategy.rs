use super::source::ArtworkSource;
use crate::ident::LinkSlugs;
use crate::metadata::ArtworkMetadata;
use crate::ScraperError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Patterns that embed the painting id in a page, tried in order
static PAINTING_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"paintingId = '(.+?)'", r#"data-painting-id="(.+?)""#]
        .into_iter()
        .map(|pattern| Regex::new(pattern).expect("painting id pattern is valid"))
        .collect()
});

/// Checks that a candidate record describes the linked artwork
///
/// The candidate's own `artistUrl` and `url` slugs must match the link.
pub fn validate_candidate(slugs: &LinkSlugs, record: &ArtworkMetadata) -> Result<(), ScraperError> {
    let artist = record.get_str("artistUrl").unwrap_or_default();
    let work = record.get_str("url").unwrap_or_default();

    if slugs.matches(&artist, &work) {
        Ok(())
    } else {
        Err(ScraperError::ValidationMismatch {
            expected: format!("{}/{}", slugs.artist, slugs.work),
            found: format!("{}/{}", artist, work),
        })
    }
}

/// Painting id embedded in a page, by the first pattern that matches
pub fn extract_painting_id(html: &str) -> Option<String> {
    PAINTING_ID_PATTERNS.iter().find_map(|re| {
        re.captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

/// State shared by the strategies of one resolution
///
/// Candidates are fetched and validated here, never by a strategy itself, so
/// a strategy cannot hand back a record nobody checked. Ids already rejected
/// are remembered and not fetched again.
pub struct Lookup<'a> {
    source: &'a mut dyn ArtworkSource,
    link: &'a str,
    slugs: &'a LinkSlugs,
    rejected: HashSet<String>,
    fetched: HashMap<String, usize>,
}

impl<'a> Lookup<'a> {
    pub fn new(source: &'a mut dyn ArtworkSource, link: &'a str, slugs: &'a LinkSlugs) -> Self {
        Self {
            source,
            link,
            slugs,
            rejected: HashSet::new(),
            fetched: HashMap::new(),
        }
    }

    pub fn link(&self) -> &str {
        self.link
    }

    pub fn slugs(&self) -> &LinkSlugs {
        self.slugs
    }

    pub fn source(&mut self) -> &mut dyn ArtworkSource {
        &mut *self.source
    }

    /// Number of times the record of `id` was fetched
    pub fn fetch_count(&self, id: &str) -> usize {
        self.fetched.get(id).copied().unwrap_or_default()
    }

    /// Fetches the record of `id` and validates it
    ///
    /// Fails with `ValidationMismatch` when the record belongs to another
    /// artwork.
    pub async fn check(&mut self, id: &str) -> Result<ArtworkMetadata, ScraperError> {
        if self.rejected.contains(id) {
            return Err(ScraperError::ValidationMismatch {
                expected: self.slugs.work.clone(),
                found: format!("previously rejected candidate {}", id),
            });
        }

        *self.fetched.entry(id.to_string()).or_default() += 1;
        let record = self.source.painting(id).await?;

        match validate_candidate(self.slugs, &record) {
            Ok(()) => Ok(record),
            Err(e) => {
                tracing::debug!("Rejected candidate {}: {}", id, e);
                self.rejected.insert(id.to_string());
                Err(e)
            }
        }
    }

    /// Whether `record` carries the link's full work slug, not just its stem
    pub fn is_exact(&self, record: &ArtworkMetadata) -> bool {
        record.get_str("url").as_deref() == Some(self.slugs.work.as_str())
    }

    /// Checks candidates in order and returns the best valid one
    ///
    /// A candidate carrying the full work slug wins as soon as it is seen. One
    /// that matches only the stem (`composition` for `composition-8`) may be a
    /// different work, so it is returned only when no exact match follows.
    /// Errors other than a mismatch end the scan.
    pub async fn first_valid(&mut self, ids: &[String]) -> Result<Option<ArtworkMetadata>, ScraperError> {
        let mut stem_match = None;

        for id in ids {
            match self.check(id).await {
                Ok(record) if self.is_exact(&record) => return Ok(Some(record)),
                Ok(record) => {
                    if stem_match.is_none() {
                        tracing::debug!("Candidate {} matches {} by stem only", id, self.slugs.work);
                        stem_match = Some(record);
                    }
                }
                Err(ScraperError::ValidationMismatch { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(stem_match)
    }
}

/// One way of finding an artwork's record
#[async_trait]
pub trait LookupStrategy: Send + Sync {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Looks for a validated record; `NotFound` when this path has nothing
    async fn lookup(&self, ctx: &mut Lookup<'_>) -> Result<ArtworkMetadata, ScraperError>;
}

/// Searches for the artist and title derived from the link
#[derive(Debug, Default)]
pub struct SearchByTerms;

#[async_trait]
impl LookupStrategy for SearchByTerms {
    fn name(&self) -> &'static str {
        "search by artist and title"
    }

    async fn lookup(&self, ctx: &mut Lookup<'_>) -> Result<ArtworkMetadata, ScraperError> {
        let terms = ctx.slugs().search_terms();
        let page = ctx.source().search(&terms, None).await?;

        ctx.first_valid(&page.ids()).await?.ok_or_else(|| {
            ScraperError::NotFound(format!("no search result for \"{}\" matches", terms))
        })
    }
}

/// Reads the painting id embedded in the artwork page itself
#[derive(Debug, Default)]
pub struct ScrapePage;

#[async_trait]
impl LookupStrategy for ScrapePage {
    fn name(&self) -> &'static str {
        "scrape artwork page"
    }

    async fn lookup(&self, ctx: &mut Lookup<'_>) -> Result<ArtworkMetadata, ScraperError> {
        let link = ctx.link().to_string();
        let html = ctx.source().page_html(&link).await?;

        let id = extract_painting_id(&html).ok_or_else(|| {
            ScraperError::NotFound(format!("no painting id embedded in {}", link))
        })?;
        ctx.check(&id).await
    }
}

/// Walks every search page for the artist, checking each result
///
/// The slowest path: one record fetch per candidate.
#[derive(Debug)]
pub struct EnumerateByAuthor {
    max_pages: u32,
}

impl EnumerateByAuthor {
    pub fn new(max_pages: u32) -> Self {
        Self { max_pages }
    }
}

#[async_trait]
impl LookupStrategy for EnumerateByAuthor {
    fn name(&self) -> &'static str {
        "enumerate artist works"
    }

    async fn lookup(&self, ctx: &mut Lookup<'_>) -> Result<ArtworkMetadata, ScraperError> {
        let artist = ctx.slugs().artist_terms();
        let mut token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        let mut stem_match = None;

        for page_number in 1..=self.max_pages {
            let page = ctx.source().search(&artist, token.as_deref()).await?;
            tracing::debug!(
                "Artist search page {} for \"{}\": {} results",
                page_number,
                artist,
                page.data.len()
            );
            if page.data.is_empty() {
                break;
            }

            if let Some(record) = ctx.first_valid(&page.ids()).await? {
                if ctx.is_exact(&record) {
                    return Ok(record);
                }
                // Later pages may still list the exact work
                stem_match.get_or_insert(record);
            }

            if !page.has_more {
                break;
            }
            match page.pagination_token {
                Some(next) if seen_tokens.insert(next.clone()) => token = Some(next),
                _ => {
                    tracing::debug!("Search for \"{}\" returned no fresh page token", artist);
                    break;
                }
            }
        }

        stem_match.ok_or_else(|| {
            ScraperError::NotFound(format!("none of the works listed for \"{}\" matches", artist))
        })
    }
}
