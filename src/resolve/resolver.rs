use super::source::ArtworkSource;
use super::strategy::{
    validate_candidate, EnumerateByAuthor, Lookup, LookupStrategy, ScrapePage, SearchByTerms,
};
use crate::ident::LinkSlugs;
use crate::metadata::ArtworkMetadata;
use crate::ScraperError;

/// Tries lookup strategies in priority order until one yields a validated
/// record
///
/// A strategy that comes back empty, or fails in a way another attempt may
/// not, hands over to the next one. Errors that would hit every strategy the
/// same way (rejected credentials, retries exhausted) end the resolution.
/// Mismatched candidates never leave the resolver; when every strategy is
/// exhausted the caller gets `NotFound`.
pub struct MetadataResolver {
    strategies: Vec<Box<dyn LookupStrategy>>,
}

impl MetadataResolver {
    pub fn new(strategies: Vec<Box<dyn LookupStrategy>>) -> Self {
        Self { strategies }
    }

    /// Search, then page scrape, then enumeration of the artist's works
    pub fn with_default_strategies(max_search_pages: u32) -> Self {
        Self::new(vec![
            Box::new(SearchByTerms),
            Box::new(ScrapePage),
            Box::new(EnumerateByAuthor::new(max_search_pages)),
        ])
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolves the record of the artwork at `link`
    pub async fn resolve(
        &self,
        source: &mut dyn ArtworkSource,
        link: &str,
    ) -> Result<ArtworkMetadata, ScraperError> {
        let slugs = LinkSlugs::parse(link)?;
        let mut ctx = Lookup::new(source, link, &slugs);

        for strategy in &self.strategies {
            tracing::debug!("Resolving {} by {}", link, strategy.name());

            match strategy.lookup(&mut ctx).await {
                Ok(record) => match validate_candidate(&slugs, &record) {
                    Ok(()) => {
                        tracing::info!("Resolved {} by {}", link, strategy.name());
                        return Ok(record);
                    }
                    Err(e) => {
                        tracing::warn!("Discarding unvalidated record from {}: {}", strategy.name(), e);
                    }
                },
                Err(e @ (ScraperError::NotFound(_) | ScraperError::ValidationMismatch { .. })) => {
                    tracing::debug!("{} found nothing for {}: {}", strategy.name(), link, e);
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!("{} failed for {}: {}", strategy.name(), link, e);
                }
                // Rejected credentials or an exhausted remote end every strategy alike
                Err(e) => return Err(e),
            }
        }

        Err(ScraperError::NotFound(format!(
            "no lookup strategy found a matching record for {}",
            link
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::fake::{painting, FakeSource};
    use crate::resolve::SearchPage;
    use async_trait::async_trait;
    use serde_json::json;

    const LINK: &str = "https://www.wikiart.org/en/artist-x/work-y-12345";

    /// Strategy that checks fixed candidate ids
    struct Candidates(&'static str, Vec<&'static str>);

    #[async_trait]
    impl LookupStrategy for Candidates {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn lookup(&self, ctx: &mut Lookup<'_>) -> Result<ArtworkMetadata, ScraperError> {
            let ids: Vec<String> = self.1.iter().map(|id| id.to_string()).collect();
            ctx.first_valid(&ids)
                .await?
                .ok_or_else(|| ScraperError::NotFound(self.0.to_string()))
        }
    }

    /// Strategy that skips validation and returns whatever it is given
    struct Careless(ArtworkMetadata);

    #[async_trait]
    impl LookupStrategy for Careless {
        fn name(&self) -> &'static str {
            "careless"
        }

        async fn lookup(&self, _ctx: &mut Lookup<'_>) -> Result<ArtworkMetadata, ScraperError> {
            Ok(self.0.clone())
        }
    }

    fn source() -> FakeSource {
        let mut source = FakeSource::default();
        source.add_painting(painting("wrong", "artist-x", "work-z"));
        source.add_painting(painting("right", "artist-x", "work-y"));
        source
    }

    #[tokio::test]
    async fn test_second_strategy_wins_when_first_unvalidated() {
        let mut source = source();
        let resolver = MetadataResolver::new(vec![
            Box::new(Candidates("first", vec!["wrong"])),
            Box::new(Candidates("second", vec!["right"])),
        ]);

        let record = resolver.resolve(&mut source, LINK).await.unwrap();
        assert_eq!(record.get_str("id").as_deref(), Some("right"));
    }

    #[tokio::test]
    async fn test_unchecked_record_never_returned() {
        let mut source = source();
        let resolver = MetadataResolver::new(vec![
            Box::new(Careless(painting("wrong", "artist-x", "work-z"))),
            Box::new(Candidates("checked", vec!["right"])),
        ]);

        let record = resolver.resolve(&mut source, LINK).await.unwrap();
        assert_eq!(record.get_str("id").as_deref(), Some("right"));
    }

    #[tokio::test]
    async fn test_all_strategies_exhausted() {
        let mut source = source();
        let resolver = MetadataResolver::with_default_strategies(5);

        let result = resolver.resolve(&mut source, LINK).await;
        assert!(matches!(result, Err(ScraperError::NotFound(_))));
        // Every path was tried before giving up
        assert_eq!(source.search_calls.len(), 2);
        assert_eq!(source.page_calls, vec![LINK.to_string()]);
    }

    #[tokio::test]
    async fn test_search_match_skips_slower_strategies() {
        let mut source = source();
        source.add_painting(painting("12345", "artist-x", "work-y"));
        source.add_search(
            "artist x work y",
            None,
            SearchPage {
                data: vec![json!({"id": "12345"})],
                pagination_token: None,
                has_more: false,
            },
        );
        let resolver = MetadataResolver::with_default_strategies(5);

        let record = resolver.resolve(&mut source, LINK).await.unwrap();
        assert_eq!(record.get_str("url").as_deref(), Some("work-y"));
        assert_eq!(source.search_calls.len(), 1);
        assert!(source.page_calls.is_empty());
        assert_eq!(source.painting_calls, vec!["12345".to_string()]);
    }

    #[tokio::test]
    async fn test_scrape_fallback() {
        let mut source = source();
        source.pages.insert(
            LINK.to_string(),
            "<script>var paintingId = 'right';</script>".to_string(),
        );
        let resolver = MetadataResolver::with_default_strategies(5);

        let record = resolver.resolve(&mut source, LINK).await.unwrap();
        assert_eq!(record.get_str("id").as_deref(), Some("right"));
        // The artist enumeration never ran
        assert_eq!(source.search_calls.len(), 1);
    }

    /// Source whose API rejects the session and whose pages never load
    struct Rejecting;

    #[async_trait]
    impl ArtworkSource for Rejecting {
        async fn search(&mut self, _term: &str, _token: Option<&str>) -> Result<SearchPage, ScraperError> {
            Err(ScraperError::Credentials("session key rejected".to_string()))
        }

        async fn painting(&mut self, _id: &str) -> Result<ArtworkMetadata, ScraperError> {
            Err(ScraperError::Credentials("session key rejected".to_string()))
        }

        async fn page_html(&mut self, _link: &str) -> Result<String, ScraperError> {
            Err(ScraperError::RetriesExhausted {
                attempts: 3,
                last_error: "connection reset".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_credential_failure_not_reported_as_missing() {
        let resolver = MetadataResolver::with_default_strategies(5);
        let result = resolver.resolve(&mut Rejecting, LINK).await;
        assert!(matches!(result, Err(ScraperError::Credentials(_))));
    }

    #[tokio::test]
    async fn test_exhausted_retries_end_resolution() {
        let mut source = source();
        source.page_failure = Some("connection reset".to_string());
        let resolver = MetadataResolver::with_default_strategies(5);

        let result = resolver.resolve(&mut source, LINK).await;
        assert!(matches!(result, Err(ScraperError::RetriesExhausted { .. })));
        // The artist enumeration never ran
        assert_eq!(source.search_calls.len(), 1);
    }

    #[tokio::test]
    async fn test_exact_work_preferred_over_stem() {
        let link = "https://www.wikiart.org/en/piet-mondrian/composition-8";
        let mut source = FakeSource::default();
        source.add_painting(painting("plain", "piet-mondrian", "composition"));
        source.add_painting(painting("eight", "piet-mondrian", "composition-8"));
        source.add_search(
            "piet mondrian composition",
            None,
            SearchPage {
                data: vec![json!({"id": "plain"}), json!({"id": "eight"})],
                pagination_token: None,
                has_more: false,
            },
        );
        let resolver = MetadataResolver::with_default_strategies(5);

        let record = resolver.resolve(&mut source, link).await.unwrap();
        assert_eq!(record.get_str("url").as_deref(), Some("composition-8"));
    }

    #[tokio::test]
    async fn test_stem_match_accepted_without_exact() {
        let link = "https://www.wikiart.org/en/piet-mondrian/composition-8";
        let mut source = FakeSource::default();
        source.add_painting(painting("other", "piet-mondrian", "broadway"));
        source.add_painting(painting("plain", "piet-mondrian", "composition"));
        source.add_search(
            "piet mondrian composition",
            None,
            SearchPage {
                data: vec![json!({"id": "plain"}), json!({"id": "other"})],
                pagination_token: None,
                has_more: false,
            },
        );
        let resolver = MetadataResolver::with_default_strategies(5);

        let record = resolver.resolve(&mut source, link).await.unwrap();
        assert_eq!(record.get_str("id").as_deref(), Some("plain"));
    }

    #[tokio::test]
    async fn test_malformed_link() {
        let mut source = source();
        let resolver = MetadataResolver::with_default_strategies(5);
        let result = resolver.resolve(&mut source, "https://www.wikiart.org/x").await;
        assert!(matches!(result, Err(ScraperError::InvalidParameter(_))));
    }

    #[test]
    fn test_default_order() {
        let resolver = MetadataResolver::with_default_strategies(5);
        assert_eq!(
            resolver.strategy_names(),
            vec!["search by artist and title", "scrape artwork page", "enumerate artist works"]
        );
    }
}
