use super::{artist_metadata_from_bindings, render_query, KnowledgeBase, QueryResponse};
use crate::http::{build_http_client, check_status};
use crate::metadata::ArtistMetadata;
use crate::ScraperError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Knowledge base behind a SPARQL endpoint
#[derive(Debug, Clone)]
pub struct SparqlClient {
    client: Client,
    endpoint: String,
    template: String,
}

impl SparqlClient {
    pub fn new(endpoint: &str, template: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(120))?,
            endpoint: endpoint.to_string(),
            template: template.to_string(),
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

#[async_trait]
impl KnowledgeBase for SparqlClient {
    async fn artist_metadata(&self, entity_id: &str) -> Result<ArtistMetadata, ScraperError> {
        let query = render_query(&self.template, entity_id)?;
        tracing::debug!("Querying {} for {}", self.endpoint, entity_id);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("format", "json"), ("query", query.as_str())])
            .header("Accept", "application/sparql-results+json")
            .send()
            .await?;
        let body: QueryResponse = check_status(response)?.json().await?;

        tracing::trace!("{} result rows for {}", body.results.bindings.len(), entity_id);
        Ok(artist_metadata_from_bindings(&self.template, &body.results))
    }
}
