use crate::config::types::{ArtistConfig, Config, GoogleArtConfig, ScraperConfig, WikiArtConfig};
use crate::knowledge::PERSON_PLACEHOLDER;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_wikiart_config(&config.wikiart)?;
    validate_googleart_config(&config.googleart)?;
    validate_artist_config(&config.artist)?;
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    validate_wait("scraper.min-wait", config.min_wait)?;

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_wikiart_config(config: &WikiArtConfig) -> Result<(), ConfigError> {
    if let Some(min_wait) = config.min_wait {
        validate_wait("wikiart.min-wait", min_wait)?;
    }

    validate_http_url("wikiart.api-base", &config.api_base)?;

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "wikiart.timeout-secs must be > 0".to_string(),
        ));
    }

    if config.max_search_pages < 1 {
        return Err(ConfigError::Validation(
            "wikiart.max-search-pages must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_googleart_config(config: &GoogleArtConfig) -> Result<(), ConfigError> {
    if let Some(min_wait) = config.min_wait {
        validate_wait("googleart.min-wait", min_wait)?;
    }

    validate_http_url("googleart.webdriver-url", &config.webdriver_url)?;

    if config.browser.is_empty() {
        return Err(ConfigError::Validation(
            "googleart.browser cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_artist_config(config: &ArtistConfig) -> Result<(), ConfigError> {
    if let Some(min_wait) = config.min_wait {
        validate_wait("artist.min-wait", min_wait)?;
    }

    if !config.latency_scale.is_finite() || config.latency_scale < 0.0 {
        return Err(ConfigError::Validation(format!(
            "artist.latency-scale must be a non-negative number, got {}",
            config.latency_scale
        )));
    }

    validate_http_url("artist.sparql-endpoint", &config.sparql_endpoint)?;
    validate_http_url("artist.index-page", &config.index_page)?;

    if let Some(query) = &config.sparql_query {
        if !query.contains(PERSON_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "artist.sparql-query must contain the '{}' placeholder",
                PERSON_PLACEHOLDER
            )));
        }
    }

    Ok(())
}

/// A wait bound must be a positive, finite number of seconds
fn validate_wait(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be > 0 seconds, got {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", name, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, value
        )));
    }

    Ok(())
}
