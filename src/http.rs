//! HTTP plumbing shared by the JSON and page transports
//!
//! This module handles:
//! - Building HTTP clients with a descriptive user agent
//! - Classifying response status codes into scraper errors

use crate::ScraperError;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!(
    "artscraper/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/sodascience/artscraper)"
);

/// Builds an HTTP client with the given per-request timeout
///
/// # Example
///
/// ```no_run
/// use artscraper::http::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(150)).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Passes successful responses through and maps the rest onto error kinds
///
/// | Status | Error |
/// |--------|-------|
/// | 404, 410 | `NotFound` |
/// | 401, 403 | `Credentials` |
/// | 429, 5xx, anything else | `TransientRemote` |
pub fn check_status(response: Response) -> Result<Response, ScraperError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    Err(classify_status(status, &url))
}

pub fn classify_status(status: StatusCode, url: &str) -> ScraperError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            ScraperError::NotFound(format!("{} returned {}", url, status))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ScraperError::Credentials(format!("{} rejected the request ({})", url, status))
        }
        _ => ScraperError::TransientRemote(format!("{} returned {}", url, status)),
    }
}
