//! Integration tests against mock HTTP servers
//!
//! These tests use wiremock to stand in for the WikiArt API, Wikipedia, a
//! SPARQL endpoint and a WebDriver server.

mod knowledge;
mod webdriver;
mod wikiart;
