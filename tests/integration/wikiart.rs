//! WikiArt scraping over a mocked JSON API

use artscraper::config::Config;
use artscraper::sources::{ArtScraper, SessionState, WikiArtScraper};
use artscraper::ScraperError;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTWORK_DIR: &str = "claude-monet_water-lilies-1916";

/// Creates a test configuration pointing the API at the mock server
fn create_test_config(dir: &TempDir, api_base: &str) -> Config {
    let mut config = Config::default();
    config.scraper.output_dir = dir.path().join("out");
    config.scraper.min_wait = 0.01;
    config.scraper.max_retries = 2;
    config.wikiart.api_base = api_base.to_string();
    config.wikiart.min_wait = Some(0.01);
    config.wikiart.timeout_secs = 5;
    config.wikiart.credentials_path = dir.path().join("wiki_api");
    config.wikiart.session_path = dir.path().join("wiki_session");
    config.wikiart.max_search_pages = 2;

    std::fs::write(&config.wikiart.credentials_path, "access\nsecret\n")
        .expect("Failed to write key file");
    config
}

fn artwork_link(server: &MockServer) -> String {
    format!("{}/en/claude-monet/water-lilies-1916", server.uri())
}

fn painting(id: &str, work: &str, image: &str) -> Value {
    json!({
        "id": id,
        "title": "Water Lilies",
        "artistName": "Claude Monet",
        "artistUrl": "claude-monet",
        "url": work,
        "completitionYear": 1916,
        "image": image,
    })
}

async fn mount_login(server: &MockServer, key: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/en/Api/2/login"))
        .and(query_param("accessCode", "access"))
        .and(query_param("secretCode", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "SessionKey": key })))
        .expect(calls)
        .mount(server)
        .await;
}

async fn mount_painting(server: &MockServer, record: Value, calls: u64) {
    let id = record["id"].as_str().unwrap_or_default().to_string();
    Mock::given(method("GET"))
        .and(path("/en/api/2/Painting"))
        .and(query_param("id", id.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(record))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_scrape_resolves_by_search_and_saves() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &server.uri());
    let image_url = format!("{}/images/222.jpg", server.uri());

    mount_login(&server, "key-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/en/api/2/PaintingSearch"))
        .and(query_param("term", "claude monet water lilies"))
        .and(query_param("authSessionKey", "key-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "111" }, { "id": "222" }],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The first hit is a different work by the same artist
    mount_painting(&server, painting("111", "water-lilies-1919", &image_url), 1).await;
    mount_painting(&server, painting("222", "water-lilies-1916", &image_url), 1).await;

    Mock::given(method("GET"))
        .and(path("/images/222.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let mut scraper = WikiArtScraper::connect(&config).await.expect("Failed to connect");
    let state = scraper.scrape(&artwork_link(&server)).await.expect("Scrape failed");
    assert_eq!(state, SessionState::ImageFetched);

    let artwork_dir = config.scraper.output_dir.join(ARTWORK_DIR);
    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(artwork_dir.join("metadata.json")).unwrap())
            .unwrap();
    assert_eq!(saved["id"], "222");
    assert_eq!(saved["title"], "Water Lilies");
    assert_eq!(std::fs::read(artwork_dir.join("artwork.jpg")).unwrap(), b"jpeg-bytes");

    // The session key is cached for the next run
    assert_eq!(
        std::fs::read_to_string(&config.wikiart.session_path).unwrap(),
        "key-1"
    );
}

#[tokio::test]
async fn test_second_run_skips_complete_artwork() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &server.uri());
    let image_url = format!("{}/images/222.jpg", server.uri());

    // Only the first run logs in and fetches anything
    mount_login(&server, "key-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/en/api/2/PaintingSearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "222" }],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_painting(&server, painting("222", "water-lilies-1916", &image_url), 1).await;
    Mock::given(method("GET"))
        .and(path("/images/222.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let link = artwork_link(&server);
    let mut first = WikiArtScraper::connect(&config).await.unwrap();
    assert_eq!(first.scrape(&link).await.unwrap(), SessionState::ImageFetched);

    let mut second = WikiArtScraper::connect(&config).await.unwrap();
    assert_eq!(second.scrape(&link).await.unwrap(), SessionState::Skipped);
}

#[tokio::test]
async fn test_rejected_session_logs_in_again() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &server.uri());
    std::fs::write(&config.wikiart.session_path, "stale").unwrap();

    mount_login(&server, "fresh", 1).await;

    Mock::given(method("GET"))
        .and(path("/en/api/2/PaintingSearch"))
        .and(query_param("authSessionKey", "stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/api/2/PaintingSearch"))
        .and(query_param("authSessionKey", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "222" }],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_painting(&server, painting("222", "water-lilies-1916", "https://img/222.jpg"), 1).await;

    let mut scraper = WikiArtScraper::connect(&config).await.unwrap();
    let metadata = scraper
        .get_metadata(Some(&artwork_link(&server)), Vec::new())
        .await
        .expect("Metadata lookup failed");

    assert_eq!(metadata.get_str("id").as_deref(), Some("222"));
    assert_eq!(
        std::fs::read_to_string(&config.wikiart.session_path).unwrap(),
        "fresh"
    );
}

#[tokio::test]
async fn test_falls_back_to_page_scrape() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &server.uri());

    mount_login(&server, "key-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/en/api/2/PaintingSearch"))
        .and(query_param("term", "claude monet water lilies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/claude-monet/water-lilies-1916"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><div data-painting-id="333"></div></body></html>"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_painting(&server, painting("333", "water-lilies", "https://img/333.png"), 1).await;

    let mut scraper = WikiArtScraper::connect(&config).await.unwrap();
    let metadata = scraper
        .get_metadata(Some(&artwork_link(&server)), vec![("source".to_string(), json!("wikiart"))])
        .await
        .unwrap();

    assert_eq!(metadata.get_str("id").as_deref(), Some("333"));
    assert_eq!(metadata.get_str("source").as_deref(), Some("wikiart"));
    assert_eq!(scraper.image_suffix().await.unwrap(), ".png");
}

#[tokio::test]
async fn test_unresolvable_artwork_is_not_found() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, &server.uri());

    mount_login(&server, "key-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/en/api/2/PaintingSearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/en/claude-monet/water-lilies-1916"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut scraper = WikiArtScraper::connect(&config).await.unwrap();
    let result = scraper.scrape(&artwork_link(&server)).await;

    assert!(matches!(result, Err(ScraperError::NotFound(_))));
    assert!(!config.scraper.output_dir.join(ARTWORK_DIR).join("metadata.json").exists());
}
