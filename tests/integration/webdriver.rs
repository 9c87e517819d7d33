//! WebDriver wire protocol against a mocked driver

use artscraper::session::{ElementRef, PageSession, Query, WebDriverSession};
use artscraper::ScraperError;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4ce3ba0a8a8b";

/// Starts a mock driver that hands out session `s-1`
async fn start_driver() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_json(json!({
            "capabilities": { "alwaysMatch": { "browserName": "firefox" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": "s-1", "capabilities": { "browserName": "firefox" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    server
}

fn null_value() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": null }))
}

#[tokio::test]
async fn test_session_lifecycle() {
    let server = start_driver().await;

    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .and(body_json(json!({ "url": "https://artsandculture.google.com/asset/x/y" })))
        .respond_with(null_value())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s-1"))
        .respond_with(null_value())
        .expect(1)
        .mount(&server)
        .await;

    let mut session = WebDriverSession::start(&server.uri(), "firefox").await.unwrap();
    assert_eq!(session.session_id(), Some("s-1"));

    session
        .navigate("https://artsandculture.google.com/asset/x/y")
        .await
        .unwrap();
    session.close().await.unwrap();
    assert_eq!(session.session_id(), None);

    // Closing twice is harmless, using a closed session is not
    session.close().await.unwrap();
    assert!(matches!(
        session.navigate("https://example.org").await,
        Err(ScraperError::Unsupported(_))
    ));
}

#[tokio::test]
async fn test_find_and_read_elements() {
    let server = start_driver().await;

    Mock::given(method("POST"))
        .and(path("/session/s-1/element"))
        .and(body_json(json!({ "using": "xpath", "value": "//h1" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "value": { ELEMENT_KEY: "e-1" } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/element"))
        .and(body_json(json!({ "using": "css selector", "value": ".missing" })))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "value": { "error": "no such element", "message": "Unable to locate", "stacktrace": "" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "The Starry Night" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/property/data-id"))
        .respond_with(null_value())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-1/attribute/data-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "bgEuwDxel93-Pg" })))
        .mount(&server)
        .await;

    let mut session = WebDriverSession::start(&server.uri(), "firefox").await.unwrap();

    let heading = session.find(None, &Query::xpath("//h1")).await.unwrap();
    assert_eq!(heading, Some(ElementRef("e-1".to_string())));
    let heading = heading.unwrap();

    assert_eq!(session.text(&heading).await.unwrap(), "The Starry Night");
    assert_eq!(
        session.attribute(&heading, "data-id").await.unwrap().as_deref(),
        Some("bgEuwDxel93-Pg")
    );

    assert_eq!(session.find(None, &Query::css(".missing")).await.unwrap(), None);
    assert!(matches!(
        session.require(None, &Query::css(".missing")).await,
        Err(ScraperError::TransientRemote(_))
    ));
}

#[tokio::test]
async fn test_capture_and_keys() {
    let server = start_driver().await;
    let png = b"\x89PNG fake image".to_vec();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&png);

    Mock::given(method("GET"))
        .and(path("/session/s-1/element/e-2/screenshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": encoded })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/execute/sync"))
        .and(body_json(json!({
            "script": "arguments[0].click();",
            "args": [{ ELEMENT_KEY: "e-2" }]
        })))
        .respond_with(null_value())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s-1/element/e-2/value"))
        .and(body_json(json!({ "text": "\u{E00C}" })))
        .respond_with(null_value())
        .expect(1)
        .mount(&server)
        .await;

    let mut session = WebDriverSession::start(&server.uri(), "firefox").await.unwrap();
    let image = ElementRef("e-2".to_string());

    session.click(&image).await.unwrap();
    assert_eq!(session.capture(&image).await.unwrap(), png);
    session.send_keys(&image, "\u{E00C}").await.unwrap();
}

#[tokio::test]
async fn test_driver_error_is_reported() {
    let server = start_driver().await;

    Mock::given(method("POST"))
        .and(path("/session/s-1/url"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "unknown error", "message": "browser crashed", "stacktrace": "" }
        })))
        .mount(&server)
        .await;

    let mut session = WebDriverSession::start(&server.uri(), "firefox").await.unwrap();
    match session.navigate("https://example.org").await {
        Err(ScraperError::WebDriver { command, message }) => {
            assert_eq!(command, "navigate");
            assert!(message.contains("browser crashed"));
        }
        other => panic!("expected a WebDriver error, got {:?}", other),
    }
}
