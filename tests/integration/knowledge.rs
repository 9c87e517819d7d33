//! Encyclopedia and knowledge-base clients over mocked endpoints

use artscraper::encyclopedia::{EncyclopediaClient, WikipediaClient, WikipediaLink};
use artscraper::knowledge::{KnowledgeBase, SparqlClient, DEFAULT_ARTIST_QUERY};
use artscraper::ScraperError;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article() -> WikipediaLink {
    WikipediaLink::parse("https://en.wikipedia.org/wiki/Vincent_van_Gogh").unwrap()
}

#[tokio::test]
async fn test_wikipedia_description_and_entity() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("titles", "Vincent_van_Gogh"))
        .and(query_param("prop", "extracts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": [{
                "title": "Vincent van Gogh",
                "extract": "Vincent Willem van Gogh was a Dutch Post-Impressionist painter."
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("prop", "pageprops"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": [{
                "title": "Vincent van Gogh",
                "pageprops": { "wikibase_item": "Q5582" }
            }]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WikipediaClient::with_api_base(&server.uri()).unwrap();
    let description = client.description(&article()).await.unwrap();
    assert!(description.starts_with("Vincent Willem van Gogh was a Dutch"));
    assert_eq!(client.entity_id(&article()).await.unwrap(), "Q5582");
}

#[tokio::test]
async fn test_wikipedia_missing_article() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": { "pages": [{ "title": "Vincent_van_Gogh", "missing": true }] }
        })))
        .mount(&server)
        .await;

    let client = WikipediaClient::with_api_base(&server.uri()).unwrap();
    assert!(matches!(
        client.description(&article()).await,
        Err(ScraperError::NotFound(_))
    ));
    assert!(matches!(
        client.entity_id(&article()).await,
        Err(ScraperError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_sparql_artist_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sparql"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "head": { "vars": ["placeOfBirthLabel", "residenceLabel"] },
            "results": { "bindings": [
                {
                    "placeOfBirthLabel": { "type": "literal", "value": "Zundert" },
                    "residenceLabel": { "type": "literal", "value": "Arles" }
                },
                {
                    "placeOfBirthLabel": { "type": "literal", "value": "Zundert" },
                    "residenceLabel": { "type": "literal", "value": "Saint-R%C3%A9my-de-Provence" }
                }
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SparqlClient::new(&format!("{}/sparql", server.uri()), DEFAULT_ARTIST_QUERY).unwrap();
    let metadata = client.artist_metadata("Q5582").await.unwrap();

    assert_eq!(metadata.get("place of birth"), Some(&json!("Zundert")));
    assert_eq!(
        metadata.get("residence"),
        Some(&json!(["Arles", "Saint-Rémy-de-Provence"]))
    );
    // Selected but unbound
    assert_eq!(metadata.get("pseudonym"), Some(&json!("")));

    let requests = server.received_requests().await.unwrap();
    let sent = requests[0].url.query_pairs().find(|(k, _)| k == "query").unwrap().1.into_owned();
    assert!(sent.contains("wd:Q5582"));
    assert!(!sent.contains("person_id"));
}

#[tokio::test]
async fn test_sparql_rejects_bad_entity() {
    let client = SparqlClient::new("http://127.0.0.1:9/sparql", DEFAULT_ARTIST_QUERY).unwrap();
    assert!(matches!(
        client.artist_metadata("Vincent").await,
        Err(ScraperError::InvalidParameter(_))
    ));
}
