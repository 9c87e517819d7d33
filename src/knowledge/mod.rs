//! Knowledge-base module
//!
//! This module turns a structured query about an artist into
//! [`ArtistMetadata`]:
//! - The default SPARQL template and its placeholder
//! - Extraction of the labelled properties a template asks for
//! - Folding result bindings into a metadata document
//! - A SPARQL endpoint client

mod sparql;

pub use sparql::SparqlClient;

use crate::metadata::ArtistMetadata;
use crate::ScraperError;
use async_trait::async_trait;
use indexmap::IndexSet;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Placeholder replaced by the entity id of the artist
pub const PERSON_PLACEHOLDER: &str = "person_id";

/// Personal data, places and artistic classification of a person
pub const DEFAULT_ARTIST_QUERY: &str = r#"
SELECT
?familyName ?familyNameLabel
?givenName ?givenNameLabel
?pseudonym ?pseudonymLabel
?sexOrGender ?sexOrGenderLabel
?dateOfBirth ?dateOfBirthLabel
?placeOfBirth ?placeOfBirthLabel
?latitudeOfPlaceOfBirth ?latitudeOfPlaceOfBirthLabel
?longitudeOfPlaceOfBirth ?longitudeOfPlaceOfBirthLabel
?dateOfDeath ?dateOfDeathLabel
?placeOfDeath ?placeOfDeathLabel
?latitudeOfPlaceOfDeath ?latitudeOfPlaceOfDeathLabel
?longitudeOfPlaceOfDeath ?longitudeOfPlaceOfDeathLabel
?countryOfCitizenship ?countryOfCitizenshipLabel
?residence ?residenceLabel
?workLocation ?workLocationLabel
?genre ?genreLabel
?movement ?movementLabel
?occupation ?occupationLabel
WHERE {
  OPTIONAL { wd:person_id wdt:P734 ?familyName. }
  OPTIONAL { wd:person_id wdt:P735 ?givenName. }
  OPTIONAL { wd:person_id wdt:P742 ?pseudonym. }
  OPTIONAL { wd:person_id wdt:P21 ?sexOrGender. }
  OPTIONAL {
      wd:person_id wdt:P569 ?dateTimeOfBirth.
      BIND (xsd:date(?dateTimeOfBirth) AS ?dateOfBirth)
  }
  OPTIONAL {
      wd:person_id wdt:P19 ?placeOfBirth.
      ?placeOfBirth wdt:P625 ?coordinatesBirth.
      BIND(geof:latitude(?coordinatesBirth) AS ?latitudeOfPlaceOfBirth)
      BIND(geof:longitude(?coordinatesBirth) AS ?longitudeOfPlaceOfBirth)
  }
  OPTIONAL {
      wd:person_id wdt:P570 ?dateTimeOfDeath.
      BIND (xsd:date(?dateTimeOfDeath) AS ?dateOfDeath)
  }
  OPTIONAL {
      wd:person_id wdt:P20 ?placeOfDeath.
      ?placeOfDeath wdt:P625 ?coordinatesDeath.
      BIND(geof:latitude(?coordinatesDeath) AS ?latitudeOfPlaceOfDeath)
      BIND(geof:longitude(?coordinatesDeath) AS ?longitudeOfPlaceOfDeath)
  }
  OPTIONAL { wd:person_id wdt:P27 ?countryOfCitizenship. }
  OPTIONAL { wd:person_id wdt:P551 ?residence. }
  OPTIONAL { wd:person_id wdt:P937 ?workLocation. }
  OPTIONAL { wd:person_id wdt:P136 ?genre. }
  OPTIONAL { wd:person_id wdt:P135 ?movement. }
  OPTIONAL { wd:person_id wdt:P106 ?occupation. }
  SERVICE wikibase:label { bd:serviceParam wikibase:language "en". }
}
"#;

static LABEL_PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?[^\s]*Label\b").expect("label pattern is valid"));

/// One bound value in a result row
#[derive(Debug, Clone, Deserialize)]
pub struct BindingValue {
    pub value: String,
}

/// Result rows of a SELECT query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResults {
    #[serde(default)]
    pub bindings: Vec<HashMap<String, BindingValue>>,
}

/// Body of a SPARQL JSON response
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    pub results: QueryResults,
}

/// Source of structured artist data
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Metadata of the entity `entity_id`
    async fn artist_metadata(&self, entity_id: &str) -> Result<ArtistMetadata, ScraperError>;
}

/// Labelled properties a template selects, in query order, without repeats
///
/// `?genreLabel` selects the property `genre`.
pub fn query_properties(template: &str) -> Vec<String> {
    let properties: IndexSet<String> = LABEL_PROPERTY
        .find_iter(template)
        .map(|m| {
            let name = m.as_str();
            let name = name.strip_prefix('?').unwrap_or(name);
            name.strip_suffix("Label").unwrap_or(name).to_string()
        })
        .filter(|name| !name.is_empty())
        .collect();

    properties.into_iter().collect()
}

/// Document key of a property: `dateOfBirth` becomes `date of birth`
pub fn property_key(property: &str) -> String {
    let mut key = String::with_capacity(property.len() + 4);
    let mut previous: Option<char> = None;

    for c in property.chars() {
        // A capital that follows a word character starts a new word
        if c.is_uppercase() && previous.is_some_and(|p| p.is_alphanumeric() || p == '_') {
            key.push(' ');
        }
        key.extend(c.to_lowercase());
        previous = Some(c);
    }
    key
}

/// Substitutes the entity id into a template
pub fn render_query(template: &str, entity_id: &str) -> Result<String, ScraperError> {
    if !is_entity_id(entity_id) {
        return Err(ScraperError::InvalidParameter(format!(
            "not a knowledge-base entity id: {}",
            entity_id
        )));
    }
    Ok(template.replace(PERSON_PLACEHOLDER, entity_id))
}

/// Whether `id` looks like `Q` followed by digits
pub fn is_entity_id(id: &str) -> bool {
    id.len() > 1 && id.starts_with('Q') && id[1..].chars().all(|c| c.is_ascii_digit())
}

/// Folds result rows into an artist document
///
/// Every property the template selects gets a key. Distinct, percent-decoded
/// labels are gathered across rows in order; a property with no label is
/// `""`, one label is kept as a plain string and several become a list.
pub fn artist_metadata_from_bindings(template: &str, results: &QueryResults) -> ArtistMetadata {
    let mut metadata = ArtistMetadata::new();

    for property in query_properties(template) {
        let variable = format!("{}Label", property);
        let values: IndexSet<String> = results
            .bindings
            .iter()
            .filter_map(|row| row.get(&variable))
            .map(|bound| decode_label(&bound.value))
            .collect();

        metadata.insert_collapsed(property_key(&property), values.into_iter().collect());
    }

    metadata
}

fn decode_label(value: &str) -> String {
    urlencoding::decode(value)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| value.to_string())
}
