//! Metadata records for artworks and artists
//!
//! Both records are ordered JSON objects. Consumers rely on key presence, so
//! known fields are filled with `""` or `[]` instead of being left out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shape of an empty field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
}

/// A field every record of a given source carries
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::List,
        }
    }

    fn empty_value(&self) -> Value {
        match self.kind {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::List => Value::Array(Vec::new()),
        }
    }
}

/// Fields of a WikiArt painting record
pub const WIKIART_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("id"),
    FieldSpec::text("title"),
    FieldSpec::text("url"),
    FieldSpec::text("artistUrl"),
    FieldSpec::text("artistName"),
    FieldSpec::text("completitionYear"),
    FieldSpec::text("image"),
    FieldSpec::text("description"),
    FieldSpec::list("genres"),
    FieldSpec::list("styles"),
    FieldSpec::list("media"),
    FieldSpec::list("tags"),
    FieldSpec::text("link"),
];

/// Fields of a Google Arts & Culture artwork page
pub const GOOGLEART_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("id"),
    FieldSpec::text("main_text"),
    FieldSpec::text("title"),
    FieldSpec::text("creator"),
    FieldSpec::text("date created"),
    FieldSpec::text("link"),
];

/// Structured metadata of one artwork
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkMetadata(Map<String, Value>);

impl ArtworkMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value; anything but an object becomes an empty record
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Inserts empty values for every listed field that is absent
    ///
    /// A `null` counts as absent.
    pub fn ensure_fields(&mut self, fields: &[FieldSpec]) {
        for field in fields {
            let missing = matches!(self.0.get(field.name), None | Some(Value::Null));
            if missing {
                self.0.insert(field.name.to_string(), field.empty_value());
            }
        }
    }

    /// Overwrites fields with the given key/value pairs
    pub fn merge<I>(&mut self, extras: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        for (key, value) in extras {
            self.0.insert(key, value);
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a field; numbers are rendered as text
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Structured metadata of one artist
///
/// Multi-valued properties collapse to a single string when exactly one
/// distinct value was found and stay a list otherwise; absent properties are
/// `""`. Artwork records never collapse. The asymmetry is kept on purpose
/// because downstream consumers read both shapes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistMetadata(Map<String, Value>);

impl ArtistMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a property from its distinct values
    pub fn insert_collapsed(&mut self, key: impl Into<String>, mut values: Vec<String>) {
        let value = match values.len() {
            0 => Value::String(String::new()),
            1 => Value::String(values.remove(0)),
            _ => Value::Array(values.into_iter().map(Value::String).collect()),
        };
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
