use crate::ScraperError;
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

/// Upper bound on the byte length of an identifier
pub const MAX_IDENTIFIER_BYTES: usize = 128;

/// Hex characters of the content hash appended to altered names
const HASH_SUFFIX_CHARS: usize = 16;

/// Filesystem- and cache-safe key for an artwork or artist
///
/// Identifiers double as directory names, so they only hold unicode
/// alphanumerics, `-`, `_` and `.`, and never exceed
/// [`MAX_IDENTIFIER_BYTES`]. Whenever the raw name has to be altered to meet
/// those rules, a short SHA-256 suffix of the raw name is appended so that
/// distinct inputs keep distinct identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Builds an identifier from an arbitrary name
    ///
    /// # Examples
    ///
    /// ```
    /// use artscraper::ident::Identifier;
    ///
    /// let id = Identifier::from_name("claude-monet_water-lilies");
    /// assert_eq!(id.as_str(), "claude-monet_water-lilies");
    /// ```
    pub fn from_name(raw: &str) -> Self {
        let sanitized = sanitize(raw);
        let lossy = sanitized != raw || sanitized.is_empty() || is_dot_name(&sanitized);
        if !lossy && sanitized.len() <= MAX_IDENTIFIER_BYTES {
            return Self(sanitized);
        }

        Self::with_hash(&sanitized, raw)
    }

    /// `name`, cut to fit, followed by the hash of `hash_source`
    fn with_hash(name: &str, hash_source: &str) -> Self {
        let suffix = hash_suffix(hash_source);
        let budget = MAX_IDENTIFIER_BYTES - suffix.len() - 1;
        let stem = truncate_to_boundary(name, budget);

        Self(format!("{}_{}", stem, suffix))
    }

    /// Identifier of an artwork: the last two path segments joined with `_`
    ///
    /// Segments that already contain `_` get the hash suffix as well.
    ///
    /// # Examples
    ///
    /// ```
    /// use artscraper::ident::Identifier;
    ///
    /// let id = Identifier::from_link("https://artsandculture.google.com/asset/the-starry-night/bgEuwDxel93-Pg")
    ///     .unwrap();
    /// assert_eq!(id.as_str(), "the-starry-night_bgEuwDxel93-Pg");
    /// ```
    pub fn from_link(link: &str) -> Result<Self, ScraperError> {
        let url = Url::parse(link)?;
        let segments = path_segments(&url);

        let used = match segments.len() {
            0 => {
                return Err(ScraperError::InvalidParameter(format!(
                    "link has no path to derive an identifier from: {}",
                    link
                )))
            }
            1 => &segments[..],
            n => &segments[n - 2..],
        };

        let tail = used.join("_");
        // `_` inside a segment makes the join ambiguous, so the hash keeps the split
        if used.iter().any(|segment| segment.contains('_')) {
            return Ok(Self::with_hash(&sanitize(&tail), &used.join("/")));
        }

        Ok(Self::from_name(&tail))
    }

    /// Identifier of an artist: the capitalised name slug of an entity link
    ///
    /// `https://artsandculture.google.com/entity/vincent-van-gogh/m07_kq`
    /// becomes `Vincent_Van_Gogh`.
    pub fn for_artist(link: &str) -> Result<Self, ScraperError> {
        let url = Url::parse(link)?;
        let segments = path_segments(&url);

        let slug = segments
            .get(1)
            .or_else(|| segments.first())
            .ok_or_else(|| {
                ScraperError::InvalidParameter(format!("artist link has no name segment: {}", link))
            })?;

        let name = slug
            .split('-')
            .filter(|part| !part.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join("_");

        Ok(Self::from_name(&name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Non-empty, percent-decoded path segments of a URL
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect()
}

pub(crate) fn path_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(|s| {
                    urlencoding::decode(s)
                        .map(|d| d.into_owned())
                        .unwrap_or_else(|_| s.to_string())
                })
                .collect()
        })
        .unwrap_or_default()
}

fn is_safe_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || c == '.'
}

fn is_dot_name(name: &str) -> bool {
    name == "." || name == ".."
}

fn hash_suffix(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(HASH_SUFFIX_CHARS);
    hex
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a char
fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
