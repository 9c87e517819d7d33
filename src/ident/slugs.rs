use crate::ident::identifier::path_segments;
use crate::ScraperError;
use url::Url;

/// Identifying slugs embedded in an artwork link
///
/// For `https://www.wikiart.org/en/claude-monet/water-lilies-1916` the artist
/// slug is `claude-monet`, the work slug `water-lilies-1916` and the work stem
/// (the slug without its trailing numeric disambiguator) `water-lilies`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSlugs {
    pub artist: String,
    pub work: String,
    pub work_stem: String,
}

impl LinkSlugs {
    /// Parses the last two path segments of `link`
    pub fn parse(link: &str) -> Result<Self, ScraperError> {
        let url = Url::parse(link)?;
        let segments = path_segments(&url);

        if segments.len() < 2 {
            return Err(ScraperError::InvalidParameter(format!(
                "artwork link needs an artist and a work segment: {}",
                link
            )));
        }

        let artist = segments[segments.len() - 2].clone();
        let work = segments[segments.len() - 1].clone();
        let work_stem = strip_numeric_suffix(&work).to_string();

        Ok(Self {
            artist,
            work,
            work_stem,
        })
    }

    /// Free-text search terms: both slugs with hyphens as spaces, without the
    /// trailing numeric disambiguator
    pub fn search_terms(&self) -> String {
        format!("{} {}", self.artist, self.work_stem).replace('-', " ")
    }

    /// Free-text name of the artist
    pub fn artist_terms(&self) -> String {
        self.artist.replace('-', " ")
    }

    /// Whether a candidate's own slugs identify this link
    ///
    /// The artist slug must match exactly; the work slug may match either the
    /// full slug or its stem.
    pub fn matches(&self, artist: &str, work: &str) -> bool {
        artist == self.artist && (work == self.work || work == self.work_stem)
    }
}

/// Drops a trailing `-<digits>` group, e.g. a year or a numeric id
fn strip_numeric_suffix(slug: &str) -> &str {
    match slug.rsplit_once('-') {
        Some((stem, tail))
            if !stem.is_empty() && !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) =>
        {
            stem
        }
        _ => slug,
    }
}
