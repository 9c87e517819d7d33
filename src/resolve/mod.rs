//! Metadata resolution module
//!
//! This module finds the authoritative record for an artwork link:
//! - An abstract data source (search, record by id, raw page)
//! - Ordered lookup strategies, from cheapest to slowest
//! - Identity validation of every candidate against the link's slugs

mod resolver;
mod source;
mod strategy;

#[cfg(test)]
pub(crate) mod fake;

pub use resolver::MetadataResolver;
pub use source::{ArtworkSource, SearchPage};
pub use strategy::{
    extract_painting_id, validate_candidate, EnumerateByAuthor, Lookup, LookupStrategy, ScrapePage,
    SearchByTerms,
};
