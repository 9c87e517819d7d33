//! Identifier handling module
//!
//! This module derives stable keys from source links:
//! - Filesystem-safe identifiers for artworks and artists
//! - Artist/work slugs used to validate resolved metadata

mod identifier;
mod slugs;

pub use identifier::{Identifier, MAX_IDENTIFIER_BYTES};
pub use slugs::LinkSlugs;
pub(crate) use identifier::path_segments;
