//! Output module for scraped artifacts
//!
//! This module handles:
//! - The on-disk layout of artwork and artist artifacts
//! - Skipping files that already exist when asked to
//! - Image path resolution with suffix correction
//! - Plain link lists

mod paths;
mod store;

pub use paths::{image_path, write_link_list};
pub use store::{ArtifactStore, ArtistArtifacts, WriteOutcome};

use crate::OutputError;

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

pub const METADATA_FILE: &str = "metadata.json";
pub const IMAGE_STEM: &str = "artwork";
pub const WORKS_FILE: &str = "works.txt";
pub const DESCRIPTION_FILE: &str = "description.txt";
