//! Configuration module for ArtScraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use artscraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("artscraper.toml")).unwrap();
//! println!("Artifacts go to {}", config.scraper.output_dir.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ArtistConfig, Config, GoogleArtConfig, ScraperConfig, WikiArtConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
