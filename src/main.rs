//! ArtScraper main entry point
//!
//! This is the command-line interface for scraping artworks and artists.

use artscraper::config::{load_config_with_hash, validate, Config};
use artscraper::sources::{ArtScraper, ArtistScraper, GoogleArtScraper, WikiArtScraper};
use artscraper::ScraperError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ArtScraper: artwork images and metadata from art aggregation sites
///
/// Downloads artwork images and metadata from WikiArt and Google Arts &
/// Culture, and artist work lists, descriptions and knowledge-base facts.
/// Every request is paced to stay below the sites' rate limits.
#[derive(Parser, Debug)]
#[command(name = "artscraper")]
#[command(version)]
#[command(about = "Scrapes artworks and artists from art aggregation sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Directory artifacts are written to
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Overwrite artifacts that already exist
    #[arg(long, global = true)]
    no_skip_existing: bool,

    /// Minimum seconds between requests, for every source
    #[arg(long, value_name = "SECONDS", global = true)]
    min_wait: Option<f64>,

    /// Attempts per remote operation before giving up
    #[arg(long, value_name = "N", global = true)]
    max_retries: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save metadata and images of WikiArt artworks
    Wikiart {
        #[arg(required = true, value_name = "LINK")]
        links: Vec<String>,
    },

    /// Save metadata and images of Google Arts & Culture artworks
    Googleart {
        #[arg(required = true, value_name = "LINK")]
        links: Vec<String>,
    },

    /// Save works, description and metadata of Google Arts & Culture artists
    Artist {
        #[arg(required = true, value_name = "LINK")]
        links: Vec<String>,
    },

    /// Collect the links of every artist on the index page
    Artists {
        /// File the links are written to, one per line
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Validate and print the effective configuration without scraping
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, hash) = match load(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Wikiart { links } => {
            let mut scraper = WikiArtScraper::connect(&config).await?;
            let failures = scrape_all(&mut scraper, &links).await;
            scraper.close().await?;
            report(failures, links.len())
        }
        Command::Googleart { links } => {
            let mut scraper = GoogleArtScraper::connect(&config).await?;
            let failures = scrape_all(&mut scraper, &links).await;
            scraper.close().await?;
            report(failures, links.len())
        }
        Command::Artist { links } => {
            let mut scraper = ArtistScraper::connect(&config).await?;
            let mut failures = 0;
            for link in &links {
                match scraper.save_artist_information(link).await {
                    Ok(Some(files)) => tracing::info!("Saved {} ({})", link, files.works.display()),
                    Ok(None) => tracing::info!("Skipped {}", link),
                    Err(e) => {
                        tracing::error!("Failed to scrape {}: {}", link, e);
                        failures += 1;
                    }
                }
            }
            scraper.close().await?;
            report(failures, links.len())
        }
        Command::Artists { output } => {
            let mut scraper = ArtistScraper::connect(&config).await?;
            let result = scraper.collect_artist_index(output.as_deref()).await;
            scraper.close().await?;

            let links = result?;
            if output.is_none() {
                for link in &links {
                    println!("{}", link);
                }
            }
            tracing::info!("Collected {} artist links", links.len());
            Ok(())
        }
        Command::ShowConfig => {
            handle_show_config(&config, hash.as_deref());
            Ok(())
        }
    }
}

/// Loads the configuration file (if any), applies command-line overrides and
/// validates the result
fn load(cli: &Cli) -> Result<(Config, Option<String>), ScraperError> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            (Config::default(), None)
        }
    };

    if let Some(dir) = &cli.output_dir {
        config.scraper.output_dir = dir.clone();
    }
    if cli.no_skip_existing {
        config.scraper.skip_existing = false;
    }
    if let Some(min_wait) = cli.min_wait {
        config.set_min_wait(min_wait);
    }
    if let Some(max_retries) = cli.max_retries {
        config.scraper.max_retries = max_retries;
    }

    validate(&config)?;
    Ok((config, hash))
}

/// Scrapes every link, logging failures and moving on
async fn scrape_all<S: ArtScraper>(scraper: &mut S, links: &[String]) -> usize {
    let mut failures = 0;
    for link in links {
        match scraper.scrape(link).await {
            Ok(state) => tracing::info!("{}: {:?}", link, state),
            Err(e) => {
                tracing::error!("Failed to scrape {}: {}", link, e);
                failures += 1;
            }
        }
    }
    failures
}

fn report(failures: usize, total: usize) -> Result<(), Box<dyn std::error::Error>> {
    if failures == 0 {
        tracing::info!("All {} links done", total);
        return Ok(());
    }
    Err(format!("{} of {} links failed", failures, total).into())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("artscraper=info,warn"),
            1 => EnvFilter::new("artscraper=debug,info"),
            2 => EnvFilter::new("artscraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles show-config: prints the effective configuration
fn handle_show_config(config: &Config, hash: Option<&str>) {
    println!("=== Configuration ===\n");
    if let Some(hash) = hash {
        println!("Hash: {}\n", hash);
    }

    println!("Output directory: {}", config.scraper.output_dir.display());
    println!("Skip existing: {}", config.scraper.skip_existing);
    println!("Minimum wait: {}s", config.scraper.min_wait);
    println!("Max retries: {}", config.scraper.max_retries);

    println!("\nWikiArt:");
    println!("  API: {}", config.wikiart.api_base);
    println!("  Credentials: {}", config.wikiart.credentials_path.display());

    println!("\nGoogle Arts & Culture:");
    println!("  WebDriver: {} ({})", config.googleart.webdriver_url, config.googleart.browser);

    println!("\nArtists:");
    println!("  Index page: {}", config.artist.index_page);
    println!("  SPARQL endpoint: {}", config.artist.sparql_endpoint);

    println!("\n{:#?}", config);
    println!("\n✓ Configuration is valid");
}
