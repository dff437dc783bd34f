//! Furnish-Scout: adaptive product discovery for furniture retailers
//!
//! This crate crawls unknown retailer websites, decides per site whether pages
//! need a scripted browser, discovers category and product pages without a
//! site-specific scraper, extracts structured product records, and reconciles
//! them against an externally supplied price listing.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod logging;
pub mod model;
pub mod output;
pub mod reconcile;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Furnish-Scout operations
///
/// Only caller-input problems surface through this type during a crawl;
/// per-page failures are logged and skipped inside the coordinator.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No site URL or brand name was supplied")]
    MissingInput,

    #[error("Could not resolve an official site for brand '{0}'")]
    UnresolvedBrand(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Reconciliation error: {0}")]
    Reconcile(String),

    #[error("Invalid crawl transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl task error: {0}")]
    Task(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}' in {list}")]
    InvalidSelector { list: String, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Furnish-Scout operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use model::{CategoryMap, MergedRow, PriceListingRow, ProductRecord, SiteProfile};
pub use state::{CrawlPhase, SeenLinkSet};
pub use url::{is_product_path, is_valid_url};
