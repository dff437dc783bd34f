//! Output module for crawl summaries and spreadsheet exports
//!
//! This module handles:
//! - Summaries of finished crawls
//! - Writing scraped records and merged rows as CSV
//! - Reading price listings, earlier exports and batch site lists

mod csv_output;
mod summary;

pub use csv_output::{
    export_file_name, read_price_listing, read_price_listing_from, read_products,
    read_products_from, read_site_list, read_site_list_from, write_merged, write_merged_to,
    write_products, write_products_to,
};
pub use summary::CrawlSummary;

use thiserror::Error;

/// Errors raised while reading or writing spreadsheets
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    #[error("Unsupported file shape: {0}")]
    UnsupportedShape(String),
}

/// Result type alias for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;
