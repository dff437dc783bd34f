//! URL handling module for Furnish-Scout
//!
//! This module provides URL validation, href resolution, same-site checks,
//! host labels for export naming, and the product-shaped path heuristic.

mod domain;
mod path_shape;
mod resolve;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, host_label, same_site};
pub use path_shape::is_product_path;
pub use resolve::resolve_href;

/// Returns true if the string parses as a URL with both a scheme and a host
///
/// # Examples
///
/// ```
/// use furnish_scout::url::is_valid_url;
///
/// assert!(is_valid_url("https://example.com/sofas"));
/// assert!(!is_valid_url("example.com/sofas"));
/// assert!(!is_valid_url("mailto:shop@example.com"));
/// ```
pub fn is_valid_url(candidate: &str) -> bool {
    match Url::parse(candidate.trim()) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Parses a site URL supplied by a caller
///
/// Only http and https URLs with a host are accepted.
pub fn parse_site_url(candidate: &str) -> UrlResult<Url> {
    let url = Url::parse(candidate.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
