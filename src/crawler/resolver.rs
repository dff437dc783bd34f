//! Crawl target resolution
//!
//! A crawl starts from either a site URL or a brand name. Brand names are
//! looked up through a [`BrandResolver`]; a crawl never starts without a
//! resolved URL.

use crate::url::{is_valid_url, parse_site_url};
use crate::ScrapeError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use url::Url;

/// Maps a brand name to its official site
#[async_trait]
pub trait BrandResolver: Send + Sync {
    async fn resolve_official_site(&self, brand: &str) -> Option<Url>;
}

/// Brand directory read from the `[brands]` config table
///
/// Lookups ignore case and surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct ConfigBrandResolver {
    brands: BTreeMap<String, String>,
}

impl ConfigBrandResolver {
    pub fn new(brands: &BTreeMap<String, String>) -> Self {
        Self {
            brands: brands
                .iter()
                .map(|(name, url)| (normalize_brand(name), url.trim().to_string()))
                .collect(),
        }
    }
}

fn normalize_brand(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl BrandResolver for ConfigBrandResolver {
    async fn resolve_official_site(&self, brand: &str) -> Option<Url> {
        self.brands
            .get(&normalize_brand(brand))
            .and_then(|url| parse_site_url(url).ok())
    }
}

/// Turns caller input into the URL to crawl
///
/// Input that parses as a URL is used directly; anything else is treated as
/// a brand name. Empty input and unknown brands are errors.
pub async fn resolve_target(input: &str, resolver: &dyn BrandResolver) -> Result<Url, ScrapeError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ScrapeError::MissingInput);
    }

    if is_valid_url(input) {
        return Ok(parse_site_url(input)?);
    }

    match resolver.resolve_official_site(input).await {
        Some(url) => {
            tracing::info!("Resolved brand '{}' to {}", input, url);
            Ok(url)
        }
        None => Err(ScrapeError::UnresolvedBrand(input.to_string())),
    }
}
