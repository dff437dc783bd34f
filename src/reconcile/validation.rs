//! Record validation ahead of merging
//!
//! A record survives validation when it has a name, a well-formed product
//! URL that answers, and at least one image URL that passes the image
//! predicate and answers too. Only surviving images are kept.

use crate::config::{Config, ImageFilter};
use crate::extract::is_valid_image_src;
use crate::model::ProductRecord;
use crate::url::parse_site_url;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Checks whether a URL can be retrieved
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn is_reachable(&self, url: &Url) -> bool;
}

/// Probe sending a HEAD request; only a final 200 counts as reachable
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl LinkProbe for HttpProbe {
    async fn is_reachable(&self, url: &Url) -> bool {
        match self
            .client
            .head(url.as_str())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", url, e);
                false
            }
        }
    }
}

/// Probe accepting every well-formed URL without network access
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipProbe;

#[async_trait]
impl LinkProbe for SkipProbe {
    async fn is_reachable(&self, _url: &Url) -> bool {
        true
    }
}

/// Probe selected by `[merge] check-reachability`
pub fn probe_from_config(config: &Config, client: Client) -> Box<dyn LinkProbe> {
    if config.merge.check_reachability {
        Box::new(HttpProbe::new(
            client,
            Duration::from_secs(config.merge.probe_timeout_secs),
        ))
    } else {
        Box::new(SkipProbe)
    }
}

/// Why a record was dropped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingName,
    MissingProductUrl,
    InvalidProductUrl(String),
    UnreachableProductUrl,
    NoValidImages,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "missing product name"),
            Self::MissingProductUrl => write!(f, "missing product URL"),
            Self::InvalidProductUrl(e) => write!(f, "invalid product URL: {}", e),
            Self::UnreachableProductUrl => write!(f, "product URL is unreachable"),
            Self::NoValidImages => write!(f, "no valid image URLs"),
        }
    }
}

/// Outcome of validating a batch of records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    /// (product name or URL, reason) per dropped record
    pub dropped: Vec<(String, DropReason)>,
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validated {} out of {} records", self.valid, self.total)?;
        for (record, reason) in &self.dropped {
            write!(f, "\n  dropped '{}': {}", record, reason)?;
        }
        Ok(())
    }
}

async fn check_record(
    record: &ProductRecord,
    probe: &dyn LinkProbe,
    image_blacklist: &[String],
) -> Result<Vec<String>, DropReason> {
    let name = record.product_name.trim();
    if name.is_empty() {
        return Err(DropReason::MissingName);
    }

    if record.product_url.trim().is_empty() {
        return Err(DropReason::MissingProductUrl);
    }
    let product_url = parse_site_url(&record.product_url)
        .map_err(|e| DropReason::InvalidProductUrl(e.to_string()))?;
    if !probe.is_reachable(&product_url).await {
        return Err(DropReason::UnreachableProductUrl);
    }

    let mut images = Vec::new();
    for src in &record.image_urls {
        if !is_valid_image_src(src, name, image_blacklist, ImageFilter::Lenient) {
            continue;
        }
        let Ok(url) = parse_site_url(src) else {
            continue;
        };
        if probe.is_reachable(&url).await {
            images.push(src.clone());
        }
    }

    if images.is_empty() {
        return Err(DropReason::NoValidImages);
    }
    Ok(images)
}

/// Validates records, returning the survivors and a summary
///
/// Dropped records are logged with their reason; nothing here fails.
pub async fn validate_records(
    records: Vec<ProductRecord>,
    probe: &dyn LinkProbe,
    image_blacklist: &[String],
) -> (Vec<ProductRecord>, ValidationSummary) {
    let mut summary = ValidationSummary {
        total: records.len(),
        ..ValidationSummary::default()
    };
    let mut valid = Vec::new();

    for mut record in records {
        match check_record(&record, probe, image_blacklist).await {
            Ok(images) => {
                record.image_urls = images;
                valid.push(record);
            }
            Err(reason) => {
                let label = if record.product_name.trim().is_empty() {
                    record.product_url.clone()
                } else {
                    record.product_name.clone()
                };
                tracing::warn!("Dropping record '{}': {}", label, reason);
                summary.dropped.push((label, reason));
            }
        }
    }

    summary.valid = valid.len();
    tracing::info!("{}", summary);
    (valid, summary)
}
