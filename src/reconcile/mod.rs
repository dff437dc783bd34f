//! Reconciliation of scraped records with a price listing
//!
//! This module handles:
//! - Validating scraped records (name, product URL, images)
//! - Fuzzy matching records against price rows by name and type
//! - Merging matched pairs and restoring the listing's column names
//!
//! Matching is a full cross product. One record may match several price
//! rows and one price row several records; every match becomes its own row.

mod columns;
mod fuzzy;
mod validation;

pub use columns::{restore_column_names, to_camel_case};
pub use fuzzy::{token_set_ratio, types_match};
pub use validation::{
    probe_from_config, validate_records, DropReason, HttpProbe, LinkProbe, SkipProbe,
    ValidationSummary,
};

use crate::config::Config;
use crate::model::{MergedRow, PriceListingRow, ProductRecord};
use crate::{Result, ScrapeError};

/// Matching parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Minimum name similarity, 0-100
    pub threshold: u8,
    /// camelCase name of the price listing's name column
    pub name_column: String,
    /// camelCase name of the price listing's type column
    pub type_column: String,
}

impl MergeOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            threshold: config.merge.threshold,
            name_column: config.merge.name_column.clone(),
            type_column: config.merge.type_column.clone(),
        }
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Finds a column by its camelCase name, else by a keyword in the header
fn find_column(headers: &[String], camel_name: &str, keywords: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| to_camel_case(h).eq_ignore_ascii_case(camel_name))
        .or_else(|| {
            headers.iter().position(|h| {
                let lower = h.to_lowercase();
                keywords.iter().any(|k| lower.contains(k))
            })
        })
}

/// Merges validated records with price rows
///
/// A pair matches when the name similarity reaches the threshold and the
/// type fields share a token. Each merged row holds the price row's columns
/// followed by the record's fields; record fields win on name clashes.
/// Columns are named after the price listing where a camelCase mapping
/// exists.
pub fn merge(
    scraped: &[ProductRecord],
    price_rows: &[PriceListingRow],
    options: &MergeOptions,
) -> Result<Vec<MergedRow>> {
    let Some(first) = price_rows.first() else {
        tracing::warn!("Price listing is empty, nothing to merge");
        return Ok(Vec::new());
    };

    let headers: Vec<String> = first.columns.iter().map(|(name, _)| name.clone()).collect();
    let name_index = find_column(&headers, &options.name_column, &["name"]).ok_or_else(|| {
        ScrapeError::Reconcile("price listing has no name-like column".to_string())
    })?;
    let type_index = find_column(&headers, &options.type_column, &["type", "category"])
        .ok_or_else(|| {
            ScrapeError::Reconcile("price listing has no type-like column".to_string())
        })?;

    tracing::info!(
        "Matching {} records against {} price rows on '{}' / '{}' (threshold {})",
        scraped.len(),
        price_rows.len(),
        headers[name_index],
        headers[type_index],
        options.threshold
    );

    let cell = |row: &PriceListingRow, index: usize| -> String {
        row.columns
            .get(index)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    };

    let mut merged = Vec::new();
    for record in scraped {
        for row in price_rows {
            let price_name = cell(row, name_index);
            let score = token_set_ratio(&record.product_name, &price_name);
            if score < f64::from(options.threshold)
                || !types_match(&record.furniture_type, &cell(row, type_index))
            {
                continue;
            }

            tracing::debug!(
                "Matched '{}' with '{}' (score {:.1})",
                record.product_name,
                price_name,
                score
            );

            let mut out = MergedRow::default();
            for (name, value) in &row.columns {
                out.set(&to_camel_case(name), value.clone());
            }
            for (name, value) in record.to_columns() {
                out.set(&name, value);
            }

            let names: Vec<String> = out.columns.iter().map(|(name, _)| name.clone()).collect();
            let restored = restore_column_names(&names, &headers);
            for ((name, _), original) in out.columns.iter_mut().zip(restored) {
                *name = original;
            }
            merged.push(out);
        }
    }

    tracing::info!("Merged {} rows", merged.len());
    Ok(merged)
}

/// Validates `scraped` and merges the survivors with `price_rows`
///
/// Fails when no record survives validation or the listing lacks a name or
/// type column. An empty validated set is an error on purpose: merging it
/// could only produce an empty file. Individual drops are never errors and
/// are reported through the [`ValidationSummary`].
pub async fn reconcile(
    scraped: Vec<ProductRecord>,
    price_rows: &[PriceListingRow],
    probe: &dyn LinkProbe,
    config: &Config,
) -> Result<(Vec<MergedRow>, ValidationSummary)> {
    let (valid, summary) =
        validate_records(scraped, probe, &config.selectors.image_blacklist).await;

    if valid.is_empty() {
        return Err(ScrapeError::Reconcile(
            "no valid records left after validation".to_string(),
        ));
    }

    let merged = merge(&valid, price_rows, &MergeOptions::from_config(config))?;
    Ok((merged, summary))
}
