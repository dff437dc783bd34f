//! Core data model shared by discovery, extraction and reconciliation

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use url::Url;

/// Front-end framework detected on a site's front page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Static,
    Vue,
    React,
    Angular,
    Nuxt,
    /// Content assumed client-rendered, framework unknown
    Dynamic,
}

impl Framework {
    /// Maps a framework signature keyword to a framework
    pub fn from_signature(signature: &str) -> Self {
        match signature.to_lowercase().as_str() {
            "vue" => Self::Vue,
            "react" => Self::React,
            "angular" => Self::Angular,
            "nuxt" => Self::Nuxt,
            _ => Self::Dynamic,
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Static => "static",
            Self::Vue => "vue",
            Self::React => "react",
            Self::Angular => "angular",
            Self::Nuxt => "nuxt",
            Self::Dynamic => "dynamic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Complex,
}

/// How pages are fetched for the rest of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Direct HTTP request, no script execution
    Plain,
    /// Full browser engine so client-rendered content is present
    Scripted,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::Scripted => f.write_str("scripted"),
        }
    }
}

/// Classification of a site produced once per crawl by the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub url: Url,
    pub requires_scripting: bool,
    pub framework: Framework,
    pub complexity: Complexity,
    pub recommended_fetch_mode: FetchMode,
    pub detected_signals: BTreeSet<String>,
}

impl SiteProfile {
    /// Profile used when the front page cannot be fetched at all
    ///
    /// Falls toward the more capable scripted strategy.
    pub fn unreachable(url: Url) -> Self {
        Self {
            url,
            requires_scripting: true,
            framework: Framework::Dynamic,
            complexity: Complexity::Complex,
            recommended_fetch_mode: FetchMode::Scripted,
            detected_signals: BTreeSet::new(),
        }
    }
}

/// Category key -> ordered list of discovered URLs
///
/// Keys never map to an empty list.
pub type CategoryMap = BTreeMap<String, Vec<Url>>;

/// A structured product extracted from one product page
///
/// Only `product_name` is required; a record with an empty name is never
/// constructed by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_name: String,
    pub description: String,
    pub product_url: String,
    pub designer_name: String,
    pub image_urls: Vec<String>,
    pub furniture_type: String,
}

impl ProductRecord {
    /// Column names in export order
    pub const COLUMNS: [&'static str; 6] = [
        "productName",
        "description",
        "productUrl",
        "designerName",
        "imageUrls",
        "furnitureType",
    ];

    /// Flattens the record into `(column, value)` pairs in export order
    ///
    /// Image URLs are encoded as a JSON array.
    pub fn to_columns(&self) -> Vec<(String, String)> {
        let images = serde_json::to_string(&self.image_urls).unwrap_or_else(|_| "[]".to_string());
        vec![
            ("productName".to_string(), self.product_name.clone()),
            ("description".to_string(), self.description.clone()),
            ("productUrl".to_string(), self.product_url.clone()),
            ("designerName".to_string(), self.designer_name.clone()),
            ("imageUrls".to_string(), images),
            ("furnitureType".to_string(), self.furniture_type.clone()),
        ]
    }
}

/// One row of an externally supplied price listing, in header order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceListingRow {
    pub columns: Vec<(String, String)>,
}

impl PriceListingRow {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// Looks up a value by exact column name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// A price row combined with the fields of its matched product record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedRow {
    pub columns: Vec<(String, String)>,
}

impl MergedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Sets a column, replacing an existing value in place
    pub fn set(&mut self, column: &str, value: String) {
        match self.columns.iter_mut().find(|(name, _)| name == column) {
            Some(entry) => entry.1 = value,
            None => self.columns.push((column.to_string(), value)),
        }
    }
}
