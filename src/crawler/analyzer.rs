//! Strategy analyzer
//!
//! Fetches a site's front page once and decides how the rest of the crawl
//! fetches pages. Product-like markup already present in the raw HTML wins
//! over framework signatures: such a site is crawled in plain mode even when
//! it ships a client-side framework.

use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, PlainFetcher};
use crate::model::{Complexity, FetchMode, Framework, SiteProfile};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::time::Duration;
use url::Url;

/// Timeout for the single analysis fetch
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(10);

/// Classifies sites as plain or scripted
#[derive(Debug, Clone)]
pub struct StrategyAnalyzer {
    fetcher: PlainFetcher,
    framework_signatures: Vec<String>,
    furniture_indicators: Vec<String>,
}

impl StrategyAnalyzer {
    pub fn new(fetcher: PlainFetcher, config: &Config) -> Self {
        Self {
            fetcher,
            framework_signatures: lowercase_all(&config.selectors.framework_signatures),
            furniture_indicators: lowercase_all(&config.selectors.furniture_indicators),
        }
    }

    /// Fetches `url` once and classifies it
    ///
    /// An unreachable page or a non-2xx answer yields the scripted profile
    /// from [`SiteProfile::unreachable`]; this never fails.
    pub async fn analyze(&self, url: &Url) -> SiteProfile {
        match self.fetcher.get(url, ANALYSIS_TIMEOUT).await {
            FetchResult::Success { body, .. } => {
                let profile = self.classify_markup(url, &body);
                tracing::info!(
                    "Analyzed {}: framework={}, mode={}, signals={:?}",
                    url,
                    profile.framework,
                    profile.recommended_fetch_mode,
                    profile.detected_signals
                );
                profile
            }
            failure => {
                tracing::warn!(
                    "Could not analyze {} ({}), defaulting to scripted mode",
                    url,
                    failure.describe()
                );
                SiteProfile::unreachable(url.clone())
            }
        }
    }

    /// Classifies already fetched front-page markup
    pub fn classify_markup(&self, url: &Url, markup: &str) -> SiteProfile {
        let document = Html::parse_document(markup);
        let framework = self.detect_framework(&document);
        let indicators = self.detect_indicators(&document);

        let mut detected_signals: BTreeSet<String> = indicators.iter().cloned().collect();
        if let Some(framework) = framework {
            detected_signals.insert(format!("framework:{}", framework));
        }

        if indicators.is_empty() {
            SiteProfile {
                url: url.clone(),
                requires_scripting: true,
                framework: framework.unwrap_or(Framework::Dynamic),
                complexity: Complexity::Complex,
                recommended_fetch_mode: FetchMode::Scripted,
                detected_signals,
            }
        } else {
            SiteProfile {
                url: url.clone(),
                requires_scripting: false,
                framework: framework.unwrap_or(Framework::Static),
                complexity: Complexity::Simple,
                recommended_fetch_mode: FetchMode::Plain,
                detected_signals,
            }
        }
    }

    /// Scans inline script text and external script sources for signatures
    fn detect_framework(&self, document: &Html) -> Option<Framework> {
        let selector = Selector::parse("script").ok()?;

        for script in document.select(&selector) {
            let src = script.value().attr("src").unwrap_or("").to_lowercase();
            let inline = script.text().collect::<String>().to_lowercase();

            for signature in &self.framework_signatures {
                if src.contains(signature.as_str()) || inline.contains(signature.as_str()) {
                    return Some(Framework::from_signature(signature));
                }
            }
        }

        None
    }

    /// Returns the indicators found in any element's class or id
    fn detect_indicators(&self, document: &Html) -> Vec<String> {
        let Ok(selector) = Selector::parse("[class], [id]") else {
            return Vec::new();
        };

        let mut found = Vec::new();
        for element in document.select(&selector) {
            let class = element.value().attr("class").unwrap_or("").to_lowercase();
            let id = element.value().attr("id").unwrap_or("").to_lowercase();

            for indicator in &self.furniture_indicators {
                if found.contains(indicator) {
                    continue;
                }
                if class.contains(indicator.as_str()) || id.contains(indicator.as_str()) {
                    found.push(indicator.clone());
                }
            }

            if found.len() == self.furniture_indicators.len() {
                break;
            }
        }

        found
    }
}

fn lowercase_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
