//! Content extraction
//!
//! A product page becomes a [`ProductRecord`] through an ordered chain of
//! strategies. The first strategy returning a record with a non-empty name
//! wins; a page where no strategy finds a name yields nothing.
//!
//! # Example
//!
//! ```no_run
//! use furnish_scout::config::Config;
//! use furnish_scout::extract::ContentExtractor;
//! use url::Url;
//!
//! # async fn example() {
//! let extractor = ContentExtractor::from_config(&Config::default(), reqwest::Client::new());
//! let url = Url::parse("https://shop.example/products/velvet-sofa").unwrap();
//! let record = extractor.extract("<h1>Velvet Sofa</h1>", &url, "sofa").await;
//! assert!(record.is_some());
//! # }
//! ```

mod ai;
mod heuristic;
mod images;
mod text;

pub use ai::AiStrategy;
pub use heuristic::{clean_designer, HeuristicStrategy};
pub use images::{collect_images, is_valid_image_src, ImageRules};
pub use text::{title_case, visible_lines, visible_text};

use crate::config::Config;
use crate::model::ProductRecord;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Failures inside a strategy; never returned from [`ContentExtractor`]
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("unparseable reply: {0}")]
    Parse(String),
}

/// One way of turning page markup into a product record
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short name for log lines
    fn name(&self) -> &'static str;

    async fn extract(&self, markup: &str, page_url: &Url, category: &str) -> Option<ProductRecord>;
}

/// Ordered fallback chain of extraction strategies
pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ContentExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strategies }
    }

    /// AI extraction (when enabled and keyed) followed by heuristics
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();

        match AiStrategy::from_env(client, config) {
            Some(ai) => {
                tracing::info!("AI extraction enabled with model {}", config.ai.model);
                strategies.push(Box::new(ai));
            }
            None => tracing::debug!("AI extraction inactive"),
        }

        strategies.push(Box::new(HeuristicStrategy::from_config(config)));
        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Runs the chain; `None` when no strategy produced a named record
    pub async fn extract(
        &self,
        markup: &str,
        page_url: &Url,
        category: &str,
    ) -> Option<ProductRecord> {
        for strategy in &self.strategies {
            match strategy.extract(markup, page_url, category).await {
                Some(record) if !record.product_name.trim().is_empty() => {
                    tracing::debug!(
                        "{} extracted '{}' from {}",
                        strategy.name(),
                        record.product_name,
                        page_url
                    );
                    return Some(record);
                }
                _ => tracing::debug!("{} found no product on {}", strategy.name(), page_url),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Fixed {
        name: &'static str,
        record: Option<ProductRecord>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ExtractionStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn extract(&self, _: &str, _: &Url, _: &str) -> Option<ProductRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.record.clone()
        }
    }

    fn record(name: &str) -> ProductRecord {
        ProductRecord {
            product_name: name.to_string(),
            description: String::new(),
            product_url: "https://shop.example/p/velvet-sofa".to_string(),
            designer_name: String::new(),
            image_urls: vec![],
            furniture_type: "Sofa".to_string(),
        }
    }

    fn url() -> Url {
        Url::parse("https://shop.example/p/velvet-sofa").unwrap()
    }

    #[tokio::test]
    async fn test_first_named_record_wins() {
        let second_calls = Arc::new(AtomicUsize::new(0));
        let extractor = ContentExtractor::new(vec![
            Box::new(Fixed {
                name: "first",
                record: Some(record("From First")),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(Fixed {
                name: "second",
                record: Some(record("From Second")),
                calls: Arc::clone(&second_calls),
            }),
        ]);

        let result = extractor.extract("", &url(), "sofa").await.unwrap();
        assert_eq!(result.product_name, "From First");
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nameless_record_falls_through() {
        let extractor = ContentExtractor::new(vec![
            Box::new(Fixed {
                name: "blank",
                record: Some(record("  ")),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(Fixed {
                name: "none",
                record: None,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
        ]);

        assert!(extractor.extract("", &url(), "sofa").await.is_none());
    }

    #[tokio::test]
    async fn test_default_chain_ends_with_heuristics() {
        let mut config = Config::default();
        config.ai.enabled = false;
        let extractor = ContentExtractor::from_config(&config, reqwest::Client::new());
        assert_eq!(extractor.strategy_names(), vec!["heuristic"]);

        let record = extractor
            .extract("<h1>velvet sofa</h1>", &url(), "sofa")
            .await
            .unwrap();
        assert_eq!(record.product_name, "Velvet Sofa");
    }
}
