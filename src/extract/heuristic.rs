//! Selector and regex based extraction

use crate::config::Config;
use crate::extract::images::{collect_images, ImageRules};
use crate::extract::text::{first_text, title_case, visible_lines};
use crate::extract::ExtractionStrategy;
use crate::model::ProductRecord;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

fn designer_prefix() -> Option<&'static Regex> {
    static PREFIX: OnceLock<Option<Regex>> = OnceLock::new();
    PREFIX
        .get_or_init(|| {
            Regex::new(r"(?i)^(?:(?:design(?:ed)?\s+)?by\b|designer\b:?|brand\b:?)\s*").ok()
        })
        .as_ref()
}

fn designed_by() -> Option<&'static Regex> {
    static DESIGNED_BY: OnceLock<Option<Regex>> = OnceLock::new();
    DESIGNED_BY
        .get_or_init(|| Regex::new(r"(?i)design(?:ed)? by ([\w ]+)").ok())
        .as_ref()
}

/// Removes a leading "by", "design by", "designer:" or "brand:" label
///
/// ```
/// use furnish_scout::extract::clean_designer;
///
/// assert_eq!(clean_designer("Design by Jane Doe"), "Jane Doe");
/// assert_eq!(clean_designer("Brand: Acme"), "Acme");
/// assert_eq!(clean_designer("Byron Studio"), "Byron Studio");
/// ```
pub fn clean_designer(text: &str) -> String {
    let text = text.trim();
    match designer_prefix() {
        Some(prefix) => prefix.replace(text, "").trim().to_string(),
        None => text.to_string(),
    }
}

/// Finds "design(ed) by <words>" in visible page text
fn designer_from_text(lines: &str) -> Option<String> {
    designed_by()?
        .captures(lines)
        .and_then(|captures| captures.get(1))
        .map(|m| title_case(m.as_str().trim()))
        .filter(|name| !name.is_empty())
}

fn compile(sources: &[String]) -> Vec<Selector> {
    sources
        .iter()
        .filter_map(|source| Selector::parse(source).ok())
        .collect()
}

/// Extracts records from page structure alone
#[derive(Debug, Clone)]
pub struct HeuristicStrategy {
    name_selectors: Vec<Selector>,
    description_selectors: Vec<Selector>,
    designer_selectors: Vec<Selector>,
    images: ImageRules,
}

impl HeuristicStrategy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name_selectors: compile(&config.selectors.name),
            description_selectors: compile(&config.selectors.description),
            designer_selectors: compile(&config.selectors.designer),
            images: ImageRules::from_config(config),
        }
    }

    /// Synchronous extraction; `None` when no name selector yields text
    pub fn extract_record(
        &self,
        markup: &str,
        page_url: &Url,
        category: &str,
    ) -> Option<ProductRecord> {
        let document = Html::parse_document(markup);

        let product_name = title_case(&first_text(&document, &self.name_selectors)?);
        if product_name.trim().is_empty() {
            return None;
        }

        let description = first_text(&document, &self.description_selectors).unwrap_or_default();

        let designer_name = first_text(&document, &self.designer_selectors)
            .map(|text| clean_designer(&text))
            .filter(|text| !text.is_empty())
            .or_else(|| designer_from_text(&visible_lines(&document)))
            .unwrap_or_default();

        let image_urls = collect_images(&document, page_url, &product_name, &self.images);

        Some(ProductRecord {
            product_name,
            description,
            product_url: page_url.to_string(),
            designer_name,
            image_urls,
            furniture_type: title_case(category.trim()),
        })
    }
}

#[async_trait]
impl ExtractionStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn extract(&self, markup: &str, page_url: &Url, category: &str) -> Option<ProductRecord> {
        self.extract_record(markup, page_url, category)
    }
}
