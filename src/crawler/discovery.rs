//! Link discovery
//!
//! Turns pages into category and product candidates:
//! - category links grouped by a synonym-expanded vocabulary
//! - product links filtered by selector priority and path shape
//!
//! Candidates already in the crawl's [`SeenLinkSet`] are skipped. The
//! coordinator claims a product only when it fetches it, so a product cut
//! by a category cap can still turn up under a later category.

use crate::config::Config;
use crate::crawler::browser::{with_rendered_page, BrowserContext, RawLink, SettlePolicy};
use crate::crawler::fetcher::{FetchResult, PageSource};
use crate::model::CategoryMap;
use crate::state::SeenLinkSet;
use crate::url::{is_product_path, resolve_href, same_site};
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Built-in category vocabulary, English and Italian
const BUILTIN_SYNONYMS: &[(&str, &[&str])] = &[
    ("sofa", &["sofa", "sofas", "divano", "divani", "couch"]),
    ("armchair", &["armchair", "armchairs", "poltrona", "poltrone"]),
    ("chair", &["chair", "chairs", "sedia", "sedie"]),
    ("table", &["table", "tables", "tavolo", "tavoli", "tavolino"]),
    ("bed", &["bed", "beds", "letto", "letti"]),
    ("lamp", &["lamp", "lamps", "lighting", "lampada", "lampade", "illuminazione"]),
    ("storage", &["storage", "cabinet", "sideboard", "madia", "contenitori"]),
    ("bookshelf", &["bookshelf", "bookcase", "shelving", "libreria", "librerie"]),
    ("rug", &["rug", "rugs", "carpet", "tappeto", "tappeti"]),
    ("outdoor", &["outdoor", "garden", "esterno", "giardino"]),
    ("ottoman", &["ottoman", "ottomans", "pouf", "pouffe"]),
    ("bench", &["bench", "benches", "panca", "panche"]),
];

/// A selector kept together with its source text for log lines
#[derive(Debug, Clone)]
struct NamedSelector {
    source: String,
    selector: Selector,
}

fn compile_selectors(list: &str, sources: &[String]) -> Vec<NamedSelector> {
    sources
        .iter()
        .filter_map(|source| match Selector::parse(source) {
            Ok(selector) => Some(NamedSelector {
                source: source.clone(),
                selector,
            }),
            Err(_) => {
                tracing::warn!("Skipping invalid {} selector '{}'", list, source);
                None
            }
        })
        .collect()
}

fn anchor_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifies links into categories and products
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    category_selectors: Vec<NamedSelector>,
    product_selectors: Vec<NamedSelector>,
    synonyms: BTreeMap<String, Vec<String>>,
    common_endings: Vec<String>,
    generic_keywords: Vec<String>,
}

impl LinkDiscoverer {
    /// Builds a discoverer from the selector lists and synonym table
    ///
    /// Configured synonyms replace the built-in entry for the same key.
    pub fn from_config(config: &Config) -> Self {
        let mut synonyms: BTreeMap<String, Vec<String>> = BUILTIN_SYNONYMS
            .iter()
            .map(|(key, words)| {
                (
                    key.to_string(),
                    words.iter().map(|w| w.to_string()).collect(),
                )
            })
            .collect();

        for (key, words) in &config.synonyms {
            let words: Vec<String> = words
                .iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect();
            if !words.is_empty() {
                synonyms.insert(key.trim().to_lowercase(), words);
            }
        }

        Self {
            category_selectors: compile_selectors("category", &config.selectors.category),
            product_selectors: compile_selectors("product", &config.selectors.product),
            synonyms,
            common_endings: config.selectors.common_endings.clone(),
            generic_keywords: config
                .selectors
                .generic_content_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        }
    }

    /// Synonym set for a category; unknown categories match themselves
    pub fn synonyms_for(&self, category: &str) -> Vec<String> {
        let key = category.trim().to_lowercase();
        self.synonyms.get(&key).cloned().unwrap_or_else(|| vec![key])
    }

    /// Category keys to search for, in caller order
    ///
    /// Without candidates the whole vocabulary is searched.
    fn category_keys(&self, candidates: &[String]) -> Vec<(String, Vec<String>)> {
        if candidates.is_empty() {
            return self
                .synonyms
                .iter()
                .map(|(key, words)| (key.clone(), words.clone()))
                .collect();
        }

        let mut keys: Vec<(String, Vec<String>)> = Vec::new();
        for candidate in candidates {
            let key = candidate.trim().to_lowercase();
            if key.is_empty() || keys.iter().any(|(k, _)| *k == key) {
                continue;
            }
            let words = self.synonyms_for(&key);
            keys.push((key, words));
        }
        keys
    }

    /// Groups the category links of already fetched markup
    ///
    /// Pure with respect to `seen`: URLs already in the set are skipped but
    /// nothing is inserted, so the same page and set always give the same map.
    pub fn categorize_links(
        &self,
        markup: &str,
        site: &Url,
        candidates: &[String],
        seen: &SeenLinkSet,
    ) -> CategoryMap {
        let document = Html::parse_document(markup);
        let keys = self.category_keys(candidates);

        let mut page_links: HashSet<Url> = HashSet::new();
        let mut found: Vec<(Url, String)> = Vec::new();

        for named in &self.category_selectors {
            for element in document.select(&named.selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                let Some(url) = resolve_href(href, site) else {
                    continue;
                };
                if !same_site(&url, site) || seen.contains(&url) || !page_links.insert(url.clone())
                {
                    continue;
                }
                found.push((url, anchor_text(&element).to_lowercase()));
            }
        }

        tracing::debug!("Found {} candidate category links on {}", found.len(), site);

        let mut categories = CategoryMap::new();
        for (url, text) in &found {
            let url_lower = url.as_str().to_lowercase();
            for (key, words) in &keys {
                let matched = words
                    .iter()
                    .any(|w| url_lower.contains(w.as_str()) || text.contains(w.as_str()));
                if matched {
                    let urls = categories.entry(key.clone()).or_default();
                    if !urls.contains(url) {
                        urls.push(url.clone());
                    }
                }
            }
        }

        categories
    }

    /// Fetches the site's front page and groups its category links
    ///
    /// When the front page cannot be fetched at all, every requested category
    /// (or every built-in one) maps to the site URL itself.
    pub async fn discover_categories(
        &self,
        source: &dyn PageSource,
        site: &Url,
        candidates: &[String],
        seen: &SeenLinkSet,
    ) -> CategoryMap {
        match source.fetch_markup(site).await {
            FetchResult::Success { body, .. } => {
                let categories = self.categorize_links(&body, site, candidates, seen);
                tracing::info!(
                    "Discovered {} categories on {}: {:?}",
                    categories.len(),
                    site,
                    categories.keys().collect::<Vec<_>>()
                );
                categories
            }
            failure => {
                tracing::warn!(
                    "Category discovery failed for {} ({}), falling back to the site URL",
                    site,
                    failure.describe()
                );
                self.category_keys(candidates)
                    .into_iter()
                    .map(|(key, _)| (key, vec![site.clone()]))
                    .collect()
            }
        }
    }

    /// Selects product links from already fetched markup
    ///
    /// Selectors are tried in priority order. A selector decides the result
    /// only once it contributes an accepted URL (new, same-site and
    /// product-shaped); one matching nothing but rejected links falls through
    /// to the next selector. `seen` is read, never written: the caller claims
    /// the products it actually takes.
    pub fn select_product_links(&self, markup: &str, page: &Url, seen: &SeenLinkSet) -> Vec<Url> {
        let document = Html::parse_document(markup);

        for named in &self.product_selectors {
            let mut accepted = Vec::new();
            let mut page_links = HashSet::new();

            for element in document.select(&named.selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if let Some(url) = self.accept_product(href, page, seen, &mut page_links) {
                    accepted.push(url);
                }
            }

            if !accepted.is_empty() {
                tracing::debug!(
                    "Selector '{}' yielded {} products on {}",
                    named.source,
                    accepted.len(),
                    page
                );
                return accepted;
            }
        }

        Vec::new()
    }

    /// Plain-mode product discovery
    pub async fn discover_products(
        &self,
        source: &dyn PageSource,
        page: &Url,
        seen: &SeenLinkSet,
    ) -> Vec<Url> {
        match source.fetch_markup(page).await {
            FetchResult::Success { body, .. } => {
                let products = self.select_product_links(&body, page, seen);
                tracing::info!("Discovered {} product URLs on {}", products.len(), page);
                products
            }
            failure => {
                tracing::warn!(
                    "Skipping category page {} ({})",
                    page,
                    failure.describe()
                );
                Vec::new()
            }
        }
    }

    /// Scripted-mode product discovery
    ///
    /// Runs the selector list against the rendered document; if nothing is
    /// accepted, every rendered anchor whose URL mentions a generic content
    /// keyword is considered instead.
    pub async fn discover_products_rendered(
        &self,
        context: &dyn BrowserContext,
        page: &Url,
        settle: &SettlePolicy,
        seen: &SeenLinkSet,
    ) -> Vec<Url> {
        let result = with_rendered_page(context, page, settle, |rendered| async move {
            let markup = rendered.content().await?;
            let products = self.select_product_links(&markup, page, seen);
            if !products.is_empty() {
                return Ok(products);
            }
            let links = rendered.links().await?;
            Ok(self.filter_generic_links(&links, page, seen))
        })
        .await;

        match result {
            Ok(products) => {
                tracing::info!("Discovered {} product URLs on {}", products.len(), page);
                products
            }
            Err(e) => {
                tracing::warn!("Skipping rendered category page {}: {}", page, e);
                Vec::new()
            }
        }
    }

    /// Fallback over all rendered anchors
    fn filter_generic_links(&self, links: &[RawLink], page: &Url, seen: &SeenLinkSet) -> Vec<Url> {
        let mut products = Vec::new();
        let mut page_links = HashSet::new();
        for link in links {
            let href = link.url.to_lowercase();
            if !self.generic_keywords.iter().any(|k| href.contains(k.as_str())) {
                continue;
            }
            if let Some(url) = self.accept_product(&link.url, page, seen, &mut page_links) {
                products.push(url);
            }
        }

        if !products.is_empty() {
            tracing::debug!(
                "Generic anchor scan yielded {} products on {}",
                products.len(),
                page
            );
        }
        products
    }

    /// Resolves and filters one product candidate
    ///
    /// Skips URLs already in `seen` or already accepted from this page.
    fn accept_product(
        &self,
        href: &str,
        page: &Url,
        seen: &SeenLinkSet,
        page_links: &mut HashSet<Url>,
    ) -> Option<Url> {
        let url = resolve_href(href, page)?;
        if !same_site(&url, page)
            || !is_product_path(&url, &self.common_endings)
            || seen.contains(&url)
            || !page_links.insert(url.clone())
        {
            return None;
        }
        Some(url)
    }
}
