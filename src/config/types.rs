use serde::Deserialize;
use std::collections::BTreeMap;

/// Default browser-like user agent; many retailers refuse obvious bot agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Main configuration structure for Furnish-Scout
///
/// Every section is optional in the TOML file; missing keys fall back to the
/// built-in heuristics.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// Extra category synonyms, merged over the built-in table
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    /// Brand name -> official site URL
    #[serde(default)]
    pub brands: BTreeMap<String, String>,
}

/// How strictly product images are filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFilter {
    /// Reject blacklisted URLs and URLs not mentioning the product name
    #[default]
    Strict,
    /// Reject blacklisted URLs only
    Lenient,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Timeout for plain HTTP fetches (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Flat delay applied after every product fetch (milliseconds)
    #[serde(rename = "pacing-delay-ms")]
    pub pacing_delay_ms: u64,

    /// Delay after navigation before reading a rendered page (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Maximum wait for each settle selector (milliseconds)
    #[serde(rename = "selector-wait-ms")]
    pub selector_wait_ms: u64,

    /// Default product cap per category when the caller gives none
    #[serde(rename = "max-products")]
    pub max_products: Option<usize>,

    /// Overall crawl deadline (seconds)
    #[serde(rename = "crawl-deadline-secs")]
    pub crawl_deadline_secs: Option<u64>,

    /// Number of sites crawled at the same time in batch mode
    #[serde(rename = "max-concurrent-sites")]
    pub max_concurrent_sites: u32,

    #[serde(rename = "image-filter")]
    pub image_filter: ImageFilter,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            pacing_delay_ms: 2000,
            settle_delay_ms: 2000,
            selector_wait_ms: 3000,
            max_products: None,
            crawl_deadline_secs: None,
            max_concurrent_sites: 2,
            image_filter: ImageFilter::Strict,
        }
    }
}

/// User agent configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Selector and keyword lists driving discovery and extraction
///
/// Lists are tried in order; earlier entries have priority.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub category: Vec<String>,
    pub product: Vec<String>,
    pub name: Vec<String>,
    pub description: Vec<String>,
    pub designer: Vec<String>,
    /// Selectors awaited on rendered pages before reading content
    pub settle: Vec<String>,
    /// `<img>` attributes holding the source, in priority order
    #[serde(rename = "image-attributes")]
    pub image_attributes: Vec<String>,
    #[serde(rename = "framework-signatures")]
    pub framework_signatures: Vec<String>,
    #[serde(rename = "furniture-indicators")]
    pub furniture_indicators: Vec<String>,
    /// Last path segments that mark listing pages rather than products
    #[serde(rename = "common-endings")]
    pub common_endings: Vec<String>,
    #[serde(rename = "generic-content-keywords")]
    pub generic_content_keywords: Vec<String>,
    #[serde(rename = "image-blacklist")]
    pub image_blacklist: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            category: strings(&[
                "a[href*=\"category\"]",
                "a[href*=\"categorie\"]",
                "a[href*=\"collection\"]",
                "a[href*=\"products\"]",
                "a[href*=\"prodotti\"]",
                "a[href*=\"sofa\"]",
                "a[href*=\"armchair\"]",
                ".category a",
                ".collection a",
                ".product-category a",
                "nav a",
                ".nav a",
                ".menu a",
                ".navigation a",
                "a[class*=\"category\"]",
                "a[class*=\"collection\"]",
                "a[href*=\"product\"]",
            ]),
            product: strings(&[
                "a[href*=\"product\"]",
                "a[href*=\"item\"]",
                "a[href*=\"furniture\"]",
                ".product-link",
                ".item-link",
                ".product a",
                ".item a",
                "a[class*=\"product\"]",
                "a[class*=\"item\"]",
            ]),
            name: strings(&[
                "h1",
                "h2",
                ".product-title",
                ".product-name",
                ".title",
                ".name",
                "[class*=\"title\"]",
                "[class*=\"name\"]",
            ]),
            description: strings(&[
                ".description",
                ".product-description",
                ".product-info",
                ".details",
                ".content",
                "[class*=\"description\"]",
            ]),
            designer: strings(&[
                ".designer",
                ".brand",
                ".author",
                ".by",
                "[class*=\"designer\"]",
                "[class*=\"brand\"]",
            ]),
            settle: strings(&[
                ".product",
                ".item",
                "article",
                ".content",
                "[class*=\"product\"]",
                "[class*=\"item\"]",
            ]),
            image_attributes: strings(&[
                "src",
                "data-src",
                "data-lazy",
                "data-original",
                "data-lazy-src",
            ]),
            framework_signatures: strings(&["vue", "react", "angular", "nuxt"]),
            furniture_indicators: strings(&[
                "product",
                "item",
                "catalog",
                "furniture",
                "sofa",
                "chair",
                "table",
                "collection",
                "designer",
                "brand",
                "category",
            ]),
            common_endings: strings(&[
                "collection",
                "collections",
                "catalog",
                "catalogue",
                "shop",
                "products",
                "product",
                "category",
                "categories",
                "all",
                "sale",
                "new",
                "index",
            ]),
            generic_content_keywords: strings(&["product", "item", "detail"]),
            image_blacklist: strings(&["svg", "icon", "logo", "gif", "placeholder", "favicon"]),
        }
    }
}

/// Optional AI-assisted extraction
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    pub model: String,

    /// Markup prefix sent to the model (characters)
    #[serde(rename = "max-markup-chars")]
    pub max_markup_chars: usize,

    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_markup_chars: 4000,
            max_tokens: 1000,
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Minimum token-set similarity (0-100) for two names to match
    pub threshold: u8,

    /// camelCase name of the name-like column
    #[serde(rename = "name-column")]
    pub name_column: String,

    /// camelCase name of the type-like column
    #[serde(rename = "type-column")]
    pub type_column: String,

    /// Probe product and image URLs over the network during validation
    #[serde(rename = "check-reachability")]
    pub check_reachability: bool,

    #[serde(rename = "probe-timeout-secs")]
    pub probe_timeout_secs: u64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            threshold: 95,
            name_column: "productName".to_string(),
            type_column: "furnitureType".to_string(),
            check_reachability: true,
            probe_timeout_secs: 5,
        }
    }
}
