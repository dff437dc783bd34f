//! Product image selection

use crate::config::{Config, ImageFilter};
use crate::url::resolve_href;
use scraper::{Html, Selector};
use url::Url;

/// Rules deciding which `<img>` sources belong to a product
#[derive(Debug, Clone)]
pub struct ImageRules {
    /// Attributes read in priority order
    pub attributes: Vec<String>,
    /// Lowercase keywords that disqualify a URL
    pub blacklist: Vec<String>,
    pub filter: ImageFilter,
}

impl ImageRules {
    pub fn from_config(config: &Config) -> Self {
        Self {
            attributes: config.selectors.image_attributes.clone(),
            blacklist: config
                .selectors
                .image_blacklist
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            filter: config.crawler.image_filter,
        }
    }
}

/// Returns true if `src` may be stored as an image of `product_name`
///
/// Blacklisted URLs (icons, logos, vector art...) are always rejected. With
/// [`ImageFilter::Strict`] the URL must also mention the first word of the
/// product name, which keeps unrelated banners off the record.
///
/// ```
/// use furnish_scout::config::ImageFilter;
/// use furnish_scout::extract::is_valid_image_src;
///
/// let blacklist = vec!["logo".to_string(), "svg".to_string()];
/// assert!(is_valid_image_src("/img/velvet-sofa.jpg", "Velvet Sofa", &blacklist, ImageFilter::Strict));
/// assert!(!is_valid_image_src("/img/logo.png", "Velvet Sofa", &blacklist, ImageFilter::Lenient));
/// assert!(!is_valid_image_src("/img/banner.jpg", "Velvet Sofa", &blacklist, ImageFilter::Strict));
/// ```
pub fn is_valid_image_src(
    src: &str,
    product_name: &str,
    blacklist: &[String],
    filter: ImageFilter,
) -> bool {
    let src = src.trim().to_lowercase();
    if src.is_empty() || src.starts_with("data:") {
        return false;
    }

    if blacklist.iter().any(|keyword| src.contains(keyword.as_str())) {
        return false;
    }

    match filter {
        ImageFilter::Lenient => true,
        ImageFilter::Strict => match product_name.split_whitespace().next() {
            Some(token) => src.contains(&token.to_lowercase()),
            None => false,
        },
    }
}

/// Collects the product images of a page in document order, deduplicated
pub fn collect_images(
    document: &Html,
    page_url: &Url,
    product_name: &str,
    rules: &ImageRules,
) -> Vec<String> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    let mut images: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        let src = rules.attributes.iter().find_map(|attr| {
            element
                .value()
                .attr(attr)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        });

        let Some(src) = src else {
            continue;
        };
        let Some(url) = resolve_href(src, page_url) else {
            continue;
        };
        let url = url.to_string();

        if is_valid_image_src(&url, product_name, &rules.blacklist, rules.filter)
            && !images.contains(&url)
        {
            images.push(url);
        }
    }

    images
}
