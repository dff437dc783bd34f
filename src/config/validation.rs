use crate::config::types::{AiConfig, Config, CrawlerConfig, MergeConfig, SelectorConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent(&config.user_agent.value)?;
    validate_selectors(&config.selectors)?;
    validate_ai_config(&config.ai)?;
    validate_merge_config(&config.merge)?;
    validate_brands(config)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 || config.request_timeout_secs > 120 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 120, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_concurrent_sites < 1 || config.max_concurrent_sites > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_sites must be between 1 and 16, got {}",
            config.max_concurrent_sites
        )));
    }

    if config.max_products == Some(0) {
        return Err(ConfigError::Validation(
            "max_products must be >= 1 when set".to_string(),
        ));
    }

    if config.crawl_deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "crawl_deadline_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent(value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates that every selector list parses and keyword lists are usable
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    let css_lists = [
        ("category", &config.category),
        ("product", &config.product),
        ("name", &config.name),
        ("description", &config.description),
        ("designer", &config.designer),
        ("settle", &config.settle),
    ];

    for (list, selectors) in css_lists {
        for selector in selectors {
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::InvalidSelector {
                    list: list.to_string(),
                    selector: selector.clone(),
                });
            }
        }
    }

    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "at least one name selector is required".to_string(),
        ));
    }

    if config.image_attributes.iter().any(|a| a.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "image attributes cannot be empty".to_string(),
        ));
    }

    let keyword_lists = [
        ("framework-signatures", &config.framework_signatures),
        ("furniture-indicators", &config.furniture_indicators),
        ("common-endings", &config.common_endings),
        ("generic-content-keywords", &config.generic_content_keywords),
        ("image-blacklist", &config.image_blacklist),
    ];

    for (list, keywords) in keyword_lists {
        if keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "{} cannot contain empty keywords",
                list
            )));
        }
    }

    Ok(())
}

fn validate_ai_config(config: &AiConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid ai base_url: {}", e)))?;

    if config.max_markup_chars < 100 {
        return Err(ConfigError::Validation(format!(
            "max_markup_chars must be >= 100, got {}",
            config.max_markup_chars
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation(
            "ai model cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_merge_config(config: &MergeConfig) -> Result<(), ConfigError> {
    if config.threshold > 100 {
        return Err(ConfigError::Validation(format!(
            "merge threshold must be between 0 and 100, got {}",
            config.threshold
        )));
    }

    if config.name_column.is_empty() || config.type_column.is_empty() {
        return Err(ConfigError::Validation(
            "merge name_column and type_column cannot be empty".to_string(),
        ));
    }

    if config.probe_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "probe_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Brand directory entries must point at absolute http(s) URLs
fn validate_brands(config: &Config) -> Result<(), ConfigError> {
    for (brand, site) in &config.brands {
        let url = Url::parse(site).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid URL for brand '{}': {}", brand, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "URL for brand '{}' must use http or https",
                brand
            )));
        }
    }

    Ok(())
}
