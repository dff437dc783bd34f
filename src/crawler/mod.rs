//! Crawler module for site analysis, link discovery and page fetching
//!
//! This module contains the core crawling logic, including:
//! - Plain HTTP and scripted browser page fetching
//! - Strategy analysis of a site's front page
//! - Category and product link discovery
//! - Brand name to site resolution
//! - Overall crawl coordination

mod analyzer;
mod browser;
mod coordinator;
mod discovery;
mod fetcher;
mod resolver;

pub use analyzer::StrategyAnalyzer;
pub use browser::{
    default_launcher, with_rendered_page, BrowserContext, BrowserLauncher, BrowserSession,
    RawLink, RenderedPage, RenderedSource, SettlePolicy, LINKS_SCRIPT,
};
#[cfg(feature = "browser")]
pub use browser::ChromiumLauncher;
pub use coordinator::{Coordinator, CrawlReport};
pub use discovery::LinkDiscoverer;
pub use fetcher::{build_http_client, fetch_url, FetchResult, PageSource, PlainFetcher};
pub use resolver::{resolve_target, BrandResolver, ConfigBrandResolver};
