//! HTTP fetcher implementation
//!
//! This module handles all plain-mode requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests with a per-request timeout
//! - Error classification into [`FetchResult`] variants
//!
//! Fetch failures are values, not errors: the coordinator logs and skips them.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Response is not a markup document
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-2xx HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns the body of a successful fetch
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Short description of a failed fetch for log lines
    pub fn describe(&self) -> String {
        match self {
            Self::Success { status_code, .. } => format!("HTTP {}", status_code),
            Self::ContentMismatch { content_type } => {
                format!("unexpected content type {}", content_type)
            }
            Self::HttpError { status_code } => format!("HTTP {}", status_code),
            Self::NetworkError { error } => error.clone(),
        }
    }
}

/// Anything that can turn a URL into page markup
///
/// Implemented by the plain HTTP fetcher and by rendered browser contexts so
/// that discovery code does not care which fetch mode is active.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_markup(&self, url: &Url) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use furnish_scout::config::Config;
/// use furnish_scout::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.value.clone())
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true if a Content-Type header can carry page markup
///
/// A missing header is accepted; many small shops omit it.
fn is_markup_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.starts_with("text/")
}

/// Fetches a URL with error classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with markup body | `Success` |
/// | 2xx with image/pdf/... | `ContentMismatch` |
/// | non-2xx | `HttpError` |
/// | timeout / connection failure | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &Url, timeout: Duration) -> FetchResult {
    match client.get(url.as_str()).timeout(timeout).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().clone();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();

            if !is_markup_content_type(&content_type) {
                return FetchResult::ContentMismatch { content_type };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                },
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchResult::NetworkError {
                    error: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchResult::NetworkError {
                    error: "Connection refused".to_string(),
                }
            } else {
                FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Plain-mode page fetcher: one HTTP GET per page, no script execution
#[derive(Debug, Clone)]
pub struct PlainFetcher {
    client: Client,
    timeout: Duration,
}

impl PlainFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            Duration::from_secs(config.crawler.request_timeout_secs),
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetches with an explicit timeout, overriding the configured one
    pub async fn get(&self, url: &Url, timeout: Duration) -> FetchResult {
        fetch_url(&self.client, url, timeout).await
    }
}

#[async_trait]
impl PageSource for PlainFetcher {
    async fn fetch_markup(&self, url: &Url) -> FetchResult {
        fetch_url(&self.client, url, self.timeout).await
    }
}
