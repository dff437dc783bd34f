//! Scripted page fetching
//!
//! Client-rendered catalogs only contain product markup after their scripts
//! have run. This module defines the contract the crawler needs from a
//! browser engine and, behind the `browser` cargo feature, an implementation
//! driving headless Chromium through `chromiumoxide`.
//!
//! One [`BrowserContext`] is launched per crawl, reused for every page of
//! that crawl, and owned by a [`BrowserSession`] that closes it exactly once.

use crate::config::Config;
use crate::crawler::fetcher::{FetchResult, PageSource};
use crate::ScrapeError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Script returning every anchor of the rendered document
pub const LINKS_SCRIPT: &str = r#"
    Array.from(document.querySelectorAll('a[href]')).map(a => ({
        url: a.href,
        text: (a.innerText || a.textContent || '').trim(),
        classes: a.getAttribute('class') || ''
    }))
"#;

/// An anchor as seen by the rendered document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawLink {
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub classes: String,
}

/// A page opened inside a browser context
#[async_trait]
pub trait RenderedPage: Send + Sync {
    /// Waits for `selector` to appear, or for `max_wait` when no selector is
    /// given. Returns true when the selector appeared.
    async fn wait_for_settle(&self, selector: Option<&str>, max_wait: Duration) -> bool;

    /// Serialized markup of the rendered document
    async fn content(&self) -> Result<String, ScrapeError>;

    /// All anchors of the rendered document, with absolute URLs
    async fn links(&self) -> Result<Vec<RawLink>, ScrapeError>;

    async fn close(&self);
}

/// One browser session, exclusively owned by a single crawl
#[async_trait]
pub trait BrowserContext: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Box<dyn RenderedPage>, ScrapeError>;

    async fn close(&self);
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserContext>, ScrapeError>;
}

/// How long to let a freshly opened page settle
#[derive(Debug, Clone)]
pub struct SettlePolicy {
    /// Fixed delay after navigation
    pub settle_delay: Duration,
    /// Selectors awaited in order; the first one that appears ends the wait
    pub selectors: Vec<String>,
    /// Maximum wait per selector
    pub selector_wait: Duration,
}

impl SettlePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            settle_delay: Duration::from_millis(config.crawler.settle_delay_ms),
            selectors: config.selectors.settle.clone(),
            selector_wait: Duration::from_millis(config.crawler.selector_wait_ms),
        }
    }

    /// Applies the policy to an open page
    pub async fn settle(&self, page: &dyn RenderedPage) {
        page.wait_for_settle(None, self.settle_delay).await;

        for selector in &self.selectors {
            if page.wait_for_settle(Some(selector), self.selector_wait).await {
                tracing::debug!("Page settled on selector {}", selector);
                return;
            }
        }
    }
}

/// Runs a close future on the current runtime, if one is still running
fn close_in_background<F>(close: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(close);
        }
        Err(_) => tracing::warn!("No runtime left to close a browser resource"),
    }
}

/// Exclusive owner of one crawl's browser context
///
/// [`BrowserSession::close`] is the normal way out. A session dropped
/// without it (a panic, or the crawl future being cancelled) closes the
/// context on a background task instead.
pub struct BrowserSession {
    context: Arc<dyn BrowserContext>,
    closed: bool,
}

impl BrowserSession {
    pub fn new(context: Box<dyn BrowserContext>) -> Self {
        Self {
            context: Arc::from(context),
            closed: false,
        }
    }

    pub fn context(&self) -> &dyn BrowserContext {
        self.context.as_ref()
    }

    pub async fn close(mut self) {
        self.context.close().await;
        self.closed = true;
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        tracing::warn!("Browser session abandoned, closing it in the background");
        let context = Arc::clone(&self.context);
        close_in_background(async move { context.close().await });
    }
}

/// Open page that is closed however its scope ends
struct PageGuard {
    page: Arc<dyn RenderedPage>,
    closed: bool,
}

impl PageGuard {
    fn new(page: Box<dyn RenderedPage>) -> Self {
        Self {
            page: Arc::from(page),
            closed: false,
        }
    }

    async fn close(mut self) {
        self.page.close().await;
        self.closed = true;
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if !self.closed {
            let page = Arc::clone(&self.page);
            close_in_background(async move { page.close().await });
        }
    }
}

/// Opens `url` in `context`, lets it settle, and hands the page to `f`
///
/// The page is closed on every path: when `f` fails, panics, or the
/// returned future is dropped before completion.
pub async fn with_rendered_page<T, F, Fut>(
    context: &dyn BrowserContext,
    url: &Url,
    settle: &SettlePolicy,
    f: F,
) -> Result<T, ScrapeError>
where
    F: FnOnce(Arc<dyn RenderedPage>) -> Fut,
    Fut: std::future::Future<Output = Result<T, ScrapeError>>,
{
    let guard = PageGuard::new(context.open(url).await?);
    settle.settle(guard.page.as_ref()).await;
    let result = f(Arc::clone(&guard.page)).await;
    guard.close().await;
    result
}

/// [`PageSource`] backed by a browser context
///
/// Every fetch opens a fresh page in the shared context, settles it, reads
/// the rendered markup, and closes the page again.
pub struct RenderedSource<'a> {
    context: &'a dyn BrowserContext,
    settle: SettlePolicy,
}

impl<'a> RenderedSource<'a> {
    pub fn new(context: &'a dyn BrowserContext, settle: SettlePolicy) -> Self {
        Self { context, settle }
    }

    pub fn context(&self) -> &'a dyn BrowserContext {
        self.context
    }

    pub fn settle_policy(&self) -> &SettlePolicy {
        &self.settle
    }
}

#[async_trait]
impl<'a> PageSource for RenderedSource<'a> {
    async fn fetch_markup(&self, url: &Url) -> FetchResult {
        let result = with_rendered_page(self.context, url, &self.settle, |page| async move {
            page.content().await
        })
        .await;

        match result {
            Ok(body) => FetchResult::Success {
                final_url: url.clone(),
                status_code: 200,
                body,
            },
            Err(e) => FetchResult::NetworkError {
                error: e.to_string(),
            },
        }
    }
}

/// Returns the launcher compiled into this build, if any
pub fn default_launcher(config: &Config) -> Option<Arc<dyn BrowserLauncher>> {
    #[cfg(feature = "browser")]
    {
        Some(Arc::new(chromium::ChromiumLauncher::new(
            config.user_agent.value.clone(),
        )))
    }

    #[cfg(not(feature = "browser"))]
    {
        let _ = config;
        None
    }
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumLauncher;

#[cfg(feature = "browser")]
mod chromium {
    use super::{BrowserContext, BrowserLauncher, RawLink, RenderedPage, LINKS_SCRIPT};
    use crate::ScrapeError;
    use async_trait::async_trait;
    use chromiumoxide::{Browser, BrowserConfig, Page};
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use url::Url;

    fn browser_error(context: &str, e: impl std::fmt::Display) -> ScrapeError {
        ScrapeError::Browser(format!("{}: {}", context, e))
    }

    /// Launches headless Chromium
    #[derive(Debug, Clone)]
    pub struct ChromiumLauncher {
        user_agent: String,
    }

    impl ChromiumLauncher {
        pub fn new(user_agent: String) -> Self {
            Self { user_agent }
        }
    }

    #[async_trait]
    impl BrowserLauncher for ChromiumLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserContext>, ScrapeError> {
            let config = BrowserConfig::builder()
                .arg("--no-sandbox")
                .arg("--disable-setuid-sandbox")
                .arg("--disable-dev-shm-usage")
                .arg("--disable-gpu")
                .arg(format!("--user-agent={}", self.user_agent))
                .build()
                .map_err(|e| browser_error("Failed to build browser config", e))?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| browser_error("Failed to launch browser", e))?;

            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            tracing::info!("Launched headless browser");

            Ok(Box::new(ChromiumContext {
                browser: Mutex::new(Some(browser)),
                handler_task,
            }))
        }
    }

    struct ChromiumContext {
        browser: Mutex<Option<Browser>>,
        handler_task: JoinHandle<()>,
    }

    #[async_trait]
    impl BrowserContext for ChromiumContext {
        async fn open(&self, url: &Url) -> Result<Box<dyn RenderedPage>, ScrapeError> {
            let guard = self.browser.lock().await;
            let browser = guard
                .as_ref()
                .ok_or_else(|| ScrapeError::Browser("browser already closed".to_string()))?;

            let page = browser
                .new_page(url.as_str())
                .await
                .map_err(|e| browser_error("Failed to open page", e))?;

            // Best effort; slow pages are still read after the settle delay
            let _ = tokio::time::timeout(Duration::from_secs(10), page.wait_for_navigation()).await;

            Ok(Box::new(ChromiumPage { page }))
        }

        async fn close(&self) {
            if let Some(mut browser) = self.browser.lock().await.take() {
                if let Err(e) = browser.close().await {
                    tracing::warn!("Browser close error: {}", e);
                }
                let _ = browser.wait().await;
            }
            self.handler_task.abort();
            tracing::info!("Closed headless browser");
        }
    }

    struct ChromiumPage {
        page: Page,
    }

    #[async_trait]
    impl RenderedPage for ChromiumPage {
        async fn wait_for_settle(&self, selector: Option<&str>, max_wait: Duration) -> bool {
            match selector {
                Some(selector) => matches!(
                    tokio::time::timeout(max_wait, self.page.find_element(selector)).await,
                    Ok(Ok(_))
                ),
                None => {
                    tokio::time::sleep(max_wait).await;
                    true
                }
            }
        }

        async fn content(&self) -> Result<String, ScrapeError> {
            self.page
                .content()
                .await
                .map_err(|e| browser_error("Failed to read content", e))
        }

        async fn links(&self) -> Result<Vec<RawLink>, ScrapeError> {
            self.page
                .evaluate(LINKS_SCRIPT.to_string())
                .await
                .map_err(|e| browser_error("Link script failed", e))?
                .into_value::<Vec<RawLink>>()
                .map_err(|e| browser_error("Unexpected link script result", e))
        }

        async fn close(&self) {
            if let Err(e) = self.page.clone().close().await {
                tracing::debug!("Page close error: {}", e);
            }
        }
    }
}
