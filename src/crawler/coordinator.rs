//! Crawler coordinator - main crawl orchestration logic
//!
//! One call to [`Coordinator::scrape`] is one independent crawl of one site:
//! - analyze the front page once and pick a fetch mode
//! - discover category pages, then product pages per category
//! - fetch and extract every product with a flat pacing delay
//! - aggregate the category -> products result and a summary
//!
//! Every crawl owns its own [`SeenLinkSet`] and, in scripted mode, its own
//! browser session, so several crawls can run side by side through
//! [`Coordinator::scrape_many`].

use crate::config::Config;
use crate::crawler::analyzer::StrategyAnalyzer;
use crate::crawler::browser::{
    default_launcher, BrowserContext, BrowserLauncher, BrowserSession, RenderedSource,
    SettlePolicy,
};
use crate::crawler::discovery::LinkDiscoverer;
use crate::crawler::fetcher::{FetchResult, PageSource, PlainFetcher};
use crate::extract::ContentExtractor;
use crate::model::{FetchMode, ProductRecord, SiteProfile};
use crate::output::CrawlSummary;
use crate::state::{CrawlPhase, CrawlTracker, SeenLinkSet};
use crate::{Result, ScrapeError};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use url::Url;

/// Everything one crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub site: Url,
    pub profile: SiteProfile,
    /// Fetch mode actually used, after any browser fallback
    pub fetch_mode: FetchMode,
    /// Category -> extracted records; categories without products map to an
    /// empty list
    pub results: BTreeMap<String, Vec<ProductRecord>>,
    pub summary: CrawlSummary,
    pub phases: Vec<CrawlPhase>,
}

impl CrawlReport {
    /// All records of the crawl, category by category
    pub fn records(&self) -> Vec<ProductRecord> {
        self.results.values().flatten().cloned().collect()
    }
}

/// Per-crawl mutable state
struct CrawlSession {
    seen: SeenLinkSet,
    deadline: Option<Instant>,
    deadline_reached: bool,
    failed_products: usize,
}

impl CrawlSession {
    fn new(deadline: Option<Duration>) -> Self {
        Self {
            seen: SeenLinkSet::new(),
            deadline: deadline.map(|d| Instant::now() + d),
            deadline_reached: false,
            failed_products: 0,
        }
    }

    /// True once the overall deadline has passed; logged once
    fn out_of_time(&mut self) -> bool {
        if self.deadline_reached {
            return true;
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            tracing::warn!("Crawl deadline reached, returning partial results");
            self.deadline_reached = true;
        }
        self.deadline_reached
    }
}

/// Splits a product cap evenly over `pages` category pages
///
/// The remainder goes to the first pages, so the shares always add up to
/// `max`.
fn page_shares(max: usize, pages: usize) -> Vec<usize> {
    let pages = pages.max(1);
    (0..pages)
        .map(|i| max / pages + usize::from(i < max % pages))
        .collect()
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: PlainFetcher,
    analyzer: StrategyAnalyzer,
    discoverer: LinkDiscoverer,
    extractor: ContentExtractor,
    launcher: Option<Arc<dyn BrowserLauncher>>,
    settle: SettlePolicy,
    pacing: Duration,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration
    ///
    /// The browser launcher is the one compiled into this build (none
    /// without the `browser` feature).
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = PlainFetcher::from_config(&config)?;
        let analyzer = StrategyAnalyzer::new(fetcher.clone(), &config);
        let discoverer = LinkDiscoverer::from_config(&config);
        let extractor = ContentExtractor::from_config(&config, fetcher.client().clone());
        let launcher = default_launcher(&config);
        let settle = SettlePolicy::from_config(&config);
        let pacing = Duration::from_millis(config.crawler.pacing_delay_ms);

        tracing::debug!(
            "Coordinator ready: extraction chain {:?}, browser {}",
            extractor.strategy_names(),
            if launcher.is_some() { "available" } else { "unavailable" }
        );

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            analyzer,
            discoverer,
            extractor,
            launcher,
            settle,
            pacing,
        })
    }

    /// Replaces the browser launcher
    pub fn with_launcher(mut self, launcher: Option<Arc<dyn BrowserLauncher>>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Replaces the extraction chain
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls one site
    ///
    /// Per-page failures never fail the crawl; the only errors are internal
    /// phase violations. `max_products` caps products per category and
    /// falls back to the configured default.
    pub async fn scrape(
        &self,
        site: &Url,
        categories: &[String],
        max_products: Option<usize>,
    ) -> Result<CrawlReport> {
        let mut tracker = CrawlTracker::new();
        let mut session = CrawlSession::new(
            self.config
                .crawler
                .crawl_deadline_secs
                .map(Duration::from_secs),
        );
        let max_products = max_products.or(self.config.crawler.max_products);

        tracing::info!("Starting crawl of {}", site);

        tracker.advance(CrawlPhase::Analyze)?;
        let profile = self.analyzer.analyze(site).await;

        let (fetch_mode, results) = match profile.recommended_fetch_mode {
            FetchMode::Plain => {
                tracker.advance(CrawlPhase::PlainCrawl)?;
                let results = self
                    .crawl_with(&self.fetcher, None, site, categories, max_products, &mut session)
                    .await;
                (FetchMode::Plain, results)
            }
            FetchMode::Scripted => {
                tracker.advance(CrawlPhase::ScriptedCrawl)?;
                match self.launch_browser().await {
                    Some(browser) => {
                        let source = RenderedSource::new(browser.context(), self.settle.clone());
                        let results = self
                            .crawl_with(
                                &source,
                                Some(browser.context()),
                                site,
                                categories,
                                max_products,
                                &mut session,
                            )
                            .await;
                        browser.close().await;
                        (FetchMode::Scripted, results)
                    }
                    None => {
                        tracker.advance(CrawlPhase::PlainCrawl)?;
                        let results = self
                            .crawl_with(
                                &self.fetcher,
                                None,
                                site,
                                categories,
                                max_products,
                                &mut session,
                            )
                            .await;
                        (FetchMode::Plain, results)
                    }
                }
            }
        };

        tracker.advance(CrawlPhase::Aggregate)?;
        let summary = CrawlSummary::new(
            site.as_str(),
            fetch_mode,
            &results,
            session.failed_products,
            session.deadline_reached,
            tracker.elapsed(),
        );
        tracker.advance(CrawlPhase::Done)?;

        tracing::info!("{}", summary);

        Ok(CrawlReport {
            site: site.clone(),
            profile,
            fetch_mode,
            results,
            summary,
            phases: tracker.history().to_vec(),
        })
    }

    /// Crawls several sites, at most `max-concurrent-sites` at a time
    ///
    /// Results come back in input order. A failed site never aborts the
    /// others.
    pub async fn scrape_many(
        self: &Arc<Self>,
        sites: Vec<Url>,
        categories: &[String],
        max_products: Option<usize>,
    ) -> Vec<(Url, Result<CrawlReport>)> {
        let limit = self.config.crawler.max_concurrent_sites.max(1) as usize;
        let semaphore = Arc::new(Semaphore::new(limit));
        let categories: Arc<[String]> = categories.into();

        tracing::info!("Crawling {} sites, {} at a time", sites.len(), limit);

        let mut tasks = JoinSet::new();
        for (index, site) in sites.iter().cloned().enumerate() {
            let coordinator = Arc::clone(self);
            let semaphore = Arc::clone(&semaphore);
            let categories = Arc::clone(&categories);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let result = coordinator.scrape(&site, &categories, max_products).await;
                (index, result)
            });
        }

        let mut slots: Vec<Option<Result<CrawlReport>>> = sites.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::error!("Site crawl task failed: {}", e),
            }
        }

        sites
            .into_iter()
            .zip(slots)
            .map(|(site, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(ScrapeError::Task(format!("crawl of {} did not finish", site)))
                });
                (site, result)
            })
            .collect()
    }

    /// Launches the per-crawl browser session, or explains why not
    async fn launch_browser(&self) -> Option<BrowserSession> {
        let Some(launcher) = &self.launcher else {
            tracing::warn!("Scripted mode recommended but no browser is available, using plain mode");
            return None;
        };

        match launcher.launch().await {
            Ok(context) => Some(BrowserSession::new(context)),
            Err(e) => {
                tracing::warn!("Browser launch failed ({}), using plain mode", e);
                None
            }
        }
    }

    /// Runs discovery and extraction with one page source
    ///
    /// With a browser context, product links are read from rendered pages.
    async fn crawl_with(
        &self,
        source: &dyn PageSource,
        context: Option<&dyn BrowserContext>,
        site: &Url,
        categories: &[String],
        max_products: Option<usize>,
        session: &mut CrawlSession,
    ) -> BTreeMap<String, Vec<ProductRecord>> {
        let category_map = self
            .discoverer
            .discover_categories(source, site, categories, &session.seen)
            .await;

        // Category pages are never product candidates
        for url in category_map.values().flatten() {
            session.seen.insert(url);
        }

        let mut results = BTreeMap::new();
        for (category, urls) in &category_map {
            let records = self
                .crawl_category(source, context, category, urls, max_products, session)
                .await;
            tracing::info!("Category '{}': {} products", category, records.len());
            results.insert(category.clone(), records);
        }
        results
    }

    async fn crawl_category(
        &self,
        source: &dyn PageSource,
        context: Option<&dyn BrowserContext>,
        category: &str,
        urls: &[Url],
        max_products: Option<usize>,
        session: &mut CrawlSession,
    ) -> Vec<ProductRecord> {
        let shares = max_products.map(|max| page_shares(max, urls.len()));
        let mut carry = 0;
        let mut records = Vec::new();

        for (index, page) in urls.iter().enumerate() {
            if session.out_of_time() {
                break;
            }

            // Unused quota of earlier pages moves on to the next one
            let quota = shares
                .as_ref()
                .map(|shares| shares.get(index).copied().unwrap_or(0) + carry);
            if quota == Some(0) {
                continue;
            }

            let products = match context {
                Some(context) => {
                    self.discoverer
                        .discover_products_rendered(context, page, &self.settle, &session.seen)
                        .await
                }
                None => {
                    self.discoverer
                        .discover_products(source, page, &session.seen)
                        .await
                }
            };

            let mut taken = 0;
            for product in &products {
                if quota.is_some_and(|quota| taken >= quota) || session.out_of_time() {
                    break;
                }
                // Only products actually taken are claimed for this crawl
                if !session.seen.insert(product) {
                    continue;
                }
                taken += 1;

                match self.fetch_and_extract(source, product, category).await {
                    Some(record) => records.push(record),
                    None => session.failed_products += 1,
                }
                tokio::time::sleep(self.pacing).await;
            }

            if let Some(quota) = quota {
                carry = quota - taken;
            }
        }

        records
    }

    async fn fetch_and_extract(
        &self,
        source: &dyn PageSource,
        product: &Url,
        category: &str,
    ) -> Option<ProductRecord> {
        match source.fetch_markup(product).await {
            FetchResult::Success { body, .. } => {
                let record = self.extractor.extract(&body, product, category).await;
                if record.is_none() {
                    tracing::warn!("No product found on {}", product);
                }
                record
            }
            failure => {
                tracing::warn!("Skipping product {} ({})", product, failure.describe());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::browser::fake::FakeBrowser;
    use crate::crawler::browser::RawLink;
    use std::sync::atomic::Ordering;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.ai.enabled = false;
        config.crawler.pacing_delay_ms = 0;
        config.crawler.settle_delay_ms = 0;
        config.crawler.selector_wait_ms = 0;
        config
    }

    const STATIC_HOME: &str = r#"<html><body>
        <nav>
            <a href="/category/sofas">Sofas</a>
            <a href="/category/tables">Tables</a>
        </nav>
        <div class="product-card">Featured</div>
    </body></html>"#;

    const DYNAMIC_HOME: &str = r#"<html><head><script src="/js/vue.min.js"></script></head>
        <body><div id="app"></div></body></html>"#;

    fn listing(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{}">item</a>"#, href))
            .collect();
        format!("<html><body>{}</body></html>", anchors)
    }

    fn product_page(name: &str) -> String {
        format!(
            r#"<html><body><h1>{}</h1><div class="description">Nice.</div></body></html>"#,
            name
        )
    }

    async fn mount_html(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    async fn static_site() -> MockServer {
        let server = MockServer::start().await;
        mount_html(&server, "/", STATIC_HOME.to_string()).await;
        mount_html(
            &server,
            "/category/sofas",
            listing(&[
                "/products/velvet-sofa",
                "/products/linen-sofa",
                "/products/velvet-sofa",
                "/products/broken-sofa",
            ]),
        )
        .await;
        mount_html(&server, "/category/tables", listing(&["/products/oak-table"])).await;
        mount_html(&server, "/products/velvet-sofa", product_page("velvet sofa")).await;
        mount_html(&server, "/products/linen-sofa", product_page("linen sofa")).await;
        mount_html(&server, "/products/oak-table", product_page("oak table")).await;
        Mock::given(method("GET"))
            .and(path("/products/broken-sofa"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    }

    fn site_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_plain_crawl_end_to_end() {
        let server = static_site().await;
        let coordinator = Coordinator::new(test_config()).unwrap().with_launcher(None);

        let report = coordinator
            .scrape(
                &site_url(&server),
                &["sofa".to_string(), "table".to_string(), "lamp".to_string()],
                None,
            )
            .await
            .unwrap();

        assert_eq!(report.fetch_mode, FetchMode::Plain);
        assert_eq!(
            report.phases,
            vec![
                CrawlPhase::Init,
                CrawlPhase::Analyze,
                CrawlPhase::PlainCrawl,
                CrawlPhase::Aggregate,
                CrawlPhase::Done
            ]
        );

        let sofas: Vec<&str> = report.results["sofa"]
            .iter()
            .map(|r| r.product_name.as_str())
            .collect();
        assert_eq!(sofas, vec!["Velvet Sofa", "Linen Sofa"]);
        assert_eq!(report.results["sofa"][0].furniture_type, "Sofa");
        assert_eq!(report.results["table"].len(), 1);
        assert!(!report.results.contains_key("lamp"));

        assert_eq!(report.summary.total_products, 3);
        assert_eq!(report.summary.failed_products, 1);
    }

    #[tokio::test]
    async fn test_max_products_caps_each_category() {
        let server = static_site().await;
        let coordinator = Coordinator::new(test_config()).unwrap().with_launcher(None);

        let report = coordinator
            .scrape(&site_url(&server), &["sofa".to_string()], Some(1))
            .await
            .unwrap();

        assert_eq!(report.results["sofa"].len(), 1);
        assert_eq!(report.summary.failed_products, 0);
    }

    #[tokio::test]
    async fn test_scripted_crawl_uses_one_browser_session() {
        let server = MockServer::start().await;
        mount_html(&server, "/", DYNAMIC_HOME.to_string()).await;

        let base = server.uri();
        let home = format!("{}/", base);
        let sofas = format!("{}/category/sofas", base);
        let rendered_home = r#"<nav><a href="/category/sofas">Sofas</a></nav>"#;
        let rendered_listing = "<div id=\"grid\"></div>";
        let velvet_page = product_page("velvet sofa");

        let browser = FakeBrowser::with_pages(vec![
            (home.as_str(), rendered_home, vec![]),
            (
                sofas.as_str(),
                rendered_listing,
                vec![RawLink {
                    url: format!("{}/item/velvet-sofa-02", base),
                    ..RawLink::default()
                }],
            ),
            (
                format!("{}/item/velvet-sofa-02", base).as_str(),
                velvet_page.as_str(),
                vec![],
            ),
        ]);

        let coordinator = Coordinator::new(test_config())
            .unwrap()
            .with_launcher(Some(Arc::new(browser.clone())));

        let report = coordinator
            .scrape(&site_url(&server), &["sofa".to_string()], None)
            .await
            .unwrap();

        assert_eq!(report.fetch_mode, FetchMode::Scripted);
        assert_eq!(report.results["sofa"].len(), 1);
        assert_eq!(report.results["sofa"][0].product_name, "Velvet Sofa");

        let counters = &browser.counters;
        assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
        assert_eq!(counters.context_closes.load(Ordering::SeqCst), 1);
        assert_eq!(
            counters.opens.load(Ordering::SeqCst),
            counters.page_closes.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_browser_launch_failure_falls_back_to_plain() {
        let server = MockServer::start().await;
        mount_html(&server, "/", DYNAMIC_HOME.to_string()).await;

        let browser = FakeBrowser {
            fail_launch: true,
            ..FakeBrowser::default()
        };
        let coordinator = Coordinator::new(test_config())
            .unwrap()
            .with_launcher(Some(Arc::new(browser.clone())));

        let report = coordinator
            .scrape(&site_url(&server), &["sofa".to_string()], None)
            .await
            .unwrap();

        assert_eq!(report.profile.recommended_fetch_mode, FetchMode::Scripted);
        assert_eq!(report.fetch_mode, FetchMode::Plain);
        assert!(report.phases.contains(&CrawlPhase::ScriptedCrawl));
        assert!(report.phases.contains(&CrawlPhase::PlainCrawl));
        assert_eq!(browser.counters.context_closes.load(Ordering::SeqCst), 0);
        assert_eq!(report.phases.last(), Some(&CrawlPhase::Done));
    }

    #[tokio::test]
    async fn test_elapsed_deadline_returns_partial_result() {
        let server = static_site().await;
        let mut config = test_config();
        config.crawler.crawl_deadline_secs = Some(0);
        let coordinator = Coordinator::new(config).unwrap().with_launcher(None);

        let report = coordinator
            .scrape(&site_url(&server), &["sofa".to_string()], None)
            .await
            .unwrap();

        assert!(report.summary.deadline_reached);
        assert!(report.results["sofa"].is_empty());
    }

    #[tokio::test]
    async fn test_scrape_many_keeps_input_order() {
        let first = static_site().await;
        let second = MockServer::start().await;
        mount_html(&second, "/", "<html><body></body></html>".to_string()).await;

        let coordinator = Arc::new(Coordinator::new(test_config()).unwrap().with_launcher(None));
        let sites = vec![site_url(&first), site_url(&second)];

        let outcomes = coordinator
            .scrape_many(sites.clone(), &["table".to_string()], None)
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, sites[0]);
        assert_eq!(outcomes[1].0, sites[1]);

        let first_report = outcomes[0].1.as_ref().unwrap();
        assert_eq!(first_report.results["table"].len(), 1);
        let second_report = outcomes[1].1.as_ref().unwrap();
        assert!(second_report.results.is_empty());
    }

    async fn quota_site() -> MockServer {
        let server = MockServer::start().await;
        mount_html(
            &server,
            "/",
            r#"<html><body><nav>
                <a href="/category/sofas">Sofas</a>
                <a href="/category/divani">Divani</a>
                <a href="/category/tables">Tables</a>
            </nav><div class="product-card">Featured</div></body></html>"#
                .to_string(),
        )
        .await;
        mount_html(
            &server,
            "/category/sofas",
            listing(&["/products/sofa-one", "/products/sofa-two", "/products/sofa-three"]),
        )
        .await;
        mount_html(
            &server,
            "/category/divani",
            listing(&["/products/divano-uno", "/products/divano-due", "/products/divano-tre"]),
        )
        .await;
        mount_html(
            &server,
            "/category/tables",
            listing(&["/products/sofa-two", "/products/divano-due"]),
        )
        .await;
        for slug in [
            "sofa-one",
            "sofa-two",
            "sofa-three",
            "divano-uno",
            "divano-due",
            "divano-tre",
        ] {
            mount_html(
                &server,
                &format!("/products/{}", slug),
                product_page(&slug.replace('-', " ")),
            )
            .await;
        }
        server
    }

    #[test]
    fn test_page_shares_keep_the_whole_cap() {
        assert_eq!(page_shares(5, 2), vec![3, 2]);
        assert_eq!(page_shares(1, 3), vec![1, 0, 0]);
        assert_eq!(page_shares(4, 0), vec![4]);
        assert_eq!(page_shares(7, 3).iter().sum::<usize>(), 7);
    }

    #[tokio::test]
    async fn test_cap_split_over_category_pages_uses_full_budget() {
        let server = quota_site().await;
        let coordinator = Coordinator::new(test_config()).unwrap().with_launcher(None);

        let report = coordinator
            .scrape(&site_url(&server), &["sofa".to_string()], Some(5))
            .await
            .unwrap();

        assert_eq!(report.results["sofa"].len(), 5);
        assert_eq!(report.summary.failed_products, 0);
    }

    #[tokio::test]
    async fn test_products_cut_by_cap_stay_available() {
        let server = quota_site().await;
        let coordinator = Coordinator::new(test_config()).unwrap().with_launcher(None);

        let report = coordinator
            .scrape(
                &site_url(&server),
                &["sofa".to_string(), "table".to_string()],
                Some(1),
            )
            .await
            .unwrap();

        assert_eq!(report.results["sofa"].len(), 1);
        // The table page only lists products the sofa pages left behind
        assert_eq!(report.results["table"].len(), 1);
    }

    #[tokio::test]
    async fn test_pacing_follows_every_product_fetch() {
        let server = static_site().await;
        let mut config = test_config();
        config.crawler.pacing_delay_ms = 150;
        let coordinator = Coordinator::new(config).unwrap().with_launcher(None);

        let started = std::time::Instant::now();
        let report = coordinator
            .scrape(&site_url(&server), &["sofa".to_string()], None)
            .await
            .unwrap();

        // Two extracted products and one failing with HTTP 500
        assert_eq!(report.results["sofa"].len(), 2);
        assert_eq!(report.summary.failed_products, 1);
        assert!(started.elapsed() >= Duration::from_millis(450));
    }

    #[tokio::test]
    async fn test_cancelled_scripted_crawl_still_closes_browser() {
        let server = MockServer::start().await;
        mount_html(&server, "/", DYNAMIC_HOME.to_string()).await;

        let home = format!("{}/", server.uri());
        let browser = FakeBrowser {
            stall_content: true,
            ..FakeBrowser::with_pages(vec![(home.as_str(), "<nav></nav>", vec![])])
        };
        let coordinator = Coordinator::new(test_config())
            .unwrap()
            .with_launcher(Some(Arc::new(browser.clone())));

        let url = site_url(&server);
        let terms = ["sofa".to_string()];
        let crawl = coordinator.scrape(&url, &terms, None);
        assert!(tokio::time::timeout(Duration::from_millis(300), crawl)
            .await
            .is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let counters = &browser.counters;
        assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
        assert_eq!(counters.opens.load(Ordering::SeqCst), 1);
        assert_eq!(counters.page_closes.load(Ordering::SeqCst), 1);
        assert_eq!(counters.context_closes.load(Ordering::SeqCst), 1);
    }
}
