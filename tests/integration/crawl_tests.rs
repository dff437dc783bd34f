//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock retailer sites and run the full
//! analyze -> discover -> extract -> export cycle end-to-end.

use async_trait::async_trait;
use furnish_scout::config::{parse_config, Config};
use furnish_scout::crawler::{
    resolve_target, BrowserContext, BrowserLauncher, ConfigBrandResolver, Coordinator,
    RawLink, RenderedPage,
};
use furnish_scout::model::FetchMode;
use furnish_scout::output::{export_file_name, read_products, write_products};
use furnish_scout::{CrawlPhase, ScrapeError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration without pacing or AI extraction
fn create_test_config() -> Config {
    let config = parse_config(
        r#"
        [crawler]
        pacing-delay-ms = 0
        settle-delay-ms = 0
        selector-wait-ms = 0
        image-filter = "strict"

        [ai]
        enabled = false
        "#,
    );
    config.expect("test config must parse")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body.to_string()),
        )
        .mount(server)
        .await;
}

const HOME: &str = r#"<html><body>
    <header class="site-header">
        <nav class="menu">
            <a href="/category/divani">Divani</a>
            <a href="/category/dining-tables">Dining tables</a>
            <a href="/category/gift-cards">Gift cards</a>
        </nav>
    </header>
    <section class="product-grid">Our favourites</section>
</body></html>"#;

const SOFA_LISTING: &str = r#"<html><body>
    <div class="product"><a href="/products/velvet-sofa-02">Velvet</a></div>
    <div class="product"><a href="/products/linen-sofa">Linen</a></div>
    <a href="/products/collection">See all</a>
    <a href="/products/2024">Archive</a>
</body></html>"#;

const TABLE_LISTING: &str = r#"<html><body>
    <a class="product-link" href="/products/oak-table">Oak</a>
    <a class="product-link" href="/products/velvet-sofa-02">Also here</a>
</body></html>"#;

const VELVET_PAGE: &str = r#"<html><head><style>h1 { color: red; }</style></head><body>
    <h1>velvet sofa 02</h1>
    <div class="product-description">Deep seats and a velvet cover.</div>
    <span class="designer">Design by Studio Nord</span>
    <img src="/media/logo.svg">
    <img data-src="/media/velvet-sofa-front.jpg">
    <img src="/media/velvet-sofa-front.jpg">
    <img src="/media/banner.jpg">
</body></html>"#;

const LINEN_PAGE: &str = r#"<html><body>
    <h1>Linen Sofa</h1>
    <p>Designed by ana ruiz</p>
    <img src="/media/linen-sofa.jpg">
</body></html>"#;

const OAK_PAGE: &str = r#"<html><body>
    <div class="description">No heading on this page.</div>
    <img src="/media/oak-table.jpg">
</body></html>"#;

async fn furniture_site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, "/", HOME).await;
    mount_page(&server, "/category/divani", SOFA_LISTING).await;
    mount_page(&server, "/category/dining-tables", TABLE_LISTING).await;
    mount_page(&server, "/products/velvet-sofa-02", VELVET_PAGE).await;
    mount_page(&server, "/products/linen-sofa", LINEN_PAGE).await;
    mount_page(&server, "/products/oak-table", OAK_PAGE).await;
    server
}

fn site_of(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).expect("mock server URL")
}

#[tokio::test]
async fn test_full_crawl_and_export() {
    let server = furniture_site().await;
    let site = site_of(&server);
    let coordinator = Coordinator::new(create_test_config())
        .expect("coordinator")
        .with_launcher(None);

    let report = coordinator
        .scrape(
            &site,
            &["sofa".to_string(), "table".to_string(), "unmatched".to_string()],
            None,
        )
        .await
        .expect("crawl");

    // Product markup in the raw HTML keeps the crawl in plain mode
    assert_eq!(report.fetch_mode, FetchMode::Plain);
    assert_eq!(report.phases.last(), Some(&CrawlPhase::Done));

    assert!(!report.results.contains_key("unmatched"));
    let sofas = &report.results["sofa"];
    assert_eq!(sofas.len(), 2);

    let velvet = &sofas[0];
    assert_eq!(velvet.product_name, "Velvet Sofa 02");
    assert_eq!(velvet.description, "Deep seats and a velvet cover.");
    assert_eq!(velvet.designer_name, "Studio Nord");
    assert_eq!(
        velvet.image_urls,
        vec![format!("{}/media/velvet-sofa-front.jpg", server.uri())]
    );
    assert_eq!(velvet.furniture_type, "Sofa");

    assert_eq!(sofas[1].designer_name, "Ana Ruiz");

    // The oak page has no name, and the velvet sofa was already emitted
    assert!(report.results["table"].is_empty());
    assert_eq!(report.summary.failed_products, 1);
    assert_eq!(report.summary.total_products, 2);

    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join(export_file_name(&site, "products"));
    assert!(file.ends_with("127_products.csv"));

    write_products(&file, &report.records()).expect("export");
    let exported = read_products(&file).expect("read back");
    assert_eq!(exported, report.records());
}

#[tokio::test]
async fn test_unreachable_site_still_returns_a_report() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config())
        .expect("coordinator")
        .with_launcher(None);
    let report = coordinator
        .scrape(&site_of(&server), &["sofa".to_string()], Some(5))
        .await
        .expect("crawl");

    assert_eq!(report.profile.recommended_fetch_mode, FetchMode::Scripted);
    assert_eq!(report.fetch_mode, FetchMode::Plain);
    assert!(report.results["sofa"].is_empty());
    assert_eq!(report.summary.total_products, 0);
}

#[tokio::test]
async fn test_brand_resolution_before_crawling() {
    let server = furniture_site().await;
    let mut brands = std::collections::BTreeMap::new();
    brands.insert("Studio Nord".to_string(), format!("{}/", server.uri()));
    let resolver = ConfigBrandResolver::new(&brands);

    let site = resolve_target("  studio   nord ", &resolver)
        .await
        .expect("known brand");
    assert_eq!(site, site_of(&server));

    assert!(matches!(
        resolve_target("Unknown Brand", &resolver).await,
        Err(ScrapeError::UnresolvedBrand(_))
    ));
    assert!(matches!(
        resolve_target("", &resolver).await,
        Err(ScrapeError::MissingInput)
    ));
}

/// Browser serving canned rendered pages; counts session lifecycle calls
#[derive(Clone, Default)]
struct CannedBrowser {
    pages: Arc<HashMap<String, (String, Vec<RawLink>)>>,
    launches: Arc<AtomicUsize>,
    context_closes: Arc<AtomicUsize>,
    open_pages: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserLauncher for CannedBrowser {
    async fn launch(&self) -> Result<Box<dyn BrowserContext>, ScrapeError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl BrowserContext for CannedBrowser {
    async fn open(&self, url: &Url) -> Result<Box<dyn RenderedPage>, ScrapeError> {
        let (markup, links) = self
            .pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| ScrapeError::Browser(format!("net::ERR_FAILED {}", url)))?;
        self.open_pages.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CannedPage {
            markup,
            links,
            open_pages: Arc::clone(&self.open_pages),
        }))
    }

    async fn close(&self) {
        self.context_closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct CannedPage {
    markup: String,
    links: Vec<RawLink>,
    open_pages: Arc<AtomicUsize>,
}

#[async_trait]
impl RenderedPage for CannedPage {
    async fn wait_for_settle(&self, selector: Option<&str>, _max_wait: Duration) -> bool {
        selector.is_none()
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.markup.clone())
    }

    async fn links(&self) -> Result<Vec<RawLink>, ScrapeError> {
        Ok(self.links.clone())
    }

    async fn close(&self) {
        self.open_pages.fetch_sub(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_scripted_crawl_closes_every_page_and_the_session() {
    // The raw front page is an empty application shell
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><script src="/assets/react.production.min.js"></script></head>
           <body><div id="root"></div></body></html>"#,
    )
    .await;

    let base = server.uri();
    let mut pages = HashMap::new();
    pages.insert(
        format!("{}/", base),
        (
            r#"<nav><a href="/category/armchairs">Armchairs</a></nav>"#.to_string(),
            vec![],
        ),
    );
    pages.insert(
        format!("{}/category/armchairs", base),
        (
            r#"<div class="grid"><a class="product-link" href="/products/lounge-armchair">Lounge</a></div>"#
                .to_string(),
            vec![],
        ),
    );
    pages.insert(
        format!("{}/products/lounge-armchair", base),
        (
            r#"<h1>Lounge Armchair</h1><img src="/media/lounge-armchair.webp">"#.to_string(),
            vec![],
        ),
    );
    let browser = CannedBrowser {
        pages: Arc::new(pages),
        ..CannedBrowser::default()
    };

    let coordinator = Coordinator::new(create_test_config())
        .expect("coordinator")
        .with_launcher(Some(Arc::new(browser.clone())));
    let report = coordinator
        .scrape(&site_of(&server), &["armchair".to_string()], None)
        .await
        .expect("crawl");

    assert_eq!(report.fetch_mode, FetchMode::Scripted);
    assert_eq!(report.results["armchair"].len(), 1);
    assert_eq!(
        report.results["armchair"][0].image_urls,
        vec![format!("{}/media/lounge-armchair.webp", base)]
    );

    assert_eq!(browser.launches.load(Ordering::SeqCst), 1);
    assert_eq!(browser.context_closes.load(Ordering::SeqCst), 1);
    assert_eq!(browser.open_pages.load(Ordering::SeqCst), 0);
}
