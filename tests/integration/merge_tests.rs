//! Integration tests for reconciliation
//!
//! Scraped records and price listings go through the same CSV files the
//! command line reads, then validation and merging.

use furnish_scout::config::Config;
use furnish_scout::crawler::build_http_client;
use furnish_scout::output::{
    read_price_listing, read_products, read_site_list, write_merged, write_products, OutputError,
};
use furnish_scout::reconcile::{probe_from_config, reconcile, DropReason, SkipProbe};
use furnish_scout::{ProductRecord, ScrapeError};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRICE_LISTING: &str = "\
Product Name,Price (EUR),Furniture Type
The Velvet Sofa,1200,Sofas
Oak Dining Table,850,Table
Velvet Sofa,99,Armchair
";

fn record(name: &str, base: &str, slug: &str, furniture_type: &str) -> ProductRecord {
    ProductRecord {
        product_name: name.to_string(),
        description: "Made to order".to_string(),
        product_url: format!("{}/products/{}", base, slug),
        designer_name: "Studio Nord".to_string(),
        image_urls: vec![
            format!("{}/media/{}.jpg", base, slug),
            format!("{}/media/logo.png", base),
        ],
        furniture_type: furniture_type.to_string(),
    }
}

fn offline_config() -> Config {
    let mut config = Config::default();
    config.merge.check_reachability = false;
    config
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

fn read_merged(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("open merged file");
    let headers = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("row").iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[tokio::test]
async fn test_merge_files_end_to_end() {
    let dir = TempDir::new().expect("temp dir");
    let base = "https://shop.example";

    let scraped_path = dir.path().join("shop_products.csv");
    write_products(
        &scraped_path,
        &[
            record("Velvet Sofa", base, "velvet-sofa", "Sofa"),
            record("Lounge Chair", base, "lounge-chair", "Chair"),
        ],
    )
    .expect("write scraped");
    let prices_path = write_file(dir.path(), "prices.csv", PRICE_LISTING);

    let scraped = read_products(&scraped_path).expect("read scraped");
    let prices = read_price_listing(&prices_path).expect("read prices");
    assert_eq!(scraped.len(), 2);
    assert_eq!(prices.len(), 3);

    let (merged, summary) = reconcile(scraped, &prices, &SkipProbe, &offline_config())
        .await
        .expect("reconcile");

    assert_eq!(summary.valid, 2);
    // The armchair row shares the name but not the type
    assert_eq!(merged.len(), 1);

    let out = dir.path().join("shop_merged.csv");
    write_merged(&out, &merged).expect("write merged");

    let (headers, rows) = read_merged(&out);
    assert_eq!(
        headers,
        vec![
            "Product Name",
            "Price (EUR)",
            "Furniture Type",
            "description",
            "productUrl",
            "designerName",
            "imageUrls",
        ]
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Velvet Sofa");
    assert_eq!(rows[0][1], "1200");
    assert_eq!(rows[0][2], "Sofa");
    assert_eq!(rows[0][4], "https://shop.example/products/velvet-sofa");
    // Logos are dropped during validation
    assert_eq!(rows[0][6], r#"["https://shop.example/media/velvet-sofa.jpg"]"#);
}

#[tokio::test]
async fn test_reachability_probe_drops_dead_links() {
    let server = MockServer::start().await;
    for route in ["/products/velvet-sofa", "/media/velvet-sofa.jpg"] {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
    }
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base = server.uri();
    let scraped = vec![
        record("Velvet Sofa", &base, "velvet-sofa", "Sofa"),
        record("Oak Dining Table", &base, "oak-table", "Table"),
    ];

    let dir = TempDir::new().expect("temp dir");
    let prices = read_price_listing(&write_file(dir.path(), "prices.csv", PRICE_LISTING))
        .expect("read prices");

    let config = Config::default();
    let probe = probe_from_config(&config, build_http_client(&config).expect("client"));
    let (merged, summary) = reconcile(scraped, &prices, probe.as_ref(), &config)
        .await
        .expect("reconcile");

    assert_eq!(summary.total, 2);
    assert_eq!(summary.valid, 1);
    assert_eq!(
        summary.dropped,
        vec![(
            "Oak Dining Table".to_string(),
            DropReason::UnreachableProductUrl
        )]
    );
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].get("Price (EUR)"), Some("1200"));
}

#[tokio::test]
async fn test_listing_without_type_column_is_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let prices = read_price_listing(&write_file(
        dir.path(),
        "prices.csv",
        "Product Name,Price\nVelvet Sofa,10\n",
    ))
    .expect("read prices");

    let result = reconcile(
        vec![record("Velvet Sofa", "https://shop.example", "velvet-sofa", "Sofa")],
        &prices,
        &SkipProbe,
        &offline_config(),
    )
    .await;

    assert!(matches!(result, Err(ScrapeError::Reconcile(_))));
}

#[test]
fn test_scraped_file_without_name_column() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_file(dir.path(), "scraped.csv", "title,url\nVelvet,https://a.example/\n");

    assert!(matches!(
        read_products(&path),
        Err(OutputError::MissingColumn(_))
    ));
}

#[test]
fn test_batch_file_lists_distinct_sites() {
    let dir = TempDir::new().expect("temp dir");
    let good = write_file(
        dir.path(),
        "sites.csv",
        "Brand,URL\nNord,https://nord.example/\nNord again,https://nord.example/\nBroken,not a url\nAcme,https://acme.example/shop\n",
    );
    let sites = read_site_list(&good).expect("read sites");
    let sites: Vec<&str> = sites.iter().map(|u| u.as_str()).collect();
    assert_eq!(sites, vec!["https://nord.example/", "https://acme.example/shop"]);

    let bad = write_file(dir.path(), "brands.csv", "Brand\nNord\n");
    assert!(matches!(
        read_site_list(&bad),
        Err(OutputError::MissingColumn(column)) if column == "url"
    ));
}

#[tokio::test]
async fn test_human_headers_survive_reconcile() {
    let dir = TempDir::new().expect("temp dir");
    let scraped_path = write_file(
        dir.path(),
        "shop_products.csv",
        "Product Name,Description,Product URL,Designer Name,Image URLs,Furniture Type\n\
         Velvet Sofa,Deep seats,https://shop.example/products/velvet-sofa,Studio Nord,\
         https://shop.example/media/velvet-sofa.jpg,Sofa\n",
    );
    let prices = read_price_listing(&write_file(dir.path(), "prices.csv", PRICE_LISTING))
        .expect("read prices");

    let scraped = read_products(&scraped_path).expect("read scraped");
    assert_eq!(
        scraped[0].product_url,
        "https://shop.example/products/velvet-sofa"
    );
    assert_eq!(
        scraped[0].image_urls,
        vec!["https://shop.example/media/velvet-sofa.jpg".to_string()]
    );

    let (merged, summary) = reconcile(scraped, &prices, &SkipProbe, &offline_config())
        .await
        .expect("reconcile");

    assert_eq!(summary.valid, 1);
    assert!(summary.dropped.is_empty());
    assert_eq!(merged.len(), 1);
    assert_eq!(
        merged[0].get("imageUrls"),
        Some(r#"["https://shop.example/media/velvet-sofa.jpg"]"#)
    );
}
