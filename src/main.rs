//! Furnish-Scout main entry point
//!
//! This is the command-line interface for the Furnish-Scout product scraper.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use furnish_scout::config::{load_config_with_hash, Config};
use furnish_scout::crawler::{
    build_http_client, resolve_target, ConfigBrandResolver, Coordinator, CrawlReport,
};
use furnish_scout::logging::setup_logging;
use furnish_scout::output::{
    export_file_name, read_price_listing, read_products, read_site_list, write_merged,
    write_products, CrawlSummary, OutputError,
};
use furnish_scout::reconcile::{probe_from_config, reconcile};
use furnish_scout::url::parse_site_url;
use furnish_scout::ScrapeError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Furnish-Scout: adaptive product discovery for furniture retailers
///
/// Furnish-Scout crawls retailer websites without site-specific scrapers,
/// extracts product records, and reconciles them with a price listing.
#[derive(Parser, Debug)]
#[command(name = "furnish-scout")]
#[command(version)]
#[command(about = "Adaptive furniture product scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site (URL or brand name) or a CSV batch of sites
    Scrape {
        /// Site URL or brand name
        #[arg(value_name = "TARGET", conflicts_with = "input")]
        target: Option<String>,

        /// CSV file with a `url` column; every distinct URL is crawled
        #[arg(short, long, value_name = "CSV")]
        input: Option<PathBuf>,

        /// Categories to look for, comma separated (all known when omitted)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,

        /// Maximum products per category
        #[arg(short, long)]
        max_products: Option<usize>,

        /// Directory for exported CSV files
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Validate scraped records and merge them with a price listing
    Merge {
        /// CSV exported by `scrape`
        scraped: PathBuf,

        /// Price listing CSV
        prices: PathBuf,

        /// Output file (defaults to `<site>_merged.csv`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Minimum name similarity, 0-100
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,

        /// Skip HEAD requests against product and image URLs
        #[arg(long)]
        no_probe: bool,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let _sink = setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Scrape {
            target,
            input,
            categories,
            max_products,
            output,
        } => {
            handle_scrape(config, target, input, categories, max_products, &output).await
        }
        Command::Merge {
            scraped,
            prices,
            output,
            threshold,
            no_probe,
        } => {
            let mut config = config;
            if let Some(threshold) = threshold {
                config.merge.threshold = threshold;
            }
            if no_probe {
                config.merge.check_reachability = false;
            }
            handle_merge(&config, &scraped, &prices, output).await
        }
        Command::CheckConfig => {
            handle_check_config(&config);
            Ok(())
        }
    }
}

/// Loads the configuration file, or the defaults when none is given
fn load(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using built-in defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Maps spreadsheet shape problems to the caller-input error
fn input_error(path: &Path, e: OutputError) -> ScrapeError {
    match e {
        OutputError::MissingColumn(_) | OutputError::UnsupportedShape(_) => {
            ScrapeError::UnsupportedInput(format!("{}: {}", path.display(), e))
        }
        other => ScrapeError::Output(other),
    }
}

/// Handles the `scrape` command
async fn handle_scrape(
    config: Config,
    target: Option<String>,
    input: Option<PathBuf>,
    categories: Vec<String>,
    max_products: Option<usize>,
    output: &Path,
) -> Result<()> {
    // Caller input is checked before any crawling starts
    let sites = match &input {
        Some(path) => {
            let sites = read_site_list(path).map_err(|e| input_error(path, e))?;
            if sites.is_empty() {
                return Err(ScrapeError::UnsupportedInput(format!(
                    "{} contains no valid site URLs",
                    path.display()
                ))
                .into());
            }
            sites
        }
        None => {
            let resolver = ConfigBrandResolver::new(&config.brands);
            let site = resolve_target(target.as_deref().unwrap_or_default(), &resolver).await?;
            vec![site]
        }
    };

    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let categories: Vec<String> = categories
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let coordinator = Arc::new(Coordinator::new(config)?);
    let outcomes = coordinator
        .scrape_many(sites, &categories, max_products)
        .await;

    for (site, outcome) in outcomes {
        match outcome {
            Ok(report) => export_report(&report, output)?,
            Err(e) => {
                tracing::error!("Crawl of {} failed: {}", site, e);
                println!("{}\n", CrawlSummary::failed(site.as_str(), &e.to_string()));
            }
        }
    }

    Ok(())
}

/// Writes one crawl's records and prints its summary
fn export_report(report: &CrawlReport, output: &Path) -> Result<()> {
    let path = output.join(export_file_name(&report.site, "products"));
    let records = report.records();
    write_products(&path, &records)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("{}", report.summary);
    println!("  Exported to: {}\n", path.display());
    Ok(())
}

/// Handles the `merge` command
async fn handle_merge(
    config: &Config,
    scraped_path: &Path,
    prices_path: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let scraped = read_products(scraped_path).map_err(|e| input_error(scraped_path, e))?;
    let prices = read_price_listing(prices_path).map_err(|e| input_error(prices_path, e))?;

    tracing::info!(
        "Read {} scraped records and {} price rows",
        scraped.len(),
        prices.len()
    );

    let output = output.unwrap_or_else(|| {
        let name = scraped
            .iter()
            .find_map(|record| parse_site_url(&record.product_url).ok())
            .map(|site| export_file_name(&site, "merged"))
            .unwrap_or_else(|| "merged.csv".to_string());
        PathBuf::from(name)
    });

    let client = build_http_client(config)?;
    let probe = probe_from_config(config, client);

    let (merged, summary) = reconcile(scraped, &prices, probe.as_ref(), config).await?;
    write_merged(&output, &merged)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("{}", summary);
    println!("Merged {} rows into {}", merged.len(), output.display());
    Ok(())
}

/// Handles the `check-config` command
fn handle_check_config(config: &Config) {
    println!("=== Furnish-Scout Configuration ===\n");

    println!("Crawler:");
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Pacing delay: {}ms", config.crawler.pacing_delay_ms);
    println!("  Settle delay: {}ms", config.crawler.settle_delay_ms);
    println!("  Selector wait: {}ms", config.crawler.selector_wait_ms);
    match config.crawler.max_products {
        Some(max) => println!("  Max products per category: {}", max),
        None => println!("  Max products per category: unlimited"),
    }
    match config.crawler.crawl_deadline_secs {
        Some(secs) => println!("  Crawl deadline: {}s", secs),
        None => println!("  Crawl deadline: none"),
    }
    println!(
        "  Max concurrent sites: {}",
        config.crawler.max_concurrent_sites
    );
    println!("  Image filter: {:?}", config.crawler.image_filter);

    println!("\nSelectors:");
    println!("  Category: {}", config.selectors.category.len());
    println!("  Product: {}", config.selectors.product.len());
    println!("  Name: {}", config.selectors.name.len());
    println!("  Description: {}", config.selectors.description.len());
    println!("  Designer: {}", config.selectors.designer.len());

    println!("\nExtra synonyms ({}):", config.synonyms.len());
    for (category, words) in &config.synonyms {
        println!("  - {}: {}", category, words.join(", "));
    }

    println!("\nAI extraction:");
    let key_present = std::env::var(&config.ai.api_key_env).is_ok_and(|k| !k.trim().is_empty());
    println!(
        "  Enabled: {} (key {} {})",
        config.ai.enabled,
        config.ai.api_key_env,
        if key_present { "set" } else { "not set" }
    );
    println!("  Model: {}", config.ai.model);

    println!("\nMerge:");
    println!("  Threshold: {}", config.merge.threshold);
    println!(
        "  Columns: {} / {}",
        config.merge.name_column, config.merge.type_column
    );
    println!(
        "  Reachability checks: {}",
        config.merge.check_reachability
    );

    println!("\nKnown brands ({}):", config.brands.len());
    for (brand, url) in &config.brands {
        println!("  - {} -> {}", brand, url);
    }

    println!("\n✓ Configuration is valid");
    if cfg!(feature = "browser") {
        println!("✓ Scripted browser support compiled in");
    } else {
        println!("! Scripted browser support not compiled in; scripted sites use plain mode");
    }
}
