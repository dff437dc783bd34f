//! Human-readable crawl summaries
//!
//! Every crawl returns a summary alongside its (possibly empty) results; the
//! CLI prints it and the coordinator logs it.

use crate::model::{FetchMode, ProductRecord};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Summary statistics for one site crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlSummary {
    pub site: String,
    /// Fetch mode actually used, after any browser fallback
    pub fetch_mode: FetchMode,
    /// Product count per category, including empty categories
    pub categories: BTreeMap<String, usize>,
    pub total_products: usize,
    /// Product pages that failed to fetch or yielded no record
    pub failed_products: usize,
    pub deadline_reached: bool,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn new(
        site: &str,
        fetch_mode: FetchMode,
        results: &BTreeMap<String, Vec<ProductRecord>>,
        failed_products: usize,
        deadline_reached: bool,
        elapsed: Duration,
    ) -> Self {
        let categories: BTreeMap<String, usize> = results
            .iter()
            .map(|(category, records)| (category.clone(), records.len()))
            .collect();
        let total_products = categories.values().sum();

        Self {
            site: site.to_string(),
            fetch_mode,
            categories,
            total_products,
            failed_products,
            deadline_reached,
            finished_at: Utc::now(),
            elapsed,
        }
    }

    /// Summary for a site whose crawl could not start
    pub fn failed(site: &str, reason: &str) -> String {
        format!("Crawl of {} failed before it started: {}", site, reason)
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Crawl summary for {}", self.site)?;
        writeln!(f, "  Fetch mode: {}", self.fetch_mode)?;
        writeln!(
            f,
            "  Finished: {} ({:.1}s)",
            self.finished_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.elapsed.as_secs_f64()
        )?;

        if self.categories.is_empty() {
            writeln!(f, "  No categories discovered")?;
        }
        for (category, count) in &self.categories {
            writeln!(f, "  {}: {} products", category, count)?;
        }

        writeln!(f, "  Total products: {}", self.total_products)?;
        write!(f, "  Failed product pages: {}", self.failed_products)?;
        if self.deadline_reached {
            write!(f, "\n  Stopped early: crawl deadline reached")?;
        }
        Ok(())
    }
}
