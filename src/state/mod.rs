//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase` / `CrawlTracker`: the per-crawl state machine
//! - `SeenLinkSet`: crawl-scoped deduplication of emitted URLs

mod crawl_phase;
mod seen_links;

// Re-export main types
pub use crawl_phase::{CrawlPhase, CrawlTracker};
pub use seen_links::SeenLinkSet;
