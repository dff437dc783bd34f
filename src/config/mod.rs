//! Configuration module for Furnish-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; an empty file yields the built-in heuristics.
//!
//! # Example
//!
//! ```no_run
//! use furnish_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Pacing delay: {}ms", config.crawler.pacing_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AiConfig, Config, CrawlerConfig, ImageFilter, MergeConfig, SelectorConfig, UserAgentConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
