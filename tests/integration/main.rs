//! Integration tests for Furnish-Scout

mod crawl_tests;
mod merge_tests;
