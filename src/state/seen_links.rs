use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// URLs already emitted as category or product candidates in one crawl
///
/// Each crawl owns its own set; it is never shared between sites. The
/// check-and-insert in [`SeenLinkSet::insert`] happens under one lock, so a
/// URL matched by several selectors is emitted once.
#[derive(Debug, Default)]
pub struct SeenLinkSet {
    links: Mutex<HashSet<String>>,
}

impl SeenLinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashSet<String>> {
        // A poisoned set is still a valid set of strings
        self.links.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts the URL, returning true if it had not been seen before
    pub fn insert(&self, url: &Url) -> bool {
        self.guard().insert(url.as_str().to_string())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.guard().contains(url.as_str())
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    /// Forgets every URL; called at the start of an independent crawl
    pub fn clear(&self) {
        self.guard().clear();
    }
}

impl Clone for SeenLinkSet {
    fn clone(&self) -> Self {
        Self {
            links: Mutex::new(self.guard().clone()),
        }
    }
}
