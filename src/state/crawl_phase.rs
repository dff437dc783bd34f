/// Crawl phase definitions for tracking one site crawl
///
/// A crawl moves `Init -> Analyze -> {PlainCrawl | ScriptedCrawl} -> Aggregate -> Done`.
/// A scripted crawl that cannot obtain a browser drops to `PlainCrawl`.
use crate::ScrapeError;
use std::fmt;
use std::time::Instant;

/// Represents the current phase of a single-site crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    /// Crawl created, nothing fetched yet
    Init,

    /// Fetching and classifying the front page
    Analyze,

    /// Discovering and extracting with the plain HTTP fetcher
    PlainCrawl,

    /// Discovering and extracting with a scripted browser session
    ScriptedCrawl,

    /// Assembling the category -> products result
    Aggregate,

    /// Crawl finished (possibly with per-product failures)
    Done,
}

impl CrawlPhase {
    /// Returns true if the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true while pages are being fetched for products
    pub fn is_crawling(&self) -> bool {
        matches!(self, Self::PlainCrawl | Self::ScriptedCrawl)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Analyze)
                | (Self::Analyze, Self::PlainCrawl)
                | (Self::Analyze, Self::ScriptedCrawl)
                | (Self::ScriptedCrawl, Self::PlainCrawl)
                | (Self::PlainCrawl, Self::Aggregate)
                | (Self::ScriptedCrawl, Self::Aggregate)
                | (Self::Aggregate, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Analyze => "analyze",
            Self::PlainCrawl => "plain_crawl",
            Self::ScriptedCrawl => "scripted_crawl",
            Self::Aggregate => "aggregate",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records the phase history of one crawl
#[derive(Debug, Clone)]
pub struct CrawlTracker {
    phase: CrawlPhase,
    history: Vec<CrawlPhase>,
    started_at: Instant,
}

impl CrawlTracker {
    pub fn new() -> Self {
        Self {
            phase: CrawlPhase::Init,
            history: vec![CrawlPhase::Init],
            started_at: Instant::now(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn history(&self) -> &[CrawlPhase] {
        &self.history
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn advance(&mut self, next: CrawlPhase) -> Result<(), ScrapeError> {
        if !self.phase.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Crawl phase {} -> {}", self.phase, next);
        self.phase = next;
        self.history.push(next);
        Ok(())
    }
}

impl Default for CrawlTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let mut tracker = CrawlTracker::new();
        for phase in [
            CrawlPhase::Analyze,
            CrawlPhase::PlainCrawl,
            CrawlPhase::Aggregate,
            CrawlPhase::Done,
        ] {
            tracker.advance(phase).unwrap();
        }
        assert!(tracker.phase().is_terminal());
        assert_eq!(tracker.history().len(), 5);
    }

    #[test]
    fn test_scripted_fallback_to_plain() {
        let mut tracker = CrawlTracker::new();
        tracker.advance(CrawlPhase::Analyze).unwrap();
        tracker.advance(CrawlPhase::ScriptedCrawl).unwrap();
        tracker.advance(CrawlPhase::PlainCrawl).unwrap();
        assert!(tracker.phase().is_crawling());
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!CrawlPhase::Init.can_transition_to(CrawlPhase::PlainCrawl));
        assert!(!CrawlPhase::PlainCrawl.can_transition_to(CrawlPhase::ScriptedCrawl));
        assert!(!CrawlPhase::Done.can_transition_to(CrawlPhase::Analyze));
        assert!(!CrawlPhase::Analyze.can_transition_to(CrawlPhase::Done));

        let mut tracker = CrawlTracker::new();
        assert!(tracker.advance(CrawlPhase::Done).is_err());
        assert_eq!(tracker.phase(), CrawlPhase::Init);
    }

    #[test]
    fn test_display() {
        assert_eq!(CrawlPhase::ScriptedCrawl.to_string(), "scripted_crawl");
    }
}
