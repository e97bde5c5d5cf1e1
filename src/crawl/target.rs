//! Crawl target and enqueue outcome types

use chrono::{DateTime, Utc};
use url::Url;

/// One URL tracked by the crawl frontier
///
/// Targets are created by [`CrawlScheduler::enqueue`](super::CrawlScheduler)
/// and handed out by `next_target`; callers pass them back through
/// `mark_done` / `mark_failed`.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    pub url: Url,
    /// Lowercased host (plus any explicit port), the admission-control key
    pub domain: String,
    /// Lower values are served first
    pub priority: i32,
    /// Failed fetch attempts so far
    pub retry_count: u32,
    /// When this target was last admitted for a fetch attempt
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl CrawlTarget {
    pub(crate) fn new(url: Url, domain: String, priority: i32) -> Self {
        Self {
            url,
            domain,
            priority,
            retry_count: 0,
            last_attempt_at: None,
        }
    }

    /// The frontier's bookkeeping key for this target.
    pub fn key(&self) -> &str {
        self.url.as_str()
    }
}

/// What happened to an enqueue request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Fresh URL, now queued
    Queued,
    /// Already waiting in the pending list
    AlreadyQueued,
    /// Currently being fetched
    AlreadyInProgress,
    /// Finished earlier (done, skipped, or permanently failed)
    AlreadyFinished,
}

impl EnqueueOutcome {
    /// True when the call added new work to the frontier.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Queued)
    }
}
