//! Crawl frontier scheduling
//!
//! The scheduler owns the pending target list and the per-URL bookkeeping
//! (visited, in progress, terminal statuses). It leans on the admission
//! controller for every handout: a target leaves the frontier only once its
//! domain admits it. Politeness-blocked targets are requeued at the tail
//! rather than waited on, so a single slow domain never stalls the rest of
//! the frontier.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use super::admission::{AdmissionController, AdmissionDecision};
use super::target::{CrawlTarget, EnqueueOutcome};
use crate::config::CrawlConfig;
use crate::state::TargetStatus;
use crate::url::parse_target;
use crate::UrlResult;

/// Counts of frontier targets by status
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStats {
    pub queued: usize,
    pub in_progress: usize,
    pub retrying: usize,
    pub done: usize,
    pub skipped_robots: usize,
    pub skipped_budget: usize,
    pub failed: usize,
}

struct SchedulerInner {
    /// Waiting targets; enqueue inserts in (priority, url) order, requeues
    /// append at the tail
    pending: VecDeque<CrawlTarget>,
    in_progress: HashSet<String>,
    visited: HashSet<String>,
    statuses: HashMap<String, TargetStatus>,
}

/// The crawl frontier
pub struct CrawlScheduler {
    inner: Mutex<SchedulerInner>,
    admission: Arc<AdmissionController>,
    max_retries: u32,
}

impl CrawlScheduler {
    pub fn new(admission: Arc<AdmissionController>, config: &CrawlConfig) -> Self {
        Self {
            inner: Mutex::new(SchedulerInner {
                pending: VecDeque::new(),
                in_progress: HashSet::new(),
                visited: HashSet::new(),
                statuses: HashMap::new(),
            }),
            admission,
            max_retries: config.max_retries,
        }
    }

    /// Adds a URL to the frontier.
    ///
    /// The URL is parsed and must carry a fetchable domain. Duplicates are
    /// dropped, with the outcome reporting where the earlier copy sits.
    ///
    /// # Returns
    ///
    /// * `Ok(EnqueueOutcome)` - Queued, or which duplicate case applied
    /// * `Err(UrlError)` - The URL failed to parse or has no domain
    pub fn enqueue(&self, raw_url: &str, priority: i32) -> UrlResult<EnqueueOutcome> {
        let (url, domain) = parse_target(raw_url)?;
        let key = url.as_str().to_string();

        let mut guard = self.inner.lock().unwrap();
        if let Some(status) = guard.statuses.get(&key) {
            let outcome = match status {
                s if s.is_terminal() => EnqueueOutcome::AlreadyFinished,
                TargetStatus::InProgress => EnqueueOutcome::AlreadyInProgress,
                _ => EnqueueOutcome::AlreadyQueued,
            };
            tracing::debug!("Dropping duplicate enqueue of {} ({:?})", key, outcome);
            return Ok(outcome);
        }

        let target = CrawlTarget::new(url, domain, priority);
        let position = guard
            .pending
            .iter()
            .position(|t| (t.priority, t.url.as_str()) > (priority, key.as_str()))
            .unwrap_or(guard.pending.len());
        guard.pending.insert(position, target);
        guard.statuses.insert(key.clone(), TargetStatus::Pending);
        tracing::debug!("Queued crawl target {} (priority {})", key, priority);
        Ok(EnqueueOutcome::Queued)
    }

    /// Hands out the next admissible target, if any.
    ///
    /// Scans the pending list front to back, at most one full pass per call:
    /// skip decisions finish targets permanently, politeness waits requeue at
    /// the tail, and the first admitted target is returned as in-progress.
    /// Returns `None` when nothing is admissible right now; callers poll
    /// again later.
    ///
    /// The frontier lock is never held across the admission check.
    pub async fn next_target(&self) -> Option<CrawlTarget> {
        let scan_limit = self.inner.lock().unwrap().pending.len();

        for _ in 0..scan_limit {
            let mut target = {
                let mut guard = self.inner.lock().unwrap();
                loop {
                    let candidate = guard.pending.pop_front()?;
                    if guard.visited.contains(candidate.key()) {
                        continue;
                    }
                    break candidate;
                }
            };

            match self.admission.may_fetch(&target.url).await {
                Ok(AdmissionDecision::Admit) => {
                    target.last_attempt_at = Some(chrono::Utc::now());
                    let mut guard = self.inner.lock().unwrap();
                    let key = target.key().to_string();
                    guard.in_progress.insert(key.clone());
                    guard.statuses.insert(key, TargetStatus::InProgress);
                    return Some(target);
                }
                Ok(AdmissionDecision::Wait { retry_after }) => {
                    tracing::debug!(
                        "Target {} blocked for {}ms, requeueing",
                        target.key(),
                        retry_after.as_millis()
                    );
                    let mut guard = self.inner.lock().unwrap();
                    guard.pending.push_back(target);
                }
                Ok(AdmissionDecision::SkipRobots) => {
                    self.finish(&target, TargetStatus::SkippedRobots);
                }
                Ok(AdmissionDecision::SkipBudget) => {
                    self.finish(&target, TargetStatus::SkippedBudget);
                }
                Err(e) => {
                    tracing::warn!("Admission check failed for {}: {}", target.key(), e);
                    self.finish(&target, TargetStatus::Failed);
                }
            }
        }
        None
    }

    /// Records a successfully fetched target.
    pub fn mark_done(&self, target: &CrawlTarget) {
        {
            let mut guard = self.inner.lock().unwrap();
            let key = target.key().to_string();
            guard.in_progress.remove(&key);
            guard.visited.insert(key.clone());
            guard.statuses.insert(key, TargetStatus::Done);
        }
        self.admission.record_outcome(&target.url, true);
        tracing::info!("Crawled {}", target.key());
    }

    /// Records a failed fetch, requeueing the target until the retry ceiling.
    pub fn mark_failed(&self, mut target: CrawlTarget) {
        self.admission.record_outcome(&target.url, false);

        let mut guard = self.inner.lock().unwrap();
        let key = target.key().to_string();
        guard.in_progress.remove(&key);
        target.retry_count += 1;

        if target.retry_count > self.max_retries {
            tracing::warn!(
                "Target {} failed permanently after {} attempts",
                key,
                target.retry_count
            );
            guard.statuses.insert(key, TargetStatus::Failed);
        } else {
            tracing::info!(
                "Target {} failed (attempt {}), requeueing",
                key,
                target.retry_count
            );
            guard.statuses.insert(key.clone(), TargetStatus::Retrying);
            guard.pending.push_back(target);
        }
    }

    /// Looks up the status of a URL, accepting unnormalized input.
    pub fn status_of(&self, url: &str) -> Option<TargetStatus> {
        let key = match parse_target(url) {
            Ok((parsed, _)) => parsed.as_str().to_string(),
            Err(_) => url.to_string(),
        };
        self.inner.lock().unwrap().statuses.get(&key).copied()
    }

    /// Counts targets by status.
    pub fn stats(&self) -> CrawlStats {
        let guard = self.inner.lock().unwrap();
        let mut stats = CrawlStats::default();
        for status in guard.statuses.values() {
            match status {
                TargetStatus::Pending => stats.queued += 1,
                TargetStatus::InProgress => stats.in_progress += 1,
                TargetStatus::Retrying => stats.retrying += 1,
                TargetStatus::Done => stats.done += 1,
                TargetStatus::SkippedRobots => stats.skipped_robots += 1,
                TargetStatus::SkippedBudget => stats.skipped_budget += 1,
                TargetStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// True while targets are queued or being fetched.
    pub fn has_pending_work(&self) -> bool {
        let guard = self.inner.lock().unwrap();
        !guard.pending.is_empty() || !guard.in_progress.is_empty()
    }

    /// Finishes a target in a terminal skip/fail state.
    fn finish(&self, target: &CrawlTarget, status: TargetStatus) {
        let mut guard = self.inner.lock().unwrap();
        let key = target.key().to_string();
        guard.in_progress.remove(&key);
        guard.statuses.insert(key, status);
        tracing::info!("Target {} finished as {}", target.key(), status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_crawl_config(budget: u32, max_retries: u32) -> CrawlConfig {
        CrawlConfig {
            politeness_delay_ms: 100,
            crawl_budget_per_domain: budget,
            max_retries,
            max_crawl_fanout: 10,
            fetch_timeout_secs: 5,
        }
    }

    fn build_scheduler(budget: u32, max_retries: u32) -> CrawlScheduler {
        let config = test_crawl_config(budget, max_retries);
        let admission = Arc::new(AdmissionController::new(
            reqwest::Client::new(),
            &config,
            "TestBot".to_string(),
        ));
        CrawlScheduler::new(admission, &config)
    }

    async fn mock_site() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        server
    }

    async fn mock_site_with_robots(robots_body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(robots_body.to_string()))
            .mount(&server)
            .await;
        server
    }

    async fn wait_politeness() {
        tokio::time::sleep(Duration::from_millis(120)).await;
    }

    #[test]
    fn test_enqueue_reports_duplicates() {
        let scheduler = build_scheduler(100, 2);
        assert_eq!(
            scheduler.enqueue("https://example.com/a", 0).unwrap(),
            EnqueueOutcome::Queued
        );
        assert_eq!(
            scheduler.enqueue("https://example.com/a", 5).unwrap(),
            EnqueueOutcome::AlreadyQueued
        );
        assert_eq!(scheduler.stats().queued, 1);
    }

    #[test]
    fn test_enqueue_rejects_invalid_urls() {
        let scheduler = build_scheduler(100, 2);
        assert!(scheduler.enqueue("ftp://example.com/file", 0).is_err());
        assert!(scheduler.enqueue("not a url", 0).is_err());
        assert_eq!(scheduler.stats().queued, 0);
    }

    #[tokio::test]
    async fn test_next_target_serves_priority_order() {
        let server = mock_site().await;
        let scheduler = build_scheduler(100, 2);
        scheduler
            .enqueue(&format!("{}/b", server.uri()), 5)
            .unwrap();
        scheduler
            .enqueue(&format!("{}/a", server.uri()), 9)
            .unwrap();
        scheduler
            .enqueue(&format!("{}/c", server.uri()), 0)
            .unwrap();

        let first = scheduler.next_target().await.unwrap();
        assert!(first.key().ends_with("/c"));
        scheduler.mark_done(&first);

        wait_politeness().await;
        let second = scheduler.next_target().await.unwrap();
        assert!(second.key().ends_with("/b"));
        scheduler.mark_done(&second);

        wait_politeness().await;
        let third = scheduler.next_target().await.unwrap();
        assert!(third.key().ends_with("/a"));
        scheduler.mark_done(&third);

        wait_politeness().await;
        assert!(scheduler.next_target().await.is_none());
    }

    #[tokio::test]
    async fn test_equal_priorities_serve_url_order() {
        let server = mock_site().await;
        let scheduler = build_scheduler(100, 2);
        scheduler
            .enqueue(&format!("{}/c", server.uri()), 0)
            .unwrap();
        scheduler
            .enqueue(&format!("{}/a", server.uri()), 0)
            .unwrap();
        scheduler
            .enqueue(&format!("{}/b", server.uri()), 0)
            .unwrap();

        let first = scheduler.next_target().await.unwrap();
        assert!(first.key().ends_with("/a"));
        scheduler.mark_done(&first);

        wait_politeness().await;
        let second = scheduler.next_target().await.unwrap();
        assert!(second.key().ends_with("/b"));
    }

    #[tokio::test]
    async fn test_politeness_blocked_target_stays_queued() {
        let server = mock_site().await;
        let scheduler = build_scheduler(100, 2);
        scheduler
            .enqueue(&format!("{}/a", server.uri()), 0)
            .unwrap();
        scheduler
            .enqueue(&format!("{}/b", server.uri()), 0)
            .unwrap();

        let first = scheduler.next_target().await.unwrap();
        assert!(first.key().ends_with("/a"));

        // Same domain inside the window: nothing admissible, b keeps waiting
        assert!(scheduler.next_target().await.is_none());
        let stats = scheduler.stats();
        assert_eq!(stats.queued, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(
            scheduler.status_of(&format!("{}/b", server.uri())),
            Some(TargetStatus::Pending)
        );
    }

    #[tokio::test]
    async fn test_robots_disallow_finishes_target() {
        let server = mock_site_with_robots("User-agent: *\nDisallow: /").await;
        let scheduler = build_scheduler(100, 2);
        let url = format!("{}/page", server.uri());
        scheduler.enqueue(&url, 0).unwrap();

        assert!(scheduler.next_target().await.is_none());
        assert_eq!(scheduler.status_of(&url), Some(TargetStatus::SkippedRobots));
        assert_eq!(scheduler.stats().skipped_robots, 1);
        assert!(!scheduler.has_pending_work());

        // The skip is permanent
        assert_eq!(
            scheduler.enqueue(&url, 0).unwrap(),
            EnqueueOutcome::AlreadyFinished
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_finishes_target() {
        let server = mock_site().await;
        let scheduler = build_scheduler(1, 2);
        let first_url = format!("{}/a", server.uri());
        let second_url = format!("{}/b", server.uri());
        scheduler.enqueue(&first_url, 0).unwrap();
        scheduler.enqueue(&second_url, 1).unwrap();

        let first = scheduler.next_target().await.unwrap();
        scheduler.mark_done(&first);
        assert_eq!(scheduler.status_of(&first_url), Some(TargetStatus::Done));

        wait_politeness().await;
        assert!(scheduler.next_target().await.is_none());
        assert_eq!(
            scheduler.status_of(&second_url),
            Some(TargetStatus::SkippedBudget)
        );
    }

    #[tokio::test]
    async fn test_mark_failed_requeues_until_ceiling() {
        let server = mock_site().await;
        let scheduler = build_scheduler(100, 1);
        let url = format!("{}/flaky", server.uri());
        scheduler.enqueue(&url, 0).unwrap();

        let first_try = scheduler.next_target().await.unwrap();
        let first_attempt_at = first_try.last_attempt_at.unwrap();
        scheduler.mark_failed(first_try);
        assert_eq!(scheduler.status_of(&url), Some(TargetStatus::Retrying));
        assert_eq!(scheduler.stats().retrying, 1);

        wait_politeness().await;
        let second_try = scheduler.next_target().await.unwrap();
        assert_eq!(second_try.retry_count, 1);
        assert!(second_try.last_attempt_at.unwrap() > first_attempt_at);
        scheduler.mark_failed(second_try);

        // Past the ceiling: permanent, never handed out again
        assert_eq!(scheduler.status_of(&url), Some(TargetStatus::Failed));
        wait_politeness().await;
        assert!(scheduler.next_target().await.is_none());
        assert!(!scheduler.has_pending_work());
    }

    #[tokio::test]
    async fn test_mark_done_settles_target() {
        let server = mock_site().await;
        let scheduler = build_scheduler(100, 2);
        let url = format!("{}/done", server.uri());
        scheduler.enqueue(&url, 0).unwrap();

        let target = scheduler.next_target().await.unwrap();
        assert!(target.last_attempt_at.is_some());
        assert!(scheduler.has_pending_work());
        scheduler.mark_done(&target);

        assert_eq!(scheduler.status_of(&url), Some(TargetStatus::Done));
        assert_eq!(scheduler.stats().done, 1);
        assert!(!scheduler.has_pending_work());
        assert_eq!(
            scheduler.enqueue(&url, 0).unwrap(),
            EnqueueOutcome::AlreadyFinished
        );
    }

    #[tokio::test]
    async fn test_status_of_normalizes_input() {
        let server = mock_site().await;
        let scheduler = build_scheduler(100, 2);
        // No trailing slash; parsing normalizes to the root path
        scheduler.enqueue(&server.uri(), 0).unwrap();

        assert_eq!(
            scheduler.status_of(&format!("{}/", server.uri())),
            Some(TargetStatus::Pending)
        );
        assert_eq!(
            scheduler.status_of(&server.uri()),
            Some(TargetStatus::Pending)
        );
    }
}
