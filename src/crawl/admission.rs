//! Per-domain admission control
//!
//! Every fetch goes through the admission controller first. It keeps one
//! `DomainState` per domain (created lazily, kept for the process lifetime)
//! and answers with a single decision:
//! 1. robots.txt disallows the URL → skip permanently
//! 2. the domain budget is spent → skip permanently
//! 3. inside the politeness window → wait, with the time remaining
//! 4. otherwise → admit, stamping the window immediately
//!
//! The admission-time stamp means two callers racing on one domain cannot
//! both be admitted inside the same politeness window. Robots fetches happen
//! outside the state lock; the decision itself is computed under one lock
//! acquisition.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use url::Url;

use crate::config::CrawlConfig;
use crate::robots::{fetch_robots, robots_url_for};
use crate::state::DomainState;
use crate::url::require_domain;
use crate::UrlResult;

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Fetch now; the politeness window is already stamped
    Admit,
    /// Inside the politeness window; try again after this long
    Wait { retry_after: Duration },
    /// robots.txt disallows this URL for our agent
    SkipRobots,
    /// The domain's fetch budget is spent
    SkipBudget,
}

/// Gatekeeper for all outbound page fetches
pub struct AdmissionController {
    domains: Mutex<HashMap<String, DomainState>>,
    client: reqwest::Client,
    politeness_delay: Duration,
    budget_per_domain: u32,
    /// Agent token matched against robots.txt rules
    agent: String,
}

impl AdmissionController {
    /// Creates a controller from crawl config.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client, used only for robots.txt fetches here
    /// * `config` - The `[crawl]` section (politeness delay, budget)
    /// * `agent` - The robots.txt agent token, normally the crawler name
    pub fn new(client: reqwest::Client, config: &CrawlConfig, agent: String) -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
            client,
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
            budget_per_domain: config.crawl_budget_per_domain,
            agent,
        }
    }

    /// Decides whether `url` may be fetched right now.
    ///
    /// Fetches and caches the domain's robots.txt on first contact (and when
    /// the cache goes stale). `Admit` stamps the politeness window at return
    /// time, so the caller is expected to actually fetch.
    ///
    /// # Returns
    ///
    /// * `Ok(AdmissionDecision)` - The decision for this URL
    /// * `Err(UrlError)` - The URL has no domain to key state on
    pub async fn may_fetch(&self, url: &Url) -> UrlResult<AdmissionDecision> {
        let domain = require_domain(url)?;

        let needs_robots = {
            let mut guard = self.domains.lock().unwrap();
            let state = guard
                .entry(domain.clone())
                .or_insert_with(|| DomainState::new(self.budget_per_domain));
            state.needs_robots_fetch()
        };

        if needs_robots {
            // Concurrent callers may both fetch; the second write wins and
            // both see a fresh policy.
            let robots_url = robots_url_for(url);
            let policy = fetch_robots(&self.client, &robots_url).await;
            let mut guard = self.domains.lock().unwrap();
            if let Some(state) = guard.get_mut(&domain) {
                if state.needs_robots_fetch() {
                    state.set_robots(policy);
                }
            }
        }

        let mut guard = self.domains.lock().unwrap();
        let state = guard
            .entry(domain.clone())
            .or_insert_with(|| DomainState::new(self.budget_per_domain));

        if let Some(robots) = &state.robots {
            if !robots.is_allowed(url.as_str(), &self.agent) {
                tracing::info!("Robots.txt disallows {} for agent {}", url, self.agent);
                return Ok(AdmissionDecision::SkipRobots);
            }
        }

        if state.budget_exhausted() {
            tracing::info!("Crawl budget exhausted for domain {}", domain);
            return Ok(AdmissionDecision::SkipBudget);
        }

        let now = Instant::now();
        if let Some(retry_after) = state.politeness_remaining(self.politeness_delay, now) {
            return Ok(AdmissionDecision::Wait { retry_after });
        }

        state.record_admission(now);
        tracing::debug!("Admitted fetch of {} (domain {})", url, domain);
        Ok(AdmissionDecision::Admit)
    }

    /// Records the outcome of an admitted fetch.
    ///
    /// A successful fetch re-stamps the politeness window from completion
    /// time and charges one unit of budget. A failed fetch leaves the domain
    /// state untouched, so failures are never billed.
    pub fn record_outcome(&self, url: &Url, success: bool) {
        if !success {
            return;
        }
        let Ok(domain) = require_domain(url) else {
            return;
        };
        let mut guard = self.domains.lock().unwrap();
        if let Some(state) = guard.get_mut(&domain) {
            state.record_success(Instant::now());
            tracing::debug!(
                "Fetch of {} succeeded, {} budget left for {}",
                url,
                state.remaining_budget,
                domain
            );
        }
    }

    /// Remaining fetch budget for a domain, if it has been touched.
    pub fn remaining_budget(&self, domain: &str) -> Option<u32> {
        self.domains
            .lock()
            .unwrap()
            .get(domain)
            .map(|s| s.remaining_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_crawl_config(budget: u32) -> CrawlConfig {
        CrawlConfig {
            politeness_delay_ms: 100,
            crawl_budget_per_domain: budget,
            max_retries: 2,
            max_crawl_fanout: 10,
            fetch_timeout_secs: 5,
        }
    }

    fn controller(budget: u32) -> AdmissionController {
        AdmissionController::new(
            reqwest::Client::new(),
            &test_crawl_config(budget),
            "TestBot".to_string(),
        )
    }

    async fn server_without_robots() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        server
    }

    async fn server_with_robots(robots_body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(robots_body.to_string()))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_first_fetch_admitted() {
        let server = server_without_robots().await;
        let admission = controller(100);
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::Admit
        );
    }

    #[tokio::test]
    async fn test_second_fetch_waits_inside_window() {
        let server = server_without_robots().await;
        let admission = controller(100);
        let a = Url::parse(&format!("{}/a", server.uri())).unwrap();
        let b = Url::parse(&format!("{}/b", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&a).await.unwrap(),
            AdmissionDecision::Admit
        );
        match admission.may_fetch(&b).await.unwrap() {
            AdmissionDecision::Wait { retry_after } => {
                assert!(retry_after <= Duration::from_millis(100));
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("expected Wait, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_window_reopens_after_delay() {
        let server = server_without_robots().await;
        let admission = controller(100);
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::Admit
        );
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::Admit
        );
    }

    #[tokio::test]
    async fn test_domains_have_independent_windows() {
        let first = server_without_robots().await;
        let second = server_without_robots().await;
        let admission = controller(100);
        let a = Url::parse(&format!("{}/a", first.uri())).unwrap();
        let b = Url::parse(&format!("{}/b", second.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&a).await.unwrap(),
            AdmissionDecision::Admit
        );
        // Different port, different domain key, no shared window
        assert_eq!(
            admission.may_fetch(&b).await.unwrap(),
            AdmissionDecision::Admit
        );
    }

    #[tokio::test]
    async fn test_robots_disallow_skips_permanently() {
        let server = server_with_robots("User-agent: *\nDisallow: /").await;
        let admission = controller(100);
        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::SkipRobots
        );
        // Still skipped on retry; robots decisions are permanent
        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::SkipRobots
        );
    }

    #[tokio::test]
    async fn test_robots_partial_disallow_admits_open_paths() {
        let server = server_with_robots("User-agent: *\nDisallow: /private").await;
        let admission = controller(100);
        let blocked = Url::parse(&format!("{}/private/page", server.uri())).unwrap();
        let open = Url::parse(&format!("{}/public", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&blocked).await.unwrap(),
            AdmissionDecision::SkipRobots
        );
        assert_eq!(
            admission.may_fetch(&open).await.unwrap(),
            AdmissionDecision::Admit
        );
    }

    #[tokio::test]
    async fn test_missing_robots_fails_open() {
        let server = server_without_robots().await;
        let admission = controller(100);
        let url = Url::parse(&format!("{}/anything", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::Admit
        );
    }

    #[tokio::test]
    async fn test_budget_exhaustion_skips() {
        let server = server_without_robots().await;
        let admission = controller(1);
        let url = Url::parse(&format!("{}/a", server.uri())).unwrap();

        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::Admit
        );
        admission.record_outcome(&url, true);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let next = Url::parse(&format!("{}/b", server.uri())).unwrap();
        assert_eq!(
            admission.may_fetch(&next).await.unwrap(),
            AdmissionDecision::SkipBudget
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_not_billed() {
        let server = server_without_robots().await;
        let admission = controller(5);
        let url = Url::parse(&format!("{}/a", server.uri())).unwrap();
        let domain = require_domain(&url).unwrap();

        assert_eq!(
            admission.may_fetch(&url).await.unwrap(),
            AdmissionDecision::Admit
        );
        admission.record_outcome(&url, false);
        assert_eq!(admission.remaining_budget(&domain), Some(5));

        admission.record_outcome(&url, true);
        assert_eq!(admission.remaining_budget(&domain), Some(4));
    }

    #[tokio::test]
    async fn test_untouched_domain_has_no_budget_entry() {
        let admission = controller(5);
        assert_eq!(admission.remaining_budget("example.com"), None);
    }
}
