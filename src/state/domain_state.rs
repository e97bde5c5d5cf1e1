use std::time::{Duration, Instant};

use crate::robots::{CachedRobots, RobotsPolicy};

/// Tracks per-domain crawl state
///
/// One record per domain, created lazily on first touch and kept for the
/// process lifetime. Holds everything admission decisions need: the last
/// fetch time for politeness spacing, the remaining fetch budget, and the
/// cached robots.txt policy.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Timestamp of the most recent admitted or completed fetch
    pub last_fetch_at: Option<Instant>,

    /// Fetches left for this domain; never goes below zero
    pub remaining_budget: u32,

    /// Cached robots.txt policy for this domain
    pub robots: Option<CachedRobots>,
}

impl DomainState {
    /// Creates a fresh state with the full per-domain budget.
    pub fn new(budget: u32) -> Self {
        Self {
            last_fetch_at: None,
            remaining_budget: budget,
            robots: None,
        }
    }

    /// Returns true once the fetch budget is used up.
    pub fn budget_exhausted(&self) -> bool {
        self.remaining_budget == 0
    }

    /// Time left inside the politeness window, or `None` if a fetch may be
    /// admitted now.
    ///
    /// # Arguments
    ///
    /// * `delay` - The configured minimum spacing between fetches
    /// * `now` - The current time instant
    pub fn politeness_remaining(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_fetch_at?;
        let elapsed = now.duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Stamps the domain at admission time.
    ///
    /// The stamp reserves the politeness window, so a second caller cannot be
    /// admitted to the same domain before the delay passes even while the
    /// first fetch is still in flight.
    pub fn record_admission(&mut self, now: Instant) {
        self.last_fetch_at = Some(now);
    }

    /// Records a completed successful fetch: re-stamps the window and charges
    /// one unit of budget (saturating).
    pub fn record_success(&mut self, now: Instant) {
        self.last_fetch_at = Some(now);
        self.remaining_budget = self.remaining_budget.saturating_sub(1);
    }

    /// Returns true if robots.txt needs (re)fetching for this domain.
    pub fn needs_robots_fetch(&self) -> bool {
        match &self.robots {
            Some(cached) => cached.is_stale(),
            None => true,
        }
    }

    /// Installs a freshly fetched robots.txt policy.
    pub fn set_robots(&mut self, policy: RobotsPolicy) {
        self.robots = Some(CachedRobots::new(policy));
    }
}
