//! Robots.txt handling module
//!
//! Fetching, parsing, and caching of per-domain robots.txt policies. The
//! fetch path is fail-open: a missing, erroring, or non-200 robots.txt yields
//! an allow-all policy, so a broken robots endpoint never stalls crawling.

mod parser;

pub use parser::RobotsPolicy;

use chrono::{DateTime, Duration, Utc};
use url::Url;

/// A fetched robots.txt policy plus its fetch timestamp.
///
/// Cached inside each domain's state; refetched once it goes stale.
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt policy
    pub policy: RobotsPolicy,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps a freshly fetched policy with the current timestamp.
    pub fn new(policy: RobotsPolicy) -> Self {
        Self {
            policy,
            fetched_at: Utc::now(),
        }
    }

    /// Returns true once the cached policy is older than 24 hours.
    ///
    /// Site owners expect robots.txt changes to be picked up within a day.
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    /// Returns how long ago the policy was fetched.
    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    /// Checks if a URL is allowed according to the cached policy.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.policy.is_allowed(url, user_agent)
    }
}

/// Builds the robots.txt URL for a target URL's origin.
///
/// Preserves scheme, host, and any explicit port, so mock servers on
/// nonstandard ports resolve their own robots.txt.
pub fn robots_url_for(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    }
}

/// Fetches and parses robots.txt, failing open on any problem.
///
/// # Arguments
///
/// * `client` - The shared HTTP client (carries the crawler user agent)
/// * `robots_url` - The robots.txt URL, usually from [`robots_url_for`]
///
/// # Returns
///
/// The parsed policy on HTTP 200, otherwise an allow-all policy. This
/// function never errors; the decision to skip a domain belongs to the
/// admission layer, not the fetch.
pub async fn fetch_robots(client: &reqwest::Client, robots_url: &str) -> RobotsPolicy {
    match client.get(robots_url).send().await {
        Ok(resp) if resp.status().is_success() => match resp.text().await {
            Ok(body) => {
                tracing::debug!("Fetched robots.txt from {} ({} bytes)", robots_url, body.len());
                RobotsPolicy::from_content(&body)
            }
            Err(e) => {
                tracing::debug!("Unreadable robots.txt body from {}: {}", robots_url, e);
                RobotsPolicy::allow_all()
            }
        },
        Ok(resp) => {
            tracing::debug!(
                "No robots.txt at {} (status {}), allowing all",
                robots_url,
                resp.status()
            );
            RobotsPolicy::allow_all()
        }
        Err(e) => {
            tracing::debug!("Failed to fetch robots.txt from {}: {}", robots_url, e);
            RobotsPolicy::allow_all()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_robots_url_default_port() {
        let url = Url::parse("https://example.com/deep/page?q=1").unwrap();
        assert_eq!(robots_url_for(&url), "https://example.com/robots.txt");
    }

    #[test]
    fn test_robots_url_explicit_port() {
        let url = Url::parse("http://127.0.0.1:9090/page").unwrap();
        assert_eq!(robots_url_for(&url), "http://127.0.0.1:9090/robots.txt");
    }

    #[test]
    fn test_new_cache_not_stale() {
        let cache = CachedRobots::new(RobotsPolicy::allow_all());
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_cache_stale_after_25_hours() {
        let mut cache = CachedRobots::new(RobotsPolicy::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cache.is_stale());
    }

    #[test]
    fn test_cache_fresh_at_23_hours() {
        let mut cache = CachedRobots::new(RobotsPolicy::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cache.is_stale());
    }

    #[tokio::test]
    async fn test_fetch_robots_parses_disallow() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let robots_url = format!("{}/robots.txt", server.uri());
        let policy = fetch_robots(&client, &robots_url).await;

        let page = format!("{}/private/x", server.uri());
        assert!(!policy.is_allowed(&page, "TestBot"));
        let open = format!("{}/public", server.uri());
        assert!(policy.is_allowed(&open, "TestBot"));
    }

    #[tokio::test]
    async fn test_fetch_robots_404_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let policy = fetch_robots(&client, &format!("{}/robots.txt", server.uri())).await;
        assert!(policy.is_allow_all());
    }

    #[tokio::test]
    async fn test_fetch_robots_server_error_fails_open() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let policy = fetch_robots(&client, &format!("{}/robots.txt", server.uri())).await;
        assert!(policy.is_allow_all());
    }

    #[tokio::test]
    async fn test_fetch_robots_unreachable_fails_open() {
        // Nothing listens on this port
        let client = reqwest::Client::new();
        let policy = fetch_robots(&client, "http://127.0.0.1:1/robots.txt").await;
        assert!(policy.is_allow_all());
    }
}
