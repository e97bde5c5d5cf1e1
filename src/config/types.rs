use serde::Deserialize;

/// Main configuration structure for prospector
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub crawl: CrawlConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub seeds: Vec<SeedEntry>,
}

/// Job scheduler and worker behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// How long an idle worker sleeps before polling the queue again (milliseconds)
    #[serde(rename = "poll-interval-ms")]
    pub poll_interval_ms: u64,

    /// Wall-clock timeout for a search job (seconds)
    #[serde(rename = "search-timeout-secs")]
    pub search_timeout_secs: u64,

    /// Wall-clock timeout for a crawl job (seconds)
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: u64,

    /// Wall-clock timeout for a lead-processing job (seconds)
    #[serde(rename = "lead-timeout-secs")]
    pub lead_timeout_secs: u64,
}

/// Crawl admission and politeness configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Minimum time between fetches to the same domain (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Maximum successful fetches per domain for the process lifetime
    #[serde(rename = "crawl-budget-per-domain")]
    pub crawl_budget_per_domain: u32,

    /// How many times a failing target is retried before it fails permanently
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Cap on crawl jobs fanned out from one search job
    #[serde(rename = "max-crawl-fanout")]
    pub max_crawl_fanout: usize,

    /// Timeout for a single outbound page fetch (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler (also the robots.txt agent token)
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// A seed URL the frontier starts from
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Seed URL to enqueue at startup
    pub url: String,

    /// Queue priority; lower values are served first
    #[serde(default)]
    pub priority: i32,
}
