//! Page fetching
//!
//! Builds the shared HTTP client (one per pipeline, carrying the crawler
//! user agent) and performs single-page fetches with error classification.
//! Admission decisions happen before this layer; fetch only talks HTTP.

use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::config::UserAgentConfig;

/// Result of a single page fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status: u16,
        /// Page body content
        body: String,
    },
    /// Server answered with a non-success status
    HttpStatus(u16),
    /// Connection, timeout, or transport failure
    Network(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the pipeline's HTTP client.
///
/// The user agent follows the `CrawlerName/Version (+ContactURL; ContactEmail)`
/// convention so site operators can identify and reach us. Redirects are
/// followed automatically up to the reqwest default of ten hops.
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one page and classifies the outcome.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A `FetchOutcome`; network errors are folded into descriptions rather than
/// bubbled, so callers decide retry policy from the variant alone.
pub async fn fetch_page(client: &Client, url: &Url) -> FetchOutcome {
    match client.get(url.clone()).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchOutcome::HttpStatus(status.as_u16());
            }

            match response.text().await {
                Ok(body) => FetchOutcome::Success {
                    final_url,
                    status: status.as_u16(),
                    body,
                },
                Err(e) => FetchOutcome::Network(format!("failed reading body: {}", e)),
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchOutcome::Network("request timeout".to_string())
            } else if e.is_connect() {
                FetchOutcome::Network(format!("connection failed: {}", e))
            } else {
                FetchOutcome::Network(e.to_string())
            }
        }
    }
}
