//! URL handling module for prospector
//!
//! This module provides domain extraction and crawl-target URL parsing. Every
//! URL entering the scheduler goes through [`parse_target`] so that the rest
//! of the crate can rely on an `http(s)` scheme and a present host.

mod domain;

use url::Url;

use crate::{UrlError, UrlResult};

// Re-export main functions
pub use domain::{extract_domain, require_domain};

/// Parses a raw URL string into a crawlable target URL plus its domain.
///
/// Rejects non-HTTP(S) schemes and URLs without a host, the two shapes the
/// scheduler cannot act on. The returned domain is the lowercased host with
/// any explicit port retained.
///
/// # Examples
///
/// ```
/// use prospector::url::parse_target;
///
/// let (url, domain) = parse_target("https://Example.COM/contact").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/contact");
/// assert_eq!(domain, "example.com");
///
/// assert!(parse_target("ftp://example.com/").is_err());
/// assert!(parse_target("not a url").is_err());
/// ```
pub fn parse_target(raw: &str) -> UrlResult<(Url, String)> {
    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    let domain = require_domain(&url)?;
    Ok((url, domain))
}
