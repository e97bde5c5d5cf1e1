use url::Url;

use crate::{UrlError, UrlResult};

/// Extracts the domain from a URL
///
/// Retrieves the host portion of a URL, converts it to lowercase, and keeps
/// any explicit non-default port. Two servers on different ports of one host
/// are separate authorities and get separate admission state. Returns `None`
/// for URLs without a host (file:, mailto:, data: and friends).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use prospector::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://localhost:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("localhost:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Like [`extract_domain`] but treats a missing host as an error.
///
/// Admission decisions are keyed by domain, so a URL without one cannot enter
/// the scheduler at all.
pub fn require_domain(url: &Url) -> UrlResult<String> {
    extract_domain(url).ok_or(UrlError::MissingDomain)
}
