//! Robots.txt policy implementation
//!
//! Wraps the robotstxt crate's matcher behind a small policy type. An
//! allow-all policy stands in whenever a robots.txt file is missing or
//! unreachable, so admission checks never hard-fail on robots problems.

use robotstxt::DefaultMatcher;

/// Robots.txt policy for a single domain
///
/// Holds the raw robots.txt content and answers allow/deny queries on demand.
/// Empty content and the explicit [`RobotsPolicy::allow_all`] constructor both
/// permit everything.
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content.
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows everything.
    ///
    /// Used as the fail-open default when robots.txt cannot be fetched
    /// (network error, 404, non-success status).
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns true if this is the permissive fail-open policy.
    pub fn is_allow_all(&self) -> bool {
        self.allow_all || self.content.is_empty()
    }

    /// Checks if a URL is allowed for the given user agent.
    ///
    /// # Arguments
    ///
    /// * `url` - The full URL to check (the matcher extracts the path)
    /// * `user_agent` - The agent token to match against robots groups
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        // Parse and check on-demand
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay in seconds for a specific user agent.
    ///
    /// The robotstxt matcher ignores the nonstandard `Crawl-delay` directive,
    /// so it is parsed out of the raw lines here. A delay declared for a
    /// matching agent group wins over a wildcard group's delay.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        if self.is_allow_all() {
            return None;
        }

        let agent = user_agent.to_lowercase();
        let mut group: Vec<String> = Vec::new();
        let mut wildcard_delay: Option<f64> = None;
        let mut agent_delay: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                // Consecutive User-agent lines form one group
                "user-agent" => group.push(value.to_lowercase()),
                "crawl-delay" => {
                    if let Ok(delay) = value.parse::<f64>() {
                        if group.iter().any(|g| g == "*") {
                            wildcard_delay = Some(delay);
                        } else if group.iter().any(|g| agent.contains(g.as_str())) {
                            agent_delay = Some(delay);
                        }
                    }
                    // Next User-agent line starts a fresh group
                    group.clear();
                }
                _ => {}
            }
        }

        agent_delay.or(wildcard_delay)
    }
}
