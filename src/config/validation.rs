use crate::config::types::{Config, CrawlConfig, SchedulerConfig, SeedEntry, UserAgentConfig};
use crate::url::parse_target;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_crawl_config(&config.crawl)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates scheduler timing configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.poll_interval_ms < 50 || config.poll_interval_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be between 50 and 60000, got {}",
            config.poll_interval_ms
        )));
    }

    for (name, secs) in [
        ("search_timeout_secs", config.search_timeout_secs),
        ("crawl_timeout_secs", config.crawl_timeout_secs),
        ("lead_timeout_secs", config.lead_timeout_secs),
    ] {
        if secs < 1 || secs > 3600 {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 3600, got {}",
                name, secs
            )));
        }
    }

    Ok(())
}

/// Validates crawl admission configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.politeness_delay_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "politeness_delay_ms must be >= 100ms, got {}ms",
            config.politeness_delay_ms
        )));
    }

    if config.crawl_budget_per_domain < 1 {
        return Err(ConfigError::Validation(format!(
            "crawl_budget_per_domain must be >= 1, got {}",
            config.crawl_budget_per_domain
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.max_crawl_fanout < 1 || config.max_crawl_fanout > 100 {
        return Err(ConfigError::Validation(format!(
            "max_crawl_fanout must be between 1 and 100, got {}",
            config.max_crawl_fanout
        )));
    }

    if config.fetch_timeout_secs < 1 || config.fetch_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "fetch_timeout_secs must be between 1 and 300, got {}",
            config.fetch_timeout_secs
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates seed URL entries
fn validate_seeds(seeds: &[SeedEntry]) -> Result<(), ConfigError> {
    for seed in seeds {
        parse_target(&seed.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed.url, e)))?;
    }
    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    // Must contain exactly one @ with text on both sides
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    // Domain part should contain at least one dot
    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
