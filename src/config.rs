use std::env;

use crate::error::{Error, Result};
use crate::query::{ApiEndpoint, DEFAULT_API_URL, DEFAULT_API_VERSION};
use crate::types::{Credentials, RateLimitsSource};

/// Runtime configuration for the Twitter client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: Option<String>,
    pub api_url: String,
    pub api_version: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub rate_limits_source: RateLimitsSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: 30,
            max_retries: 5,
            rate_limits_source: RateLimitsSource::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("tweetkit/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - TWITTER_BEARER_TOKEN (or TWITTER_TOKEN), required by [`Config::credentials`]
    /// - TWITTER_API_URL (default: https://api.twitter.com)
    /// - TWITTER_API_VERSION (default: 1.1)
    /// - TWITTER_HTTP_TIMEOUT_SECS (default: 30)
    /// - TWITTER_MAX_RETRIES (default: 5)
    /// - TWITTER_USER_AGENT (default: tweetkit/<version>)
    /// - TWITTER_RATE_LIMITS_SOURCE (default: cache-or-twitter-api)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let token = env::var("TWITTER_BEARER_TOKEN")
            .or_else(|_| env::var("TWITTER_TOKEN"))
            .ok()
            .filter(|t| !t.is_empty());
        let api_url = env::var("TWITTER_API_URL").unwrap_or(defaults.api_url);
        let api_version = env::var("TWITTER_API_VERSION").unwrap_or(defaults.api_version);
        let timeout_secs = parse_var("TWITTER_HTTP_TIMEOUT_SECS")?.unwrap_or(defaults.timeout_secs);
        let max_retries = parse_var("TWITTER_MAX_RETRIES")?.unwrap_or(defaults.max_retries);
        let user_agent = env::var("TWITTER_USER_AGENT").unwrap_or(defaults.user_agent);
        let rate_limits_source = match env::var("TWITTER_RATE_LIMITS_SOURCE") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.rate_limits_source,
        };

        Ok(Self {
            token,
            api_url,
            api_version,
            user_agent,
            timeout_secs,
            max_retries,
            rate_limits_source,
        })
    }

    pub fn endpoint(&self) -> ApiEndpoint {
        ApiEndpoint::new(&self.api_url, &self.api_version)
    }

    pub fn credentials(&self) -> Result<Credentials> {
        self.token
            .as_deref()
            .map(Credentials::new)
            .ok_or_else(|| Error::Config("Missing TWITTER_BEARER_TOKEN or TWITTER_TOKEN".into()))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} is not a valid number: {raw:?}"))),
        Err(_) => Ok(None),
    }
}
