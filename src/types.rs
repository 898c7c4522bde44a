use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Caller identity used to key rate-limit state.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    bearer_token: String,
    consumer_key: Option<String>,
}

impl Credentials {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            consumer_key: None,
        }
    }

    pub fn with_consumer_key(mut self, key: impl Into<String>) -> Self {
        self.consumer_key = Some(key.into());
        self
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    pub fn consumer_key(&self) -> Option<&str> {
        self.consumer_key.as_deref()
    }
}

// Never print the token itself.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer_token", &"<redacted>")
            .field("consumer_key", &self.consumer_key)
            .finish()
    }
}

/// Rate limit of one endpoint, as reported by `application/rate_limit_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRateLimit {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch seconds at which `remaining` is restored to `limit`.
    pub reset: i64,
}

impl EndpointRateLimit {
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.reset, 0)
    }

    /// True once the reset time has passed, i.e. the cached counters are stale.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.reset_at().map(|r| r <= now).unwrap_or(true)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Snapshot of every endpoint limit for one set of credentials.
///
/// Replaced wholesale on refresh; never mutated once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialsRateLimits {
    pub endpoints: BTreeMap<String, EndpointRateLimit>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RateLimitStatus {
    #[serde(default)]
    resources: BTreeMap<String, BTreeMap<String, EndpointRateLimit>>,
}

impl CredentialsRateLimits {
    pub fn new(endpoints: BTreeMap<String, EndpointRateLimit>) -> Self {
        Self {
            endpoints,
            fetched_at: Utc::now(),
        }
    }

    /// Parse a `rate_limit_status.json` body, flattening resource families.
    pub fn from_status_json(body: &str) -> serde_json::Result<Self> {
        let status: RateLimitStatus = serde_json::from_str(body)?;
        let endpoints = status
            .resources
            .into_values()
            .flat_map(|family| family.into_iter())
            .collect();
        Ok(Self::new(endpoints))
    }

    pub fn endpoint(&self, template: &str) -> Option<&EndpointRateLimit> {
        self.endpoints.get(template)
    }
}

/// A user reference, identifiable by numeric id or screen name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentifier {
    pub id: Option<u64>,
    pub screen_name: Option<String>,
}

impl UserIdentifier {
    pub fn from_id(id: u64) -> Self {
        Self {
            id: Some(id),
            screen_name: None,
        }
    }

    pub fn from_screen_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            screen_name: Some(name.into()),
        }
    }
}

impl From<u64> for UserIdentifier {
    fn from(id: u64) -> Self {
        Self::from_id(id)
    }
}

impl From<&str> for UserIdentifier {
    fn from(name: &str) -> Self {
        Self::from_screen_name(name)
    }
}

/// Where rate limits are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitsSource {
    /// Return the cached snapshot, possibly absent. Never calls the API.
    CacheOnly,
    /// Always call the API; the result is written back to the cache.
    TwitterApiOnly,
    /// Cached snapshot when present, otherwise fetch and store.
    #[default]
    CacheOrTwitterApi,
}

impl FromStr for RateLimitsSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "cache-only" | "cacheonly" => Ok(RateLimitsSource::CacheOnly),
            "twitter-api-only" | "twitterapionly" | "api-only" => {
                Ok(RateLimitsSource::TwitterApiOnly)
            }
            "cache-or-twitter-api" | "cacheortwitterapi" | "cache-or-api" | "auto" => {
                Ok(RateLimitsSource::CacheOrTwitterApi)
            }
            _ => Err(Error::InvalidSourceMode(s.to_string())),
        }
    }
}
