//! Twitter REST client pieces: validated query generation for user
//! endpoints and a coordinated rate-limit cache.

pub mod config;
pub mod error;
pub mod http;
pub mod parameters;
pub mod query;
pub mod rate_limit;
pub mod types;

pub use config::Config;
pub use error::{Error, FetchError, Result};
pub use http::{HttpRequester, RateLimitRequester};
pub use query::{ApiEndpoint, UserQueryGenerator};
pub use rate_limit::{RateLimitCache, RateLimitCacheManager, RateLimitsClient};
pub use types::{
    Credentials, CredentialsRateLimits, EndpointRateLimit, RateLimitsSource, UserIdentifier,
};
