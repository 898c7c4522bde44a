//! Rate-limit metadata: a dumb per-credentials store, the policy layer that
//! decides between store and API, and a credentials-bound client.

pub mod cache;
pub mod client;
pub mod manager;

pub use cache::{normalize_endpoint, RateLimitCache};
pub use client::RateLimitsClient;
pub use manager::RateLimitCacheManager;
