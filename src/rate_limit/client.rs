use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::info;

use super::manager::RateLimitCacheManager;
use crate::error::Result;
use crate::parameters::EndpointRateLimitsParameters;
use crate::types::{Credentials, CredentialsRateLimits, EndpointRateLimit, RateLimitsSource};

/// Rate-limit operations bound to one set of credentials.
#[derive(Clone)]
pub struct RateLimitsClient {
    credentials: Credentials,
    manager: Arc<RateLimitCacheManager>,
    default_source: RateLimitsSource,
}

impl RateLimitsClient {
    pub fn new(credentials: Credentials, manager: Arc<RateLimitCacheManager>) -> Self {
        Self {
            credentials,
            manager,
            default_source: RateLimitsSource::default(),
        }
    }

    pub fn with_default_source(mut self, source: RateLimitsSource) -> Self {
        self.default_source = source;
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Populate the cache once. A no-op when a snapshot is already cached.
    pub async fn initialize_rate_limits_manager(&self) -> Result<()> {
        if self.manager.cache().get(&self.credentials).is_none() {
            self.manager
                .refresh_credentials_rate_limits(&self.credentials)
                .await?;
        }
        Ok(())
    }

    pub async fn get_rate_limits(
        &self,
        source: Option<RateLimitsSource>,
    ) -> Result<Option<Arc<CredentialsRateLimits>>> {
        self.manager
            .get_credentials_rate_limits(&self.credentials, source.unwrap_or(self.default_source))
            .await
    }

    pub async fn get_endpoint_rate_limit(
        &self,
        url: &str,
        source: Option<RateLimitsSource>,
    ) -> Result<Option<EndpointRateLimit>> {
        let parameters = EndpointRateLimitsParameters::new(url)
            .from_source(source.unwrap_or(self.default_source));
        self.manager
            .get_query_rate_limit(&parameters, &self.credentials)
            .await
    }

    /// Sleep until `url` can be called again if its limit is exhausted.
    /// Returns how long it waited.
    pub async fn wait_for_endpoint(&self, url: &str) -> Result<Duration> {
        let Some(limit) = self.get_endpoint_rate_limit(url, None).await? else {
            return Ok(Duration::ZERO);
        };
        if !limit.is_exhausted() {
            return Ok(Duration::ZERO);
        }
        let wait = limit
            .reset_at()
            .and_then(|reset| (reset - Utc::now()).to_std().ok())
            .unwrap_or(Duration::ZERO);
        if !wait.is_zero() {
            info!("rate limit exhausted for {}, waiting {:?}", url, wait);
            tokio::time::sleep(wait).await;
        }
        Ok(wait)
    }
}
