use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use log::{debug, info, warn};
use uuid::Uuid;

use super::cache::{find_endpoint_limit, RateLimitCache};
use crate::error::{Error, Result};
use crate::http::RateLimitRequester;
use crate::parameters::EndpointRateLimitsParameters;
use crate::types::{Credentials, CredentialsRateLimits, EndpointRateLimit, RateLimitsSource};

type Snapshot = Arc<CredentialsRateLimits>;
type FetchFuture = BoxFuture<'static, Result<Snapshot>>;

/// A remote fetch that callers for the same credentials attach to.
///
/// Only a weak handle is kept here: once every awaiting caller is gone the
/// fetch is dropped, and the dead handle is replaced by the next caller.
struct Flight {
    id: Uuid,
    handle: WeakShared<FetchFuture>,
}

type Flights = HashMap<Credentials, Flight>;

/// When a cached snapshot may answer instead of the API.
enum CachePolicy<'a> {
    /// Always go remote.
    Bypass,
    /// Any cached snapshot will do.
    Prefer,
    /// A cached snapshot other than the given stale one will do.
    ReplaceStale(&'a Snapshot),
}

enum Acquired {
    Cached(Snapshot),
    Remote(Shared<FetchFuture>),
}

/// Decides between the rate-limit cache and the API, and makes sure a single
/// credentials never has more than one rate-limit fetch in flight.
pub struct RateLimitCacheManager {
    cache: Arc<RateLimitCache>,
    requester: Arc<dyn RateLimitRequester>,
    in_flight: Arc<Mutex<Flights>>,
}

impl RateLimitCacheManager {
    pub fn new(cache: Arc<RateLimitCache>, requester: Arc<dyn RateLimitRequester>) -> Self {
        Self {
            cache,
            requester,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &Arc<RateLimitCache> {
        &self.cache
    }

    /// Rate limits of `credentials` according to `source`.
    ///
    /// `Ok(None)` only happens with [`RateLimitsSource::CacheOnly`] on an
    /// empty cache.
    pub async fn get_credentials_rate_limits(
        &self,
        credentials: &Credentials,
        source: RateLimitsSource,
    ) -> Result<Option<Snapshot>> {
        match source {
            RateLimitsSource::CacheOnly => Ok(self.cache.get(credentials)),
            RateLimitsSource::TwitterApiOnly => self
                .resolve(credentials, CachePolicy::Bypass)
                .await
                .map(Some),
            RateLimitsSource::CacheOrTwitterApi => self
                .resolve(credentials, CachePolicy::Prefer)
                .await
                .map(Some),
        }
    }

    /// Fetch from the API and replace the cache entry. Joins a fetch that is
    /// already in flight for the same credentials.
    pub async fn refresh_credentials_rate_limits(
        &self,
        credentials: &Credentials,
    ) -> Result<Snapshot> {
        self.resolve(credentials, CachePolicy::Bypass).await
    }

    /// Rate limit of the endpoint named by `parameters.url`.
    ///
    /// With `CacheOrTwitterApi`, a cached entry whose reset time has passed
    /// triggers one refresh before answering.
    pub async fn get_query_rate_limit(
        &self,
        parameters: &EndpointRateLimitsParameters,
        credentials: &Credentials,
    ) -> Result<Option<EndpointRateLimit>> {
        let Some(snapshot) = self
            .get_credentials_rate_limits(credentials, parameters.from)
            .await?
        else {
            return Ok(None);
        };

        let limit = find_endpoint_limit(&snapshot, &parameters.url);
        let stale = parameters.from == RateLimitsSource::CacheOrTwitterApi
            && limit.is_some_and(|l| l.is_expired(Utc::now()));
        if !stale {
            return Ok(limit);
        }

        info!(
            "cached rate limit for {} has reset, refreshing",
            parameters.url
        );
        let fresh = self
            .resolve(credentials, CachePolicy::ReplaceStale(&snapshot))
            .await?;
        Ok(find_endpoint_limit(&fresh, &parameters.url))
    }

    async fn resolve(&self, credentials: &Credentials, policy: CachePolicy<'_>) -> Result<Snapshot> {
        match self.acquire(credentials, policy) {
            Acquired::Cached(snapshot) => Ok(snapshot),
            Acquired::Remote(fetch) => fetch.await,
        }
    }

    fn lock_flights(&self) -> MutexGuard<'_, Flights> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // The flights lock is held while the cache is read, and the fetch holds it
    // while it writes the cache, so a caller never sees "no flight, no entry"
    // in between a fetch finishing and its result being stored.
    fn acquire(&self, credentials: &Credentials, policy: CachePolicy<'_>) -> Acquired {
        let mut flights = self.lock_flights();

        let cached = match policy {
            CachePolicy::Bypass => None,
            CachePolicy::Prefer => self.cache.get(credentials),
            CachePolicy::ReplaceStale(stale) => self
                .cache
                .get(credentials)
                .filter(|current| !Arc::ptr_eq(current, stale)),
        };
        if let Some(snapshot) = cached {
            debug!("rate limits served from cache");
            return Acquired::Cached(snapshot);
        }

        if let Some(fetch) = flights.get(credentials).and_then(|f| f.handle.upgrade()) {
            debug!("joining rate limit fetch already in flight");
            return Acquired::Remote(fetch);
        }

        let id = Uuid::new_v4();
        let fetch = self.start_fetch(credentials.clone(), id);
        if let Some(handle) = fetch.downgrade() {
            flights.insert(credentials.clone(), Flight { id, handle });
        }
        Acquired::Remote(fetch)
    }

    fn start_fetch(&self, credentials: Credentials, id: Uuid) -> Shared<FetchFuture> {
        let requester = Arc::clone(&self.requester);
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        info!("fetching rate limits from the API (flight {})", id);

        async move {
            let result = requester.fetch_rate_limits(&credentials).await;

            let mut flights = in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if flights.get(&credentials).is_some_and(|f| f.id == id) {
                flights.remove(&credentials);
            }
            let outcome = match result {
                Ok(snapshot) => {
                    let snapshot = Arc::new(snapshot);
                    cache.set(credentials, Arc::clone(&snapshot));
                    Ok(snapshot)
                }
                Err(e) => {
                    warn!("rate limit fetch {} failed: {}", id, e);
                    Err(Error::RemoteFetchFailure(e))
                }
            };
            drop(flights);
            outcome
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FlakyRequester {
        calls: AtomicUsize,
    }

    impl RateLimitRequester for FlakyRequester {
        fn fetch_rate_limits<'a>(
            &'a self,
            _credentials: &'a Credentials,
        ) -> BoxFuture<'a, std::result::Result<CredentialsRateLimits, FetchError>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                if n == 0 {
                    Err(FetchError::Network("connection reset".into()))
                } else {
                    Ok(CredentialsRateLimits::new(BTreeMap::new()))
                }
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn failed_flight_is_cleared_and_cache_untouched() {
        let requester = Arc::new(FlakyRequester { calls: AtomicUsize::new(0) });
        let manager = RateLimitCacheManager::new(Arc::new(RateLimitCache::new()), requester.clone());
        let creds = Credentials::new("t");

        let err = manager.refresh_credentials_rate_limits(&creds).await.unwrap_err();
        assert!(matches!(err, Error::RemoteFetchFailure(FetchError::Network(_))));
        assert!(manager.cache().get(&creds).is_none());
        assert!(manager.lock_flights().is_empty());

        manager.refresh_credentials_rate_limits(&creds).await.unwrap();
        assert!(manager.cache().get(&creds).is_some());
        assert_eq!(requester.calls.load(Ordering::SeqCst), 2);
    }
}
