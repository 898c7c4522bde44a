use crate::config::Config;
use crate::error::{Error, FetchError};
use crate::rate_limit::cache::{find_endpoint_limit, normalize_endpoint};
use crate::types::{Credentials, CredentialsRateLimits, EndpointRateLimit};
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Performs the network calls behind the rate-limit cache.
pub trait RateLimitRequester: Send + Sync {
    fn fetch_rate_limits<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<CredentialsRateLimits, FetchError>>;

    fn fetch_endpoint_rate_limit<'a>(
        &'a self,
        url: &'a str,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Option<EndpointRateLimit>, FetchError>> {
        async move {
            let snapshot = self.fetch_rate_limits(credentials).await?;
            Ok(find_endpoint_limit(&snapshot, url))
        }
        .boxed()
    }
}

pub fn build_client(cfg: &Config) -> Result<Client, Error> {
    let mut default_headers = HeaderMap::new();
    let ua = HeaderValue::from_str(&cfg.user_agent)
        .map_err(|e| Error::Config(format!("invalid user agent: {e}")))?;
    default_headers.insert(USER_AGENT, ua);
    // Authorization header is injected per request: credentials vary per call.
    Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls()
        .build()
        .map_err(|e| Error::Config(e.to_string()))
}

fn auth_header(credentials: &Credentials) -> Result<HeaderValue, FetchError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", credentials.bearer_token()))
        .map_err(|_| FetchError::Unauthorized {
            status: 0,
            message: "bearer token contains invalid header characters".into(),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

pub fn map_status_to_error(status: StatusCode, headers: &HeaderMap, message: String) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited {
            reset_at: extract_rate_from_headers(headers).and_then(|r| r.reset_at()),
        },
        s => FetchError::Api {
            status: s.as_u16(),
            message,
        },
    }
}

/// Read `x-rate-limit-*` response headers, present on every API response.
pub fn extract_rate_from_headers(headers: &HeaderMap) -> Option<EndpointRateLimit> {
    fn num<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<T>().ok())
    }
    let reset = num::<i64>(headers, "x-rate-limit-reset")?;
    Some(EndpointRateLimit {
        limit: num(headers, "x-rate-limit-limit").unwrap_or(0),
        remaining: num(headers, "x-rate-limit-remaining").unwrap_or(0),
        reset,
    })
}

fn compute_backoff(attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(d) = retry_after {
        return d;
    }
    // Exponential backoff with jitter: base 200ms * 2^attempt, max 5s.
    let base = 200u64.saturating_mul(1u64 << attempt.min(5));
    let max = 5_000u64.min(base);
    let jitter = fastrand::u64(0..=max / 2);
    Duration::from_millis(max / 2 + jitter)
}

/// GET `{api_url}{path}` and return the body of a 2xx response.
///
/// Transport errors and 5xx are retried up to `cfg.max_retries` times. 429
/// is returned at once: retrying would only burn more of the same limit.
pub async fn rest_get_text(
    client: &Client,
    cfg: &Config,
    credentials: &Credentials,
    path: &str,
) -> Result<String, FetchError> {
    let url = format!("{}{}", cfg.api_url.trim_end_matches('/'), path);
    let auth = auth_header(credentials)?;
    let mut attempt: u32 = 0;
    loop {
        let res = client
            .get(&url)
            .header(AUTHORIZATION, auth.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await;

        let res = match res {
            Ok(r) => r,
            Err(e) => {
                if attempt < cfg.max_retries {
                    let backoff = compute_backoff(attempt, None);
                    warn!("GET {} failed to send ({}), retrying in {:?}", url, e, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Network(e.to_string()));
            }
        };

        let status = res.status();
        let headers = res.headers().clone();
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        if status.is_success() {
            debug!("GET {} -> {}", url, status);
            return res
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()));
        }

        if status.is_server_error() && attempt < cfg.max_retries {
            let backoff = compute_backoff(attempt, retry_after);
            warn!("GET {} retrying (status {}), backoff {:?}", url, status, backoff);
            tokio::time::sleep(backoff).await;
            attempt += 1;
            continue;
        }
        let text = res.text().await.unwrap_or_default();
        return Err(map_status_to_error(status, &headers, text));
    }
}

/// [`RateLimitRequester`] backed by `application/rate_limit_status.json`.
#[derive(Debug, Clone)]
pub struct HttpRequester {
    client: Client,
    cfg: Config,
}

impl HttpRequester {
    pub fn new(cfg: Config) -> Result<Self, Error> {
        let client = build_client(&cfg)?;
        Ok(Self { client, cfg })
    }

    fn status_path(&self, resources: Option<&str>) -> String {
        let mut path = format!(
            "/{}/application/rate_limit_status.json",
            self.cfg.api_version.trim_matches('/')
        );
        if let Some(r) = resources {
            path.push_str("?resources=");
            path.push_str(&urlencoding::encode(r));
        }
        path
    }

    async fn fetch(
        &self,
        credentials: &Credentials,
        resources: Option<&str>,
    ) -> Result<CredentialsRateLimits, FetchError> {
        let body = rest_get_text(
            &self.client,
            &self.cfg,
            credentials,
            &self.status_path(resources),
        )
        .await?;
        CredentialsRateLimits::from_status_json(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

impl RateLimitRequester for HttpRequester {
    fn fetch_rate_limits<'a>(
        &'a self,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<CredentialsRateLimits, FetchError>> {
        self.fetch(credentials, None).boxed()
    }

    // Ask only for the endpoint's resource family (`users`, `blocks`, ...).
    fn fetch_endpoint_rate_limit<'a>(
        &'a self,
        url: &'a str,
        credentials: &'a Credentials,
    ) -> BoxFuture<'a, Result<Option<EndpointRateLimit>, FetchError>> {
        async move {
            let path = normalize_endpoint(url);
            let family = path.trim_start_matches('/').split('/').next().unwrap_or("");
            let resources = (!family.is_empty()).then_some(family);
            let snapshot = self.fetch(credentials, resources).await?;
            Ok(find_endpoint_limit(&snapshot, url))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, v.parse().unwrap());
        }
        h
    }

    #[test]
    fn error_mapping_matrix() {
        let empty = HeaderMap::new();
        assert!(matches!(
            map_status_to_error(StatusCode::UNAUTHORIZED, &empty, "".into()),
            FetchError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::FORBIDDEN, &empty, "".into()),
            FetchError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(
            map_status_to_error(StatusCode::NOT_FOUND, &empty, "".into()),
            FetchError::Api { status: 404, .. }
        ));
        let rl = map_status_to_error(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(&[("x-rate-limit-reset", "1700000000")]),
            "".into(),
        );
        assert_eq!(
            rl,
            FetchError::RateLimited {
                reset_at: DateTime::<Utc>::from_timestamp(1_700_000_000, 0)
            }
        );
        assert!(rl.is_retriable());
    }

    #[test]
    fn rate_headers() {
        let h = headers(&[
            ("x-rate-limit-limit", "15"),
            ("x-rate-limit-remaining", "14"),
            ("x-rate-limit-reset", "0"),
        ]);
        let rate = extract_rate_from_headers(&h).unwrap();
        assert_eq!(rate, EndpointRateLimit { limit: 15, remaining: 14, reset: 0 });
        assert!(extract_rate_from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn backoff_is_bounded() {
        for attempt in 0..10 {
            assert!(compute_backoff(attempt, None) <= Duration::from_millis(5_000));
        }
        assert_eq!(
            compute_backoff(3, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn status_path_with_resources() {
        let r = HttpRequester::new(Config::default()).unwrap();
        assert_eq!(r.status_path(None), "/1.1/application/rate_limit_status.json");
        assert_eq!(
            r.status_path(Some("users")),
            "/1.1/application/rate_limit_status.json?resources=users"
        );
    }
}
