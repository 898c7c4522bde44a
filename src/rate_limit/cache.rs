use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::types::{Credentials, CredentialsRateLimits, EndpointRateLimit};

/// In-memory store of the last known rate limits per credentials.
///
/// Snapshots are shared behind `Arc` and swapped whole, so readers never see
/// a mix of old and new endpoint entries.
#[derive(Debug, Default)]
pub struct RateLimitCache {
    entries: RwLock<HashMap<Credentials, Arc<CredentialsRateLimits>>>,
}

impl RateLimitCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, credentials: &Credentials) -> Option<Arc<CredentialsRateLimits>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(credentials)
            .cloned()
    }

    pub fn set(&self, credentials: Credentials, snapshot: Arc<CredentialsRateLimits>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(credentials, snapshot);
    }

    /// Forget the snapshot of one credentials; the next lookup sees nothing.
    pub fn clear(&self, credentials: &Credentials) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(credentials);
    }

    pub fn clear_all(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn get_endpoint_limit(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> Option<EndpointRateLimit> {
        let snapshot = self.get(credentials)?;
        find_endpoint_limit(&snapshot, url)
    }
}

/// Look up the entry for `url` in a snapshot, matching path templates such
/// as `/users/show/:id`.
pub fn find_endpoint_limit(
    snapshot: &CredentialsRateLimits,
    url: &str,
) -> Option<EndpointRateLimit> {
    let path = normalize_endpoint(url);
    if let Some(limit) = snapshot.endpoint(&path) {
        return Some(*limit);
    }
    let found = snapshot
        .endpoints
        .iter()
        .find(|(template, _)| template_matches(template, &path))
        .map(|(_, limit)| *limit);
    if found.is_none() {
        debug!("no rate limit entry for endpoint {}", path);
    }
    found
}

/// Reduce an endpoint URL to the path form used as key by the API:
/// no scheme/host, query, version prefix, `.json` suffix or trailing slash.
///
/// `https://api.twitter.com/1.1/users/show.json?user_id=1` → `/users/show`
pub fn normalize_endpoint(url: &str) -> String {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        // Relative input: drop query and fragment by hand.
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first().is_some_and(|s| is_version_segment(s)) {
        segments.remove(0);
    }
    if let Some(last) = segments.last_mut() {
        if let Some(stripped) = last.strip_suffix(".json") {
            *last = stripped;
        }
    }
    format!("/{}", segments.join("/"))
}

fn is_version_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit() || c == '.')
}

fn template_matches(template: &str, path: &str) -> bool {
    let t: Vec<&str> = template.split('/').filter(|s| !s.is_empty()).collect();
    let p: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    t.len() == p.len()
        && t.iter()
            .zip(p.iter())
            .all(|(ts, ps)| ts.starts_with(':') || ts == ps)
}
