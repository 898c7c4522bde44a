//! Error types shared by query generation and the rate-limit layer.

use chrono::{DateTime, Utc};

/// Failures reported by a [`RateLimitRequester`](crate::http::RateLimitRequester).
///
/// Each variant is distinguishable so callers can tell an expired token from
/// a remote rate limit hit while checking rate limits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("rate limit exceeded, resets at {reset_at:?}")]
    RateLimited { reset_at: Option<DateTime<Utc>> },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether retrying the same request later may succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::RateLimited { .. } => true,
            FetchError::Api { status, .. } => *status >= 500,
            FetchError::Unauthorized { .. } | FetchError::Decode(_) => false,
        }
    }
}

/// Crate error.
///
/// `Clone` because one in-flight rate-limit fetch hands its result to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{}", invalid_identifier_message(.label.as_deref()))]
    InvalidIdentifier { label: Option<String> },

    #[error("invalid rate limits source: {0}")]
    InvalidSourceMode(String),

    #[error("failed to fetch rate limits: {0}")]
    RemoteFetchFailure(#[from] FetchError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_identifier(label: Option<&str>) -> Self {
        Error::InvalidIdentifier {
            label: label.map(str::to_string),
        }
    }
}

fn invalid_identifier_message(label: Option<&str>) -> String {
    match label {
        Some(l) => format!("{l} user cannot be identified: neither user id nor screen name is set"),
        None => "user cannot be identified: neither user id nor screen name is set".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identifier_message_names_label() {
        let plain = Error::invalid_identifier(None).to_string();
        let labelled = Error::invalid_identifier(Some("target")).to_string();
        assert!(plain.starts_with("user cannot be identified"));
        assert!(labelled.starts_with("target user"));
    }

    #[test]
    fn retriable_matrix() {
        assert!(FetchError::Network("reset".into()).is_retriable());
        assert!(FetchError::RateLimited { reset_at: None }.is_retriable());
        assert!(FetchError::Api { status: 503, message: String::new() }.is_retriable());
        assert!(!FetchError::Api { status: 404, message: String::new() }.is_retriable());
        assert!(!FetchError::Unauthorized { status: 401, message: String::new() }.is_retriable());
        assert!(!FetchError::Decode("eof".into()).is_retriable());
    }
}
