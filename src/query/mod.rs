//! Query generation for user endpoints.
//!
//! Every operation validates the users it targets, renders the identifying
//! parameter first, then appends the flags that were explicitly set.

pub mod parameters;
pub mod user;
pub mod validator;

pub use parameters::{DefaultUserQueryParameterGenerator, UserQueryParameterGenerator};
pub use user::UserQueryGenerator;
pub use validator::{DefaultUserQueryValidator, UserQueryValidator};

pub const DEFAULT_API_URL: &str = "https://api.twitter.com";
pub const DEFAULT_API_VERSION: &str = "1.1";

/// Base URL and version prefix of the REST API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub version: String,
}

impl ApiEndpoint {
    pub fn new(base_url: &str, version: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.trim_matches('/').to_string(),
        }
    }

    /// `<base>/<version>/<resource_path>.json`
    pub fn resource_url(&self, resource_path: &str) -> String {
        format!(
            "{}/{}/{}.json",
            self.base_url,
            self.version,
            resource_path.trim_matches('/')
        )
    }
}

impl Default for ApiEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_API_VERSION)
    }
}

/// Accumulates `key=value` pairs in insertion order.
#[derive(Debug, Default)]
pub(crate) struct QueryString {
    parts: Vec<String>,
}

impl QueryString {
    /// Push an already rendered `key=value` fragment. Empty fragments are skipped.
    pub fn push_raw(&mut self, fragment: String) {
        if !fragment.is_empty() {
            self.parts.push(fragment);
        }
    }

    /// Boolean flags are only rendered when explicitly set.
    pub fn push_bool(&mut self, key: &str, value: Option<bool>) {
        if let Some(v) = value {
            self.parts.push(format!("{key}={v}"));
        }
    }

    pub fn push_custom(&mut self, custom: &[(String, String)]) {
        for (k, v) in custom {
            self.parts.push(format!(
                "{}={}",
                urlencoding::encode(k),
                urlencoding::encode(v)
            ));
        }
    }

    pub fn into_url(self, resource_url: String) -> String {
        if self.parts.is_empty() {
            return resource_url;
        }
        format!("{}?{}", resource_url, self.parts.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_url_trims_slashes() {
        let ep = ApiEndpoint::new("https://api.twitter.com/", "/1.1/");
        assert_eq!(
            ep.resource_url("/blocks/create"),
            "https://api.twitter.com/1.1/blocks/create.json"
        );
    }

    #[test]
    fn unset_flags_are_omitted() {
        let mut q = QueryString::default();
        q.push_raw("user_id=1".into());
        q.push_bool("include_entities", None);
        q.push_bool("skip_status", Some(false));
        assert_eq!(q.into_url("u".into()), "u?user_id=1&skip_status=false");
    }
}
