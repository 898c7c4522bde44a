use serde::{Deserialize, Serialize};

use crate::types::{RateLimitsSource, UserIdentifier};

/// Extra `key=value` pairs appended after an operation's own parameters.
pub type CustomQueryParameters = Vec<(String, String)>;

// Block/unblock share a shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockUserParameters {
    pub user: UserIdentifier,
    pub include_entities: Option<bool>,
    pub skip_status: Option<bool>,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl BlockUserParameters {
    pub fn new(user: impl Into<UserIdentifier>) -> Self {
        Self {
            user: user.into(),
            include_entities: None,
            skip_status: None,
            custom_query_parameters: Vec::new(),
        }
    }
}

pub type UnblockUserParameters = BlockUserParameters;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportUserForSpamParameters {
    pub user: UserIdentifier,
    /// Also block the reported account.
    pub perform_block: Option<bool>,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl ReportUserForSpamParameters {
    pub fn new(user: impl Into<UserIdentifier>) -> Self {
        Self {
            user: user.into(),
            perform_block: None,
            custom_query_parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserParameters {
    pub user: UserIdentifier,
    pub include_entities: Option<bool>,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl GetUserParameters {
    pub fn new(user: impl Into<UserIdentifier>) -> Self {
        Self {
            user: user.into(),
            include_entities: None,
            custom_query_parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUsersParameters {
    pub users: Vec<UserIdentifier>,
    pub include_entities: Option<bool>,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl GetUsersParameters {
    pub fn new<I, U>(users: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UserIdentifier>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
            include_entities: None,
            custom_query_parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUserParameters {
    pub user: UserIdentifier,
    /// Enable notifications for the followed account.
    pub enable_notifications: Option<bool>,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl FollowUserParameters {
    pub fn new(user: impl Into<UserIdentifier>) -> Self {
        Self {
            user: user.into(),
            enable_notifications: None,
            custom_query_parameters: Vec::new(),
        }
    }
}

/// Unfollow, mute and unmute take nothing but the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActionParameters {
    pub user: UserIdentifier,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl UserActionParameters {
    pub fn new(user: impl Into<UserIdentifier>) -> Self {
        Self {
            user: user.into(),
            custom_query_parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRelationshipParameters {
    pub source: UserIdentifier,
    pub target: UserIdentifier,
    #[serde(default)]
    pub custom_query_parameters: CustomQueryParameters,
}

impl GetRelationshipParameters {
    pub fn new(source: impl Into<UserIdentifier>, target: impl Into<UserIdentifier>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            custom_query_parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRateLimitsParameters {
    /// Endpoint URL or path, e.g. `https://api.twitter.com/1.1/users/show.json?user_id=1`.
    pub url: String,
    #[serde(default)]
    pub from: RateLimitsSource,
}

impl EndpointRateLimitsParameters {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            from: RateLimitsSource::default(),
        }
    }

    pub fn from_source(mut self, from: RateLimitsSource) -> Self {
        self.from = from;
        self
    }
}
