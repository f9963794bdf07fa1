use serde::{Deserialize, Serialize};

/// Subset of the v1.1 user object the scraper relies on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub screen_name: String,
    #[serde(default)]
    pub followers_count: u64,
    /// Number of accounts this user follows.
    #[serde(default)]
    pub friends_count: u64,
}

/// One page of `friends/ids` or `followers/ids`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IdPage {
    #[serde(default)]
    pub ids: Vec<u64>,
    /// `0` once the last page has been served.
    #[serde(default)]
    pub next_cursor: i64,
    #[serde(default)]
    pub previous_cursor: i64,
}

impl IdPage {
    pub fn is_last(&self) -> bool {
        self.next_cursor == 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}
