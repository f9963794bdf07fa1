//! Client-handle abstraction over the platform's three capability groups:
//! user lookup, cursor-paged ID lists, and max-id-paged item lists.
use crate::twitter::error::PlatformError;
use crate::twitter::types::{IdPage, User};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Which ID list of an account to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdEndpoint {
    /// Accounts following the target.
    Followers,
    /// Accounts the target follows.
    Following,
}

/// Which item list of an account to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEndpoint {
    /// The account's own posts and reshares, newest first.
    Timeline,
    /// Posts the account has liked, newest first.
    Likes,
}

impl fmt::Display for IdEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdEndpoint::Followers => f.write_str("followers"),
            IdEndpoint::Following => f.write_str("following"),
        }
    }
}

impl fmt::Display for ItemEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemEndpoint::Timeline => f.write_str("timeline"),
            ItemEndpoint::Likes => f.write_str("likes"),
        }
    }
}

/// Handle passed to every scraping operation. Implementations must be cheap to share
/// behind an `Arc`.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Look an account up by its handle.
    async fn lookup_user(&self, username: &str) -> Result<User, PlatformError>;

    /// Look an account up by its numeric ID.
    async fn user_by_id(&self, id: u64) -> Result<User, PlatformError>;

    /// Fetch one page of IDs. `cursor` is `-1` for the first page.
    async fn id_page(
        &self,
        endpoint: IdEndpoint,
        username: &str,
        cursor: i64,
    ) -> Result<IdPage, PlatformError>;

    /// Fetch up to `count` items strictly older than or equal to `max_id` (newest page when `None`).
    async fn item_page(
        &self,
        endpoint: ItemEndpoint,
        username: &str,
        max_id: Option<u64>,
        count: u32,
    ) -> Result<Vec<Value>, PlatformError>;
}
