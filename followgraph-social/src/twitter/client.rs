//! Thin wrapper around the Twitter/X v1.1 REST API.
//!
//! Handles app-only auth (key/secret exchanged once for a bearer token), request
//! parameter shaping, and error classification before delegating to the shared HTTP
//! client. Rate-limit waits happen inside [`HttpClient`]; anything it gives up on comes
//! back as [`PlatformError::RateLimited`].
use crate::api::{IdEndpoint, ItemEndpoint, SocialApi};
use crate::twitter::error::PlatformError;
use crate::twitter::types::{IdPage, TokenResponse, User};
use async_trait::async_trait;
use followgraph_http::{Auth, HttpClient, RequestOpts};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::OnceCell;


/// Largest page `friends/ids` and `followers/ids` will serve.
const ID_PAGE_SIZE: u32 = 5000;
/// Largest page the timeline and likes endpoints will serve.
pub const MAX_ITEM_PAGE: u32 = 200;

#[derive(Clone)]
pub enum Credentials {
    /// Application key/secret pair, exchanged for a bearer token on first use.
    App { api_key: String, api_secret: String },
    /// Pre-issued app-only bearer token.
    Bearer(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::App { .. } => f.write_str("Credentials::App(<redacted>)"),
            Credentials::Bearer(_) => f.write_str("Credentials::Bearer(<redacted>)"),
        }
    }
}

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    credentials: Credentials,
    bearer: Arc<OnceCell<String>>,
}

impl TwitterApi {
    /// The transport carries the base URL, timeouts and rate-limit policy.
    pub fn with_http(http: HttpClient, credentials: Credentials) -> Self {
        Self {
            http,
            credentials,
            bearer: Arc::new(OnceCell::new()),
        }
    }

    async fn bearer(&self) -> Result<&str, PlatformError> {
        let token = self
            .bearer
            .get_or_try_init(|| async {
                match &self.credentials {
                    Credentials::Bearer(token) => Ok(token.clone()),
                    Credentials::App {
                        api_key,
                        api_secret,
                    } => self.exchange_app_token(api_key, api_secret).await,
                }
            })
            .await?;
        Ok(token.as_str())
    }

    async fn exchange_app_token(
        &self,
        api_key: &str,
        api_secret: &str,
    ) -> Result<String, PlatformError> {
        tracing::debug!("twitter.oauth2.token_exchange");
        let resp: TokenResponse = self
            .http
            .post_form(
                "oauth2/token",
                &[("grant_type", "client_credentials")],
                RequestOpts {
                    auth: Some(Auth::Basic {
                        user: api_key,
                        password: api_secret,
                    }),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e.status() {
                Some(status) if status.is_client_error() => {
                    PlatformError::Auth(format!("token exchange rejected: {e}"))
                }
                _ => PlatformError::from(e),
            })?;

        if !resp.token_type.eq_ignore_ascii_case("bearer") {
            return Err(PlatformError::Auth(format!(
                "unexpected token type '{}'",
                resp.token_type
            )));
        }
        Ok(resp.access_token)
    }

    async fn get<T>(&self, path: &str, query: Vec<(&str, Cow<'_, str>)>) -> Result<T, PlatformError>
    where
        T: DeserializeOwned,
    {
        let bearer = self.bearer().await?;
        let resp = self
            .http
            .get_json(
                path,
                RequestOpts {
                    auth: Some(Auth::Bearer(bearer)),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await?;
        Ok(resp)
    }
}

#[async_trait]
impl SocialApi for TwitterApi {
    async fn lookup_user(&self, username: &str) -> Result<User, PlatformError> {
        let users: Vec<User> = self
            .get(
                "1.1/users/lookup.json",
                vec![("screen_name", username.into())],
            )
            .await?;
        users
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound(format!("no user named '{username}'")))
    }

    async fn user_by_id(&self, id: u64) -> Result<User, PlatformError> {
        self.get("1.1/users/show.json", vec![("user_id", id.to_string().into())])
            .await
    }

    async fn id_page(
        &self,
        endpoint: IdEndpoint,
        username: &str,
        cursor: i64,
    ) -> Result<IdPage, PlatformError> {
        let path = match endpoint {
            IdEndpoint::Followers => "1.1/followers/ids.json",
            IdEndpoint::Following => "1.1/friends/ids.json",
        };
        let page: IdPage = self
            .get(
                path,
                vec![
                    ("screen_name", username.into()),
                    ("cursor", cursor.to_string().into()),
                    ("count", ID_PAGE_SIZE.to_string().into()),
                    ("stringify_ids", "false".into()),
                ],
            )
            .await?;
        tracing::debug!(
            %endpoint,
            username,
            cursor,
            ids = page.ids.len(),
            next_cursor = page.next_cursor,
            "twitter.id_page"
        );
        Ok(page)
    }

    async fn item_page(
        &self,
        endpoint: ItemEndpoint,
        username: &str,
        max_id: Option<u64>,
        count: u32,
    ) -> Result<Vec<Value>, PlatformError> {
        let count = count.clamp(1, MAX_ITEM_PAGE);
        let mut query: Vec<(&str, Cow<'_, str>)> = vec![
            ("screen_name", username.into()),
            ("count", count.to_string().into()),
            ("tweet_mode", "extended".into()),
        ];
        let path = match endpoint {
            ItemEndpoint::Timeline => {
                query.push(("include_rts", "true".into()));
                "1.1/statuses/user_timeline.json"
            }
            ItemEndpoint::Likes => "1.1/favorites/list.json",
        };
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id.to_string().into()));
        }
        let items: Vec<Value> = self.get(path, query).await?;
        tracing::debug!(%endpoint, username, ?max_id, items = items.len(), "twitter.item_page");
        Ok(items)
    }
}
