//! Per-account scrape: counts, ID lists, posts, likes, then a bounded retry around the
//! whole sequence.
//!
//! A failed attempt is never resumed; the next attempt starts again from the first call.
use crate::backoff::{RetryPolicy, Sleeper, TokioSleeper};
use crate::error::ScrapeError;
use crate::record::{classify, AccountRecord};
use chrono::Local;
use followgraph_social::{paginate_ids, paginate_items, IdEndpoint, ItemEndpoint};
use followgraph_social::{PlatformError, SocialApi};
use std::fmt;
use std::sync::Arc;

/// Above this many follower + following IDs the platform usually pauses the account's
/// ID listing for a rate-limit window partway through.
pub const LARGE_ACCOUNT_THRESHOLD: u64 = 65_000;

macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// Identifier an account is requested by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Username(String),
    UserId(u64),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Username(name) => write!(f, "@{name}"),
            Target::UserId(id) => write!(f, "id:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Recent posts (originals and reshares together) to fetch.
    pub posts: usize,
    pub likes: usize,
    /// Emit stage progress at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            posts: 10,
            likes: 10,
            verbose: true,
        }
    }
}

pub struct AccountScraper {
    api: Arc<dyn SocialApi>,
    options: ScrapeOptions,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl AccountScraper {
    pub fn new(api: Arc<dyn SocialApi>) -> Self {
        Self {
            api,
            options: ScrapeOptions::default(),
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_options(mut self, options: ScrapeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.options
    }

    /// Numeric ID to handle. Privacy, credential and transient failures pass through;
    /// anything else means the account does not exist for us.
    pub async fn resolve_username(&self, id: u64) -> Result<String, PlatformError> {
        match self.api.user_by_id(id).await {
            Ok(user) => Ok(user.screen_name),
            Err(err) if err.is_transient() => Err(err),
            Err(err @ (PlatformError::Auth(_) | PlatformError::NotAuthorized(_))) => Err(err),
            Err(err) => Err(PlatformError::NotFound(format!("user id {id}: {err}"))),
        }
    }

    /// `(followers, following)` for `username`, or `(0, 0)` if the lookup fails.
    pub async fn follower_following_counts(&self, username: &str) -> (u64, u64) {
        match self.api.lookup_user(username).await {
            Ok(user) => (user.followers_count, user.friends_count),
            Err(err) => {
                tracing::debug!(username, error = %err, "scrape.counts.lookup_failed");
                (0, 0)
            }
        }
    }

    /// Scrape one account, retrying transient failures per the configured policy.
    pub async fn scrape_one(&self, target: &Target) -> Result<AccountRecord, ScrapeError> {
        let account = target.to_string();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let err = match self.fetch_account(target).await {
                Ok(record) => return Ok(record),
                Err(err) => err,
            };

            match err {
                PlatformError::NotAuthorized(reason) => {
                    tracing::warn!(%account, %reason, "scrape.private_account");
                    return Err(ScrapeError::PrivateAccount { account });
                }
                PlatformError::NotFound(reason) => {
                    tracing::warn!(%account, %reason, "scrape.not_found");
                    return Err(ScrapeError::NotFound { account, reason });
                }
                err if err.is_transient() => match self.policy.delay_for(attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            %account,
                            attempt,
                            max_attempts = self.policy.max_attempts,
                            cooldown_secs = delay.as_secs(),
                            error = %err,
                            "scrape.transient_error.cooling_down"
                        );
                        self.sleeper.sleep(delay).await;
                    }
                    None => {
                        tracing::error!(%account, attempts = attempt, error = %err, "scrape.retries_exhausted");
                        return Err(ScrapeError::RetriesExhausted {
                            account,
                            attempts: attempt,
                            last: err,
                        });
                    }
                },
                source => {
                    tracing::error!(%account, error = %source, "scrape.platform_error");
                    return Err(ScrapeError::Platform { account, source });
                }
            }
        }
    }

    /// One full pass over every facet of the account.
    async fn fetch_account(&self, target: &Target) -> Result<AccountRecord, PlatformError> {
        let verbose = self.options.verbose;
        let api = self.api.as_ref();

        let username = match target {
            Target::Username(name) => name.clone(),
            Target::UserId(id) => {
                progress!(verbose, user_id = *id, "Searching for username...");
                let name = self.resolve_username(*id).await?;
                progress!(verbose, user_id = *id, username = %name, "Resolved username");
                name
            }
        };

        let (followers_ct, following_ct) = self.follower_following_counts(&username).await;
        let total_ids = followers_ct.saturating_add(following_ct);

        progress!(verbose, %username, "Scraping {username}'s 'Following' list...");
        let following = paginate_ids(api, IdEndpoint::Following, &username).await?;

        if total_ids > LARGE_ACCOUNT_THRESHOLD {
            let at = Local::now().format("%H:%M");
            progress!(
                verbose,
                %username,
                total_ids,
                "Finished scraping @ {at}... expect a ~15min platform pause before {username}'s 'Followers' list"
            );
        }

        progress!(verbose, %username, "Scraping {username}'s 'Follower' list...");
        let followers = paginate_ids(api, IdEndpoint::Followers, &username).await?;

        let wanted_posts = self.options.posts;
        progress!(verbose, %username, "Scraping {username}'s {wanted_posts} most recent posts...");
        let fetched = paginate_items(api, ItemEndpoint::Timeline, &username, wanted_posts).await?;
        let (posts, reshares) = classify(fetched);

        let wanted_likes = self.options.likes;
        progress!(verbose, %username, "Scraping {username}'s {wanted_likes} most recent likes...");
        let likes = paginate_items(api, ItemEndpoint::Likes, &username, wanted_likes).await?;

        progress!(
            verbose,
            %username,
            following = following.len(),
            followers = followers.len(),
            posts = posts.len(),
            reshares = reshares.len(),
            likes = likes.len(),
            "Assembled record for {username}"
        );

        Ok(AccountRecord {
            username,
            following,
            followers,
            posts,
            reshares,
            likes,
        })
    }
}
