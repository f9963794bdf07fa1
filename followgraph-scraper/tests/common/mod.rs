#![allow(dead_code)]

use async_trait::async_trait;
use followgraph_common::observability::{LogConfig, LogFormat};
use followgraph_scraper::Sleeper;
use followgraph_social::twitter::types::{IdPage, User};
use followgraph_social::{IdEndpoint, ItemEndpoint, PlatformError, SocialApi};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "followgraph-tests",
            log_dir: Some(std::env::temp_dir().join("followgraph-tests")),
            emit_stderr: true,
            format: LogFormat::Text,
            default_filter: "debug",
        };
        followgraph_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// Collects formatted events from the current thread while its guard is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Records every requested sleep instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

pub struct Account {
    pub user: User,
    pub followers: Vec<Vec<u64>>,
    pub following: Vec<Vec<u64>>,
    /// Newest first, with descending `id`s.
    pub timeline: Vec<Value>,
    pub likes: Vec<Value>,
    pub private: bool,
}

impl Account {
    pub fn new(id: u64, screen_name: &str) -> Self {
        Self {
            user: User {
                id,
                screen_name: screen_name.to_string(),
                followers_count: 0,
                friends_count: 0,
            },
            followers: vec![vec![]],
            following: vec![vec![]],
            timeline: vec![],
            likes: vec![],
            private: false,
        }
    }

    pub fn followers(mut self, pages: Vec<Vec<u64>>) -> Self {
        self.user.followers_count = pages.iter().map(|p| p.len() as u64).sum();
        self.followers = pages;
        self
    }

    pub fn following(mut self, pages: Vec<Vec<u64>>) -> Self {
        self.user.friends_count = pages.iter().map(|p| p.len() as u64).sum();
        self.following = pages;
        self
    }

    pub fn timeline(mut self, items: Vec<Value>) -> Self {
        self.timeline = items;
        self
    }

    pub fn likes(mut self, items: Vec<Value>) -> Self {
        self.likes = items;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }
}

/// In-memory platform. Errors queued with [`FakeApi::fail_ids_with`] are returned by
/// the next `id_page` calls, one per call.
#[derive(Default)]
pub struct FakeApi {
    accounts: HashMap<String, Account>,
    id_errors: Mutex<VecDeque<PlatformError>>,
    lookup_broken: bool,
    hidden_ids: Vec<u64>,
    pub id_page_calls: Mutex<usize>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, account: Account) -> Self {
        self.accounts
            .insert(account.user.screen_name.clone(), account);
        self
    }

    pub fn fail_ids_with(self, err: PlatformError) -> Self {
        self.id_errors.lock().unwrap().push_back(err);
        self
    }

    /// `user_by_id` answers "not authorized" for `id`.
    pub fn hide_id(mut self, id: u64) -> Self {
        self.hidden_ids.push(id);
        self
    }

    pub fn break_lookup(mut self) -> Self {
        self.lookup_broken = true;
        self
    }

    fn account(&self, username: &str) -> Result<&Account, PlatformError> {
        self.accounts
            .get(username)
            .ok_or_else(|| PlatformError::NotFound(format!("no user named '{username}'")))
    }
}

#[async_trait]
impl SocialApi for FakeApi {
    async fn lookup_user(&self, username: &str) -> Result<User, PlatformError> {
        if self.lookup_broken {
            return Err(PlatformError::RateLimited { reset: None });
        }
        Ok(self.account(username)?.user.clone())
    }

    async fn user_by_id(&self, id: u64) -> Result<User, PlatformError> {
        if self.hidden_ids.contains(&id) {
            return Err(PlatformError::NotAuthorized("Not authorized.".into()));
        }
        self.accounts
            .values()
            .find(|a| a.user.id == id)
            .map(|a| a.user.clone())
            .ok_or_else(|| PlatformError::NotFound(format!("User not found: {id}")))
    }

    async fn id_page(
        &self,
        endpoint: IdEndpoint,
        username: &str,
        cursor: i64,
    ) -> Result<IdPage, PlatformError> {
        *self.id_page_calls.lock().unwrap() += 1;
        if let Some(err) = self.id_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let account = self.account(username)?;
        if account.private {
            return Err(PlatformError::NotAuthorized("Not authorized.".into()));
        }
        let pages = match endpoint {
            IdEndpoint::Followers => &account.followers,
            IdEndpoint::Following => &account.following,
        };
        let idx = if cursor < 0 { 0 } else { cursor as usize };
        let next_cursor = if idx + 1 < pages.len() {
            (idx + 1) as i64
        } else {
            0
        };
        Ok(IdPage {
            ids: pages[idx].clone(),
            next_cursor,
            previous_cursor: 0,
        })
    }

    async fn item_page(
        &self,
        endpoint: ItemEndpoint,
        username: &str,
        max_id: Option<u64>,
        count: u32,
    ) -> Result<Vec<Value>, PlatformError> {
        let account = self.account(username)?;
        if account.private {
            return Err(PlatformError::NotAuthorized("Not authorized.".into()));
        }
        let items = match endpoint {
            ItemEndpoint::Timeline => &account.timeline,
            ItemEndpoint::Likes => &account.likes,
        };
        Ok(items
            .iter()
            .filter(|item| match (max_id, item["id"].as_u64()) {
                (Some(max), Some(id)) => id <= max,
                _ => true,
            })
            .take(count as usize)
            .cloned()
            .collect())
    }
}

pub fn post(id: u64) -> Value {
    json!({"id": id, "full_text": format!("post {id}")})
}

pub fn reshare(id: u64) -> Value {
    json!({"id": id, "full_text": format!("RT {id}"), "retweeted_status": {"id": id * 1000}})
}
