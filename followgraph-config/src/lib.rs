//! Loader for `followgraph.yaml` with environment overlays.
//!
//! Sources, lowest precedence first: built-in defaults, the YAML file (or inline YAML),
//! then `FOLLOWGRAPH__SECTION__KEY` environment variables. Every string in the merged
//! tree then goes through `${VAR}` expansion, so credentials can stay in the
//! environment while the file only names them.
use config::{Config, ConfigError, Environment, File, FileFormat};
use followgraph_common::OutputFormat;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "FOLLOWGRAPH";

/// `<config dir>/followgraph/followgraph.yaml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("followgraph").join("followgraph.yaml"))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FollowgraphConfig {
    pub credentials: CredentialsConfig,
    pub scrape: ScrapeConfig,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
    pub accounts: AccountsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub api_key: String,
    pub api_secret: String,
    /// Pre-issued app token; skips the key/secret exchange when set.
    pub bearer_token: Option<String>,
    pub base_url: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key: "${TWITTER_API_KEY}".into(),
            api_secret: "${TWITTER_API_SECRET}".into(),
            bearer_token: None,
            base_url: "https://api.twitter.com".into(),
        }
    }
}

impl CredentialsConfig {
    pub fn bearer(&self) -> Option<&str> {
        self.bearer_token.as_deref().filter(|t| is_set(t))
    }

    /// `(api_key, api_secret)` when both resolved to real values.
    pub fn key_pair(&self) -> Option<(&str, &str)> {
        (is_set(&self.api_key) && is_set(&self.api_secret))
            .then_some((self.api_key.as_str(), self.api_secret.as_str()))
    }
}

/// Empty strings and placeholders whose variable was never set don't count.
fn is_set(s: &str) -> bool {
    !s.trim().is_empty() && !s.contains("${")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub posts: usize,
    pub likes: usize,
    pub verbose: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            posts: 10,
            likes: 10,
            verbose: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub cooldown_secs: u64,
    pub multiplier: u32,
    pub max_cooldown_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            cooldown_secs: 16 * 60,
            multiplier: 2,
            max_cooldown_secs: 64 * 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub wait_on_rate_limit: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 2,
            wait_on_rate_limit: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: OutputFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub usernames: Vec<String>,
    pub user_ids: Vec<u64>,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => break,
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate wiring.
pub struct FollowgraphConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FollowgraphConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowgraphConfigLoader {
    /// Defaults plus `FOLLOWGRAPH__` env overrides.
    ///
    /// ```
    /// use followgraph_config::FollowgraphConfigLoader;
    ///
    /// let config = FollowgraphConfigLoader::new()
    ///     .with_yaml_str("scrape:\n  posts: 25\n")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.scrape.posts, 25);
    /// assert_eq!(config.scrape.likes, 10);
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Self { builder }
    }

    /// Attach a required file; the `config` crate infers the format from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Merge every source, expand `${VAR}` placeholders, and deserialize.
    ///
    /// Placeholders naming unset variables are left untouched.
    pub fn load(self) -> Result<FollowgraphConfig, ConfigError> {
        let defaults = CredentialsConfig::default();
        let cfg = self
            .builder
            .set_default("credentials.api_key", defaults.api_key)?
            .set_default("credentials.api_secret", defaults.api_secret)?
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
