use followgraph_common::OutputFormat;
use followgraph_config::FollowgraphConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
credentials:
  api_key: "${TWITTER_API_KEY}"
  api_secret: "${TWITTER_API_SECRET}"
scrape:
  posts: 40
  likes: 5
  verbose: false
retry:
  max_attempts: 3
output:
  dir: "/tmp/followgraph-out"
  format: yaml
accounts:
  usernames: ["alice", "bob"]
  user_ids: [783214, 6253282]
"#;

#[test]
#[serial]
fn file_values_and_env_expansion() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "followgraph.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("TWITTER_API_KEY", Some("key-from-env")),
            ("TWITTER_API_SECRET", Some("secret-from-env")),
        ],
        || {
            let config = FollowgraphConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");

            assert_eq!(
                config.credentials.key_pair(),
                Some(("key-from-env", "secret-from-env"))
            );
            assert_eq!(config.credentials.base_url, "https://api.twitter.com");
            assert_eq!(config.scrape.posts, 40);
            assert_eq!(config.scrape.likes, 5);
            assert!(!config.scrape.verbose);
            assert_eq!(config.retry.max_attempts, 3);
            assert_eq!(config.retry.cooldown_secs, 960);
            assert_eq!(config.output.format, OutputFormat::Yaml);
            assert_eq!(config.output.dir, PathBuf::from("/tmp/followgraph-out"));
            assert_eq!(config.accounts.usernames, vec!["alice", "bob"]);
            assert_eq!(config.accounts.user_ids, vec![783214, 6253282]);
        },
    );
}

#[test]
#[serial]
fn env_overrides_beat_the_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "followgraph.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("FOLLOWGRAPH__SCRAPE__POSTS", Some("7")),
            ("FOLLOWGRAPH__HTTP__WAIT_ON_RATE_LIMIT", Some("false")),
        ],
        || {
            let config = FollowgraphConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");

            assert_eq!(config.scrape.posts, 7);
            assert_eq!(config.scrape.likes, 5);
            assert!(!config.http.wait_on_rate_limit);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();

    temp_env::with_vars_unset(["TWITTER_API_KEY", "TWITTER_API_SECRET"], || {
        let config = FollowgraphConfigLoader::new()
            .with_optional_file(tmp.path().join("absent.yaml"))
            .load()
            .expect("defaults load");

        assert_eq!(config.scrape.posts, 10);
        assert_eq!(config.http.timeout_secs, 15);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.accounts.usernames.is_empty());
        assert_eq!(config.credentials.api_key, "${TWITTER_API_KEY}");
        assert_eq!(config.credentials.key_pair(), None);
    });
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = FollowgraphConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn bad_format_is_rejected() {
    let result = FollowgraphConfigLoader::new()
        .with_yaml_str("output:\n  format: csv\n")
        .load();
    assert!(result.is_err());
}
