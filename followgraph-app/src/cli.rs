use clap::Parser;
use followgraph_common::OutputFormat;
use followgraph_config::FollowgraphConfig;
use std::path::PathBuf;

/// Scrape follower/following IDs, recent posts, and likes for each account into one
/// file per account.
#[derive(Debug, Parser)]
#[command(name = "followgraph", version, about)]
pub struct Cli {
    /// Accounts to scrape, with or without a leading '@'.
    pub usernames: Vec<String>,

    /// Numeric account IDs; only used when no usernames are given.
    #[arg(long = "user-id", value_name = "ID")]
    pub user_ids: Vec<u64>,

    /// Config file (defaults to the platform config dir, if present).
    #[arg(long, value_name = "FILE", env = "FOLLOWGRAPH_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "N")]
    pub posts: Option<usize>,

    #[arg(long, value_name = "N")]
    pub likes: Option<usize>,

    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Log stage progress at debug level only.
    #[arg(long, short)]
    pub quiet: bool,

    /// Attempts per account before giving up on rate limits and network errors.
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Mirror logs to stderr.
    #[arg(long)]
    pub log_stderr: bool,
}

impl Cli {
    /// Overlay flags the user actually passed onto the loaded config.
    pub fn apply(&self, cfg: &mut FollowgraphConfig) {
        if !self.usernames.is_empty() || !self.user_ids.is_empty() {
            cfg.accounts.usernames = self.usernames.clone();
            cfg.accounts.user_ids = self.user_ids.clone();
        }
        if let Some(n) = self.posts {
            cfg.scrape.posts = n;
        }
        if let Some(n) = self.likes {
            cfg.scrape.likes = n;
        }
        if let Some(dir) = &self.output_dir {
            cfg.output.dir = dir.clone();
        }
        if let Some(format) = self.format {
            cfg.output.format = format;
        }
        if self.quiet {
            cfg.scrape.verbose = false;
        }
        if let Some(n) = self.max_attempts {
            cfg.retry.max_attempts = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("followgraph").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "alice",
            "@bob",
            "--posts",
            "50",
            "--format",
            "yaml",
            "--quiet",
            "--max-attempts",
            "2",
        ]);
        let mut cfg = FollowgraphConfig::default();
        cfg.accounts.usernames = vec!["from-file".into()];
        cli.apply(&mut cfg);

        assert_eq!(cfg.accounts.usernames, vec!["alice", "@bob"]);
        assert_eq!(cfg.scrape.posts, 50);
        assert_eq!(cfg.scrape.likes, 10);
        assert_eq!(cfg.output.format, OutputFormat::Yaml);
        assert!(!cfg.scrape.verbose);
        assert_eq!(cfg.retry.max_attempts, 2);
    }

    #[test]
    fn config_accounts_survive_when_no_targets_given() {
        let cli = parse(&["--likes", "3"]);
        let mut cfg = FollowgraphConfig::default();
        cfg.accounts.user_ids = vec![12];
        cli.apply(&mut cfg);

        assert_eq!(cfg.accounts.user_ids, vec![12]);
        assert_eq!(cfg.scrape.likes, 3);
        assert!(cfg.scrape.verbose);
    }

    #[test]
    fn repeated_user_ids() {
        let cli = parse(&["--user-id", "1", "--user-id", "2"]);
        assert_eq!(cli.user_ids, vec![1, 2]);
        assert!(cli.usernames.is_empty());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = Cli::try_parse_from(["followgraph", "--format", "csv"]);
        assert!(err.is_err());
    }
}
