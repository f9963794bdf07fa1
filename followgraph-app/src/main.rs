use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::Cli;
use followgraph_common::observability::{LogConfig, init_logging};
use followgraph_config::{
    CredentialsConfig, FollowgraphConfig, FollowgraphConfigLoader, default_config_path,
};
use followgraph_http::HttpClient;
use followgraph_scraper::{
    AccountOutcome, AccountScraper, BatchReport, BatchRunner, OutputTarget, RetryPolicy,
    ScrapeOptions,
};
use followgraph_social::TwitterApi;
use followgraph_social::twitter::Credentials;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod cli;

/// Longest a single request may sit out a 429 window before the scraper's own cooldown
/// takes over.
const MAX_TRANSPORT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(15 * 60 + 1);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut loader = FollowgraphConfigLoader::new();
    loader = match (&cli.config, default_config_path()) {
        (Some(path), _) => loader.with_file(path),
        (None, Some(path)) => loader.with_optional_file(path),
        (None, None) => loader,
    };
    let mut cfg = loader.load().context("failed to load configuration")?;
    cli.apply(&mut cfg);

    let log_path = init_logging(LogConfig {
        emit_stderr: cli.log_stderr,
        ..LogConfig::default()
    })?;
    tracing::debug!(log = %log_path.display(), "app.logging_ready");

    if cfg.accounts.usernames.is_empty() && cfg.accounts.user_ids.is_empty() {
        eprintln!("no accounts given: pass usernames, --user-id, or set accounts in the config");
        return Ok(ExitCode::from(2));
    }

    let runner = build_runner(&cfg)?;
    let report = runner
        .run(&cfg.accounts.usernames, &cfg.accounts.user_ids)
        .await;

    print_summary(&report);
    if report.scraped() == 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn credentials(cfg: &CredentialsConfig) -> Result<Credentials> {
    if let Some(token) = cfg.bearer() {
        return Ok(Credentials::Bearer(token.to_string()));
    }
    match cfg.key_pair() {
        Some((api_key, api_secret)) => Ok(Credentials::App {
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        }),
        None => bail!(
            "no API credentials: set TWITTER_API_KEY and TWITTER_API_SECRET, or credentials.bearer_token"
        ),
    }
}

fn build_runner(cfg: &FollowgraphConfig) -> Result<BatchRunner> {
    let http = HttpClient::new(&cfg.credentials.base_url)
        .with_context(|| format!("invalid base url {}", cfg.credentials.base_url))?
        .with_timeout(Duration::from_secs(cfg.http.timeout_secs))
        .with_retries(cfg.http.max_retries)
        .with_rate_limit_wait(cfg.http.wait_on_rate_limit, MAX_TRANSPORT_RATE_LIMIT_WAIT);
    let api = TwitterApi::with_http(http, credentials(&cfg.credentials)?);

    let policy = RetryPolicy {
        max_attempts: cfg.retry.max_attempts,
        cooldown: Duration::from_secs(cfg.retry.cooldown_secs),
        multiplier: cfg.retry.multiplier,
        max_cooldown: Duration::from_secs(cfg.retry.max_cooldown_secs),
    };
    let options = ScrapeOptions {
        posts: cfg.scrape.posts,
        likes: cfg.scrape.likes,
        verbose: cfg.scrape.verbose,
    };
    let scraper = AccountScraper::new(Arc::new(api))
        .with_options(options)
        .with_policy(policy);

    Ok(BatchRunner::new(
        scraper,
        OutputTarget {
            dir: cfg.output.dir.clone(),
            format: cfg.output.format,
        },
    ))
}

fn print_summary(report: &BatchReport) {
    for (target, outcome) in &report.outcomes {
        match outcome {
            AccountOutcome::Scraped { path, .. } => {
                println!("{target}\tsaved {}", path.display())
            }
            AccountOutcome::Private => println!("{target}\tprivate, skipped"),
            AccountOutcome::Failed(err) => println!("{target}\tfailed: {err}"),
        }
    }
    println!(
        "{} scraped, {} private, {} failed",
        report.scraped(),
        report.private(),
        report.failed()
    );
}
