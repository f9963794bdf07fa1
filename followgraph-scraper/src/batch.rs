//! Batch driver: scrape every requested account in turn and persist each record as soon
//! as it is assembled.
use crate::error::ScrapeError;
use crate::record::write_record;
use crate::scraper::{AccountScraper, Target};
use followgraph_common::OutputFormat;
use std::path::PathBuf;

#[derive(Debug)]
pub enum AccountOutcome {
    Scraped { username: String, path: PathBuf },
    Private,
    Failed(ScrapeError),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(Target, AccountOutcome)>,
}

impl BatchReport {
    pub fn scraped(&self) -> usize {
        self.count(|o| matches!(o, AccountOutcome::Scraped { .. }))
    }

    pub fn private(&self) -> usize {
        self.count(|o| matches!(o, AccountOutcome::Private))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, AccountOutcome::Failed(_)))
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    fn count(&self, pred: impl Fn(&AccountOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Where finished records go.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputTarget {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: OutputFormat::Json,
        }
    }
}

pub struct BatchRunner {
    scraper: AccountScraper,
    output: OutputTarget,
}

impl BatchRunner {
    pub fn new(scraper: AccountScraper, output: OutputTarget) -> Self {
        Self { scraper, output }
    }

    /// Usernames win; the ID list is only consulted when no usernames were given.
    pub fn targets(usernames: &[String], user_ids: &[u64]) -> Vec<Target> {
        if !usernames.is_empty() {
            usernames
                .iter()
                .map(|u| Target::Username(u.trim_start_matches('@').to_string()))
                .collect()
        } else {
            user_ids.iter().copied().map(Target::UserId).collect()
        }
    }

    /// Scrape every target. Private, missing, and failed accounts are recorded in the
    /// report and the batch moves on.
    pub async fn run(&self, usernames: &[String], user_ids: &[u64]) -> BatchReport {
        let targets = Self::targets(usernames, user_ids);
        let mut report = BatchReport::default();
        tracing::info!(accounts = targets.len(), dir = %self.output.dir.display(), "batch.start");

        for target in targets {
            let outcome = self.run_one(&target).await;
            report.outcomes.push((target, outcome));
        }

        tracing::info!(
            scraped = report.scraped(),
            private = report.private(),
            failed = report.failed(),
            "batch.done"
        );
        report
    }

    async fn run_one(&self, target: &Target) -> AccountOutcome {
        let record = match self.scraper.scrape_one(target).await {
            Ok(record) => record,
            Err(err) if err.is_private() => return AccountOutcome::Private,
            Err(err) => {
                tracing::warn!(account = %target, error = %err, "batch.account_failed");
                return AccountOutcome::Failed(err);
            }
        };

        if self.scraper.options().verbose {
            tracing::info!(
                "Saving the information to {}.{}",
                record.username,
                self.output.format.extension()
            );
        }
        match write_record(&self.output.dir, self.output.format, &record) {
            Ok(path) => AccountOutcome::Scraped {
                username: record.username,
                path,
            },
            Err(err) => {
                tracing::error!(account = %target, error = %err, "batch.persist_failed");
                AccountOutcome::Failed(err)
            }
        }
    }
}
