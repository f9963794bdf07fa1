//! Account scraper: turns a list of handles or numeric IDs into one record file per
//! account.
//!
//! [`AccountScraper`] runs the per-account sequence against an injected
//! [`followgraph_social::SocialApi`] and retries the whole sequence on transient
//! platform errors under a bounded [`RetryPolicy`]. [`BatchRunner`] walks a list of
//! targets and writes each finished [`AccountRecord`] with [`write_record`].
pub mod backoff;
pub mod batch;
pub mod error;
pub mod record;
pub mod scraper;

pub use backoff::{RetryPolicy, Sleeper, TokioSleeper};
pub use batch::{AccountOutcome, BatchReport, BatchRunner, OutputTarget};
pub use error::ScrapeError;
pub use record::{classify, record_path, write_record, AccountRecord};
pub use scraper::{AccountScraper, ScrapeOptions, Target, LARGE_ACCOUNT_THRESHOLD};
