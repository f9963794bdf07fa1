use followgraph_social::PlatformError;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal outcome of a failed account scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The account is protected; no retry was attempted.
    #[error("{account} is a private account")]
    PrivateAccount { account: String },

    #[error("{account} could not be found: {reason}")]
    NotFound { account: String, reason: String },

    #[error("{account}: gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        account: String,
        attempts: u32,
        #[source]
        last: PlatformError,
    },

    /// A non-transient platform failure that is neither privacy nor a missing account.
    #[error("{account}: {source}")]
    Platform {
        account: String,
        #[source]
        source: PlatformError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScrapeError {
    pub fn is_private(&self) -> bool {
        matches!(self, ScrapeError::PrivateAccount { .. })
    }
}
