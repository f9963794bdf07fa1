use followgraph_http::{HttpError, StatusCode};
use thiserror::Error;

/// Twitter error codes that identify an unknown or suspended account.
const NOT_FOUND_CODES: [i64; 3] = [34, 50, 63];
/// "Sorry, you are not authorized to see this status."
const NOT_AUTHORIZED_CODE: i64 = 179;
const RATE_LIMIT_CODE: i64 = 88;
/// "Could not authenticate you", "Invalid or expired token", "Bad authentication data".
const BAD_CREDENTIAL_CODES: [i64; 3] = [32, 89, 215];

/// Error taxonomy the scraper's retry loop is keyed on.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The account is private/protected.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Surfaced only after the transport layer's own rate-limit wait gave up.
    #[error("rate limited (reset at {reset:?})")]
    RateLimited { reset: Option<u64> },

    /// Credentials missing or rejected; retrying will not help.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error(transparent)]
    Http(HttpError),
}

impl PlatformError {
    /// Errors the scraper should treat as worth a cooldown-and-retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlatformError::RateLimited { .. } | PlatformError::Http(_))
    }
}

impl From<HttpError> for PlatformError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Api {
                status,
                code,
                rate_limit_reset,
                ..
            } if status == StatusCode::TOO_MANY_REQUESTS || code == Some(RATE_LIMIT_CODE) => {
                PlatformError::RateLimited {
                    reset: rate_limit_reset,
                }
            }
            HttpError::Api { code, message, .. }
                if code.is_some_and(|c| BAD_CREDENTIAL_CODES.contains(&c)) =>
            {
                PlatformError::Auth(message)
            }
            HttpError::Api {
                status,
                code,
                message,
                ..
            } if status == StatusCode::UNAUTHORIZED || code == Some(NOT_AUTHORIZED_CODE) => {
                PlatformError::NotAuthorized(message)
            }
            HttpError::Api {
                status,
                code,
                message,
                ..
            } if status == StatusCode::NOT_FOUND
                || code.is_some_and(|c| NOT_FOUND_CODES.contains(&c)) =>
            {
                PlatformError::NotFound(message)
            }
            other => PlatformError::Http(other),
        }
    }
}
