//! Twitter/X v1.1 integration surface.
//!
//! Submodules provide the HTTP client wrapper (app-only OAuth2), the platform error
//! taxonomy, and the response models. Raw post payloads stay as `serde_json::Value` so
//! records carry exactly what the platform returned.
pub mod client;
pub mod error;
pub mod types;

pub use client::{Credentials, TwitterApi};
pub use error::PlatformError;

/// Field present on a status object that re-publishes another account's post.
pub const RESHARE_MARKER: &str = "retweeted_status";

/// True iff `post` carries the reshare marker.
///
/// ```
/// use serde_json::json;
/// use followgraph_social::twitter::is_reshare;
///
/// assert!(is_reshare(&json!({"id": 1, "retweeted_status": {"id": 0}})));
/// assert!(!is_reshare(&json!({"id": 2, "full_text": "hello"})));
/// ```
pub fn is_reshare(post: &serde_json::Value) -> bool {
    post.get(RESHARE_MARKER).is_some()
}
