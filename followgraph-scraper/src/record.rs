//! The per-account aggregate and how it lands on disk.
use crate::error::ScrapeError;
use followgraph_common::OutputFormat;
use followgraph_social::twitter::is_reshare;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Everything collected for one account. Built once, written once.
///
/// On disk the post collections keep the platform's historical key names
/// (`tweets` / `retweets`) so existing consumers can read the files unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub username: String,
    pub following: Vec<u64>,
    pub followers: Vec<u64>,
    #[serde(rename = "tweets")]
    pub posts: Vec<Value>,
    #[serde(rename = "retweets")]
    pub reshares: Vec<Value>,
    pub likes: Vec<Value>,
}

#[cfg(unix)]
const RECORD_MODE: u32 = 0o644;

/// Split fetched posts into `(originals, reshares)`, preserving fetch order on both sides.
pub fn classify(fetched: Vec<Value>) -> (Vec<Value>, Vec<Value>) {
    let (reshares, posts): (Vec<Value>, Vec<Value>) = fetched.into_iter().partition(is_reshare);
    (posts, reshares)
}

/// Keep file names to the characters handles are made of.
fn file_stem(username: &str) -> String {
    let stem: String = username
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

/// Path `write_record` would use for `username`.
pub fn record_path(dir: &Path, username: &str, format: OutputFormat) -> PathBuf {
    dir.join(format!("{}.{}", file_stem(username), format.extension()))
}

/// Serialize `record` as `<dir>/<username>.<ext>`, replacing any previous file atomically.
pub fn write_record(
    dir: &Path,
    format: OutputFormat,
    record: &AccountRecord,
) -> Result<PathBuf, ScrapeError> {
    let path = record_path(dir, &record.username, format);
    let persist_err = |source: io::Error| ScrapeError::Persist {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(persist_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let written = match format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut writer, record).map_err(io::Error::from)
            }
            OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, record).map_err(io::Error::other),
        };
        written.map_err(persist_err)?;
        writer.flush().map_err(persist_err)?;
    }
    // Temp files start out owner-only; records are ordinary output.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(RECORD_MODE))
            .map_err(persist_err)?;
    }
    tmp.persist(&path).map_err(|e| persist_err(e.error))?;

    tracing::debug!(path = %path.display(), %format, "record.written");
    Ok(path)
}
