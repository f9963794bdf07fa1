//! Common types and utilities shared across followgraph crates.
//!
//! This crate holds the observability bootstrap and the handful of enums that more than
//! one layer needs to agree on. It stays dependency-light so the HTTP, social, scraper,
//! and config crates can all depend on it.
//!
//! # Overview
//!
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`OutputFormat`]: On-disk encoding for scraped account records
//!
//! # Examples
//!
//! ```rust
//! use followgraph_common::OutputFormat;
//!
//! let fmt: OutputFormat = "yaml".parse().unwrap();
//! assert_eq!(fmt.extension(), "yaml");
//! assert_eq!(OutputFormat::default(), OutputFormat::Json);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// Encoding used when an account record is written to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// File extension (without the dot) for records written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format '{other}' (expected json or yaml)")),
        }
    }
}
