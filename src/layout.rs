//! Destination path and file name derivation

use chrono::{DateTime, Datelike, FixedOffset};
use serde::Deserialize;
use std::path::PathBuf;

/// How placed files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Rename to the capture timestamp: "2016-07-18 14.05.00 +0200.jpg"
    #[default]
    Timestamp,
    /// Keep the original file name
    Original,
}

impl NamingPolicy {
    /// File name to use at the destination
    pub fn file_name(&self, timestamp: &DateTime<FixedOffset>, original: &str, extension: &str) -> String {
        match self {
            NamingPolicy::Timestamp => derive_filename(timestamp, extension),
            NamingPolicy::Original => original.to_string(),
        }
    }
}

/// Destination directory relative to the output root: `YYYY/MM-Mon/YYYY-MM-DD`
pub fn derive_dir(timestamp: &DateTime<FixedOffset>) -> PathBuf {
    let mut dir = PathBuf::from(timestamp.year().to_string());
    dir.push(timestamp.format("%m-%b").to_string());
    dir.push(timestamp.format("%Y-%m-%d").to_string());
    dir
}

/// Canonical file name, sortable within a day and carrying the UTC offset
pub fn derive_filename(timestamp: &DateTime<FixedOffset>, extension: &str) -> String {
    let stem = timestamp.format("%Y-%m-%d %H.%M.%S %z");
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, extension)
    }
}
