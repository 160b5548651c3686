//! Error types for the gallery linker

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gallery linker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the gallery linker
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to extract video metadata from {path}: {message}")]
    VideoMetadata { path: PathBuf, message: String },

    #[error("Probe program '{program}' not found. Please install FFmpeg and ensure ffprobe is in PATH")]
    ProbeNotFound { program: String },

    #[error("Failed to place {path}: {source}")]
    Placement {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot traverse {root}: {source}")]
    Traversal {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}
