//! Gallery Linker - date-based hard-link organizer for photos and videos
//!
//! This library provides functionality for organizing photos and videos
//! based on their embedded creation time with support for:
//! - EXIF metadata extraction for images
//! - FFprobe-based metadata extraction for videos
//! - Deterministic `YYYY/MM-Mon/YYYY-MM-DD` destination paths
//! - Idempotent hard-link placement (no bytes are copied)
//! - A per-file inventory with JSON and HTML reports

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod layout;
pub mod place;
pub mod process;
pub mod record;
pub mod report;

pub use cli::Cli;
pub use config::{Config, ConfigError, ProbeConfig};
pub use error::{Error, Result};
pub use extract::{ExtractedMeta, Extraction, Extractor};
pub use layout::NamingPolicy;
pub use process::{MediaKind, Processor, Rule};
pub use record::{FileRecord, Inventory, Status, Summary};
