//! Metadata extraction
//!
//! Each media family has its own extractor:
//! - EXIF metadata for images
//! - Container probing via FFprobe for videos
//!
//! Extractors never fail the walk. They report one of three outcomes and the
//! processor turns that into the record's status.

pub mod exif;
pub mod video;

use crate::error::Error;
use chrono::{DateTime, FixedOffset};
use std::path::Path;

pub use self::exif::ExifExtractor;
pub use self::video::ProbeExtractor;

/// Metadata recovered from a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMeta {
    /// Pixel width, zero when unknown
    pub width: u32,
    /// Pixel height, zero when unknown
    pub height: u32,
    /// Creation time
    pub time: DateTime<FixedOffset>,
}

/// Outcome of running an extractor on a file
#[derive(Debug)]
pub enum Extraction {
    /// A timestamp was found
    Success(ExtractedMeta),
    /// The file carries no usable timestamp; dimensions are kept when known
    Skip { width: u32, height: u32 },
    /// The file could not be read or probed
    Failure(Error),
}

/// Turns a file into its creation time and dimensions
pub trait Extractor {
    fn extract(&self, path: &Path) -> Extraction;
}

impl<F> Extractor for F
where
    F: Fn(&Path) -> Extraction,
{
    fn extract(&self, path: &Path) -> Extraction {
        self(path)
    }
}
