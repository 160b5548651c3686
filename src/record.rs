//! Inventory records produced by a walk

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Final status of a visited file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No classification rule matched the file name
    Unclassified,
    /// Extraction or a filesystem operation failed
    Error,
    /// The extractor found no usable timestamp
    Skipped,
    /// The destination link already existed
    AlreadyLinked,
    /// Image placed successfully
    Image,
    /// Video placed successfully
    Video,
}

impl Status {
    /// Single-character marker used for progress output and the inventory
    pub fn marker(&self) -> char {
        match self {
            Status::Unclassified => '?',
            Status::Error => 'X',
            Status::Skipped => '.',
            Status::AlreadyLinked => '-',
            Status::Image => 'i',
            Status::Video => 'v',
        }
    }

    /// Statuses that are reported back to the user after a run
    pub fn is_loggable(&self) -> bool {
        matches!(self, Status::Unclassified | Status::Error | Status::Skipped)
    }

    /// Whether a record with this status carries a link
    pub fn is_linked(&self) -> bool {
        matches!(self, Status::Image | Status::Video | Status::AlreadyLinked)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One record per visited file
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Source path
    pub origin: PathBuf,
    /// Destination path relative to the output root, empty until placed
    pub link: PathBuf,
    #[serde(rename = "flag")]
    pub status: Status,
    pub size: u64,
    /// File name used at the destination
    pub name: String,
    /// Lower-cased extension without the leading dot
    #[serde(rename = "ext")]
    pub extension: String,
    pub width: u32,
    pub height: u32,
}

impl FileRecord {
    /// Create an unclassified record for a file about to be visited
    pub fn new(origin: &Path, size: u64) -> Self {
        let name = origin
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = origin
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            origin: origin.to_path_buf(),
            link: PathBuf::new(),
            status: Status::Unclassified,
            size,
            name,
            extension,
            width: 0,
            height: 0,
        }
    }

    pub fn has_link(&self) -> bool {
        !self.link.as_os_str().is_empty()
    }
}

/// Ordered, append-only list of records in traversal order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Inventory {
    records: Vec<FileRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Records that need the user's attention (unclassified, errored, skipped)
    pub fn loggable(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.status.is_loggable())
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for record in &self.records {
            match record.status {
                Status::Unclassified => summary.unclassified += 1,
                Status::Error => summary.errors += 1,
                Status::Skipped => summary.skipped += 1,
                Status::AlreadyLinked => summary.already_linked += 1,
                Status::Image => summary.images += 1,
                Status::Video => summary.videos += 1,
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a FileRecord;
    type IntoIter = std::slice::Iter<'a, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Per-status counts over an inventory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub images: usize,
    pub videos: usize,
    pub already_linked: usize,
    pub skipped: usize,
    pub errors: usize,
    pub unclassified: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.images + self.videos + self.already_linked + self.skipped + self.errors + self.unclassified
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Images: {}, Videos: {}, Already linked: {}, Skipped: {}, Failed: {}, Unclassified: {}",
            self.total(),
            self.images,
            self.videos,
            self.already_linked,
            self.skipped,
            self.errors,
            self.unclassified
        )
    }
}
