//! Walker and classifier
//!
//! Handles the core logic of:
//! - Walking the source tree
//! - Classifying files by name
//! - Extracting timestamps
//! - Hard-linking files into the output tree
//!
//! Files are processed one at a time, in traversal order.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{ExifExtractor, Extraction, Extractor, ProbeExtractor};
use crate::layout::{NamingPolicy, derive_dir};
use crate::place::{LinkOutcome, place};
use crate::record::{FileRecord, Inventory, Status};
use regex::Regex;
use std::io::Write;
use std::path::Path;
use tracing::{Level, debug, info, span, warn};
use walkdir::WalkDir;

/// Media family a rule classifies into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Status of a successfully placed file of this kind
    pub fn status(&self) -> Status {
        match self {
            MediaKind::Image => Status::Image,
            MediaKind::Video => Status::Video,
        }
    }
}

/// A classification rule: file names matching `pattern` go to `extractor`
pub struct Rule {
    kind: MediaKind,
    pattern: Regex,
    extractor: Box<dyn Extractor>,
}

impl Rule {
    pub fn new(kind: MediaKind, pattern: &str, extractor: impl Extractor + 'static) -> Result<Self> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
            extractor: Box::new(extractor),
        })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Search anywhere in the file name, not just the extension
    pub fn matches(&self, file_name: &str) -> bool {
        self.pattern.is_match(file_name)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Walks a source tree and links its media into a destination tree
#[derive(Debug)]
pub struct Processor {
    rules: Vec<Rule>,
    naming: NamingPolicy,
}

impl Processor {
    /// Create a processor from an ordered rule list; the first matching rule wins
    pub fn new(rules: Vec<Rule>, naming: NamingPolicy) -> Self {
        Self { rules, naming }
    }

    /// Build the default image and video rules from the configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let rules = vec![
            Rule::new(MediaKind::Image, &config.image_pattern, ExifExtractor)?,
            Rule::new(
                MediaKind::Video,
                &config.video_pattern,
                ProbeExtractor::new(config.probe.clone()),
            )?,
        ];
        Ok(Self::new(rules, config.naming))
    }

    /// Visit every file under `source`, writing one status marker per file to
    /// `progress` and a newline at the end
    ///
    /// Per-file problems end up in the returned records. Only failing to read
    /// `source` itself aborts the walk.
    pub fn walk<W: Write>(&self, source: &Path, dest: &Path, progress: &mut W) -> Result<Inventory> {
        let _span = span!(Level::INFO, "walk", ?source, ?dest).entered();
        let mut inventory = Inventory::new();

        for entry in WalkDir::new(source).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    let _ = writeln!(progress);
                    return Err(Error::Traversal {
                        root: source.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Cannot read entry, continuing");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let record = match entry.metadata() {
                Ok(metadata) => self.visit(entry.path(), metadata.len(), dest),
                Err(e) => {
                    warn!(path = ?entry.path(), error = %e, "Cannot read metadata");
                    let mut record = FileRecord::new(entry.path(), 0);
                    record.status = Status::Error;
                    record
                }
            };

            let _ = write!(progress, "{}", record.status.marker());
            let _ = progress.flush();
            inventory.push(record);
        }

        let _ = writeln!(progress);
        info!("{}", inventory.summary());
        Ok(inventory)
    }

    /// Classify, extract and place a single file
    fn visit(&self, path: &Path, size: u64, dest: &Path) -> FileRecord {
        let mut record = FileRecord::new(path, size);

        let Some(rule) = self.rules.iter().find(|r| r.matches(&record.name)) else {
            debug!(?path, "Unclassified");
            return record;
        };
        let kind = rule.kind();

        let meta = match rule.extractor.extract(path) {
            Extraction::Success(meta) => meta,
            Extraction::Skip { width, height } => {
                debug!(?path, "No usable timestamp, skipping");
                record.width = width;
                record.height = height;
                record.status = Status::Skipped;
                return record;
            }
            Extraction::Failure(e) => {
                warn!(?path, error = %e, "Failed to extract metadata");
                record.status = Status::Error;
                return record;
            }
        };

        record.width = meta.width;
        record.height = meta.height;
        record.name = self.naming.file_name(&meta.time, &record.name, &record.extension);

        let relative_dir = derive_dir(&meta.time);
        match place(path, dest, &relative_dir, &record.name) {
            Ok(placement) => {
                record.status = match placement.outcome {
                    LinkOutcome::Linked => kind.status(),
                    LinkOutcome::AlreadyLinked => Status::AlreadyLinked,
                };
                debug!(?path, link = ?placement.link, status = %record.status, "Placed file");
                record.link = placement.link;
            }
            Err(e) => {
                warn!(?path, error = %e, "Failed to place file");
                record.status = Status::Error;
            }
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedMeta;
    use chrono::DateTime;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn fixed_time(_: &Path) -> Extraction {
        Extraction::Success(ExtractedMeta {
            width: 640,
            height: 480,
            time: DateTime::parse_from_rfc3339("2016-07-18T14:05:00+02:00").unwrap(),
        })
    }

    fn always_skip(_: &Path) -> Extraction {
        Extraction::Skip { width: 0, height: 0 }
    }

    fn skip_with_dimensions(_: &Path) -> Extraction {
        Extraction::Skip {
            width: 8,
            height: 6,
        }
    }

    fn always_fail(path: &Path) -> Extraction {
        Extraction::Failure(Error::VideoMetadata {
            path: path.to_path_buf(),
            message: "probe crashed".into(),
        })
    }

    fn processor(image: fn(&Path) -> Extraction, video: fn(&Path) -> Extraction) -> Processor {
        Processor::new(
            vec![
                Rule::new(MediaKind::Image, crate::config::DEFAULT_IMAGE_PATTERN, image).unwrap(),
                Rule::new(MediaKind::Video, crate::config::DEFAULT_VIDEO_PATTERN, video).unwrap(),
            ],
            NamingPolicy::Timestamp,
        )
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_rule_matches_anywhere_in_name() {
        let rule = Rule::new(MediaKind::Image, crate::config::DEFAULT_IMAGE_PATTERN, always_skip).unwrap();
        assert!(rule.matches("photo.jpg"));
        assert!(rule.matches("PHOTO.JPEG"));
        assert!(rule.matches("photo.JPG.bak"));
        assert!(rule.matches("x.jpg.txt"));
        assert!(!rule.matches("photo.png"));
        assert!(!rule.matches("jpg"));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Rule::new(MediaKind::Image, "(unclosed", always_skip),
            Err(Error::Regex(_))
        ));
    }

    #[test]
    fn test_walk_statuses_and_markers() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(src.path(), "a.jpg");
        touch(src.path(), "b.mov");
        touch(src.path(), "c.txt");

        let mut progress = Vec::new();
        let inventory = processor(fixed_time, always_skip)
            .walk(src.path(), out.path(), &mut progress)
            .unwrap();

        assert_eq!(String::from_utf8(progress).unwrap(), "i.?\n");
        let statuses: Vec<_> = inventory.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [Status::Image, Status::Skipped, Status::Unclassified]);

        let image = &inventory.records()[0];
        assert_eq!(image.name, "2016-07-18 14.05.00 +0200.jpg");
        assert_eq!((image.width, image.height), (640, 480));
        assert_eq!(
            image.link,
            PathBuf::from("2016/07-Jul/2016-07-18").join("2016-07-18 14.05.00 +0200.jpg")
        );
        assert!(out.path().join(&image.link).is_file());

        let skipped = &inventory.records()[1];
        assert_eq!(skipped.name, "b.mov");
        assert!(!skipped.has_link());
    }

    #[test]
    fn test_skipped_record_keeps_dimensions() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(src.path(), "scan.jpg");

        let inventory = processor(skip_with_dimensions, always_skip)
            .walk(src.path(), out.path(), &mut Vec::new())
            .unwrap();

        let record = &inventory.records()[0];
        assert_eq!(record.status, Status::Skipped);
        assert_eq!((record.width, record.height), (8, 6));
        assert_eq!(record.name, "scan.jpg");
        assert!(!record.has_link());
    }

    #[test]
    fn test_failure_does_not_stop_walk() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(src.path(), "a.mov");
        touch(src.path(), "b.jpg");

        let mut progress = Vec::new();
        let inventory = processor(fixed_time, always_fail)
            .walk(src.path(), out.path(), &mut progress)
            .unwrap();

        assert_eq!(String::from_utf8(progress).unwrap(), "Xi\n");
        assert_eq!(inventory.len(), 2);
        assert!(!inventory.records()[0].has_link());
    }

    #[test]
    fn test_directories_are_not_recorded() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(src.path(), "nested/deeper/a.txt");
        touch(src.path(), "nested/b.txt");

        let inventory = processor(fixed_time, fixed_time)
            .walk(src.path(), out.path(), &mut Vec::new())
            .unwrap();

        assert_eq!(inventory.len(), 2);
        assert!(inventory.iter().all(|r| r.status == Status::Unclassified));
    }

    #[test]
    fn test_second_walk_is_already_linked() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(src.path(), "a.jpg");
        touch(src.path(), "b.mp4");

        let p = processor(fixed_time, fixed_time);
        let first = p.walk(src.path(), out.path(), &mut Vec::new()).unwrap();
        let mut progress = Vec::new();
        let second = p.walk(src.path(), out.path(), &mut progress).unwrap();

        assert_eq!(String::from_utf8(progress).unwrap(), "--\n");
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(b.status, Status::AlreadyLinked);
            assert_eq!(a.link, b.link);
        }
    }

    #[test]
    fn test_link_invariant() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        for name in ["a.jpg", "b.mov", "c.txt", "d.m4v", "e.JPEG"] {
            touch(src.path(), name);
        }

        let inventory = processor(fixed_time, always_fail)
            .walk(src.path(), out.path(), &mut Vec::new())
            .unwrap();

        for record in &inventory {
            assert_eq!(record.has_link(), record.status.is_linked(), "{:?}", record);
        }
    }

    #[test]
    fn test_original_naming() {
        let src = tempdir().unwrap();
        let out = tempdir().unwrap();
        touch(src.path(), "IMG_0001.JPG");

        let p = Processor::new(
            vec![Rule::new(MediaKind::Image, crate::config::DEFAULT_IMAGE_PATTERN, fixed_time).unwrap()],
            NamingPolicy::Original,
        );
        let inventory = p.walk(src.path(), out.path(), &mut Vec::new()).unwrap();

        let record = &inventory.records()[0];
        assert_eq!(record.name, "IMG_0001.JPG");
        assert_eq!(record.link, PathBuf::from("2016/07-Jul/2016-07-18/IMG_0001.JPG"));
    }

    #[test]
    fn test_missing_root_aborts() {
        let dir = tempdir().unwrap();
        let result = processor(fixed_time, fixed_time).walk(
            &dir.path().join("missing"),
            &dir.path().join("out"),
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(Error::Traversal { .. })));
    }
}
