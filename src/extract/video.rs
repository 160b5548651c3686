//! Video metadata extraction via FFprobe

use super::{ExtractedMeta, Extraction, Extractor};
use crate::config::ProbeConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;
use tracing::{debug, trace};

/// Generic creation-time tag written by most muxers
const CREATION_TIME_KEY: &str = "creation_time";

/// Probe report as emitted by `ffprobe -print_format json -show_format -show_streams`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    #[serde(default)]
    pub format: ProbeFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub tags: Tags,
}

/// Tag dictionary; keys are matched exactly first, then ignoring case
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Tags(HashMap<String, serde_json::Value>);

impl Tags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .and_then(|v| v.as_str())
    }
}

/// Extractor that shells out to a media probe
#[derive(Debug, Clone, Default)]
pub struct ProbeExtractor {
    settings: ProbeConfig,
}

impl ProbeExtractor {
    pub fn new(settings: ProbeConfig) -> Self {
        Self { settings }
    }

    /// Run the probe program and return its raw stdout
    fn probe(&self, path: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.settings.program)
            .arg(path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    Error::ProbeNotFound {
                        program: self.settings.program.clone(),
                    }
                } else {
                    Error::VideoMetadata {
                        path: path.to_path_buf(),
                        message: format!("Failed to execute {}: {}", self.settings.program, e),
                    }
                }
            })?;

        if !output.status.success() {
            return Err(Error::VideoMetadata {
                path: path.to_path_buf(),
                message: format!("Probe exited with {}", output.status),
            });
        }

        Ok(output.stdout)
    }
}

impl Extractor for ProbeExtractor {
    fn extract(&self, path: &Path) -> Extraction {
        let output = match self.probe(path) {
            Ok(output) => output,
            Err(e) => return Extraction::Failure(e),
        };
        trace!(?path, "Probe output: {}", String::from_utf8_lossy(&output));

        let report = match parse_report(&output) {
            Ok(report) => report,
            Err(e) => {
                return Extraction::Failure(Error::VideoMetadata {
                    path: path.to_path_buf(),
                    message: format!("Failed to parse probe report: {}", e),
                });
            }
        };

        match resolve(&report, &self.settings) {
            Some(meta) => Extraction::Success(meta),
            None => {
                debug!(?path, "No creation time found in video metadata");
                Extraction::Skip { width: 0, height: 0 }
            }
        }
    }
}

/// Decode the first JSON value of a probe report
///
/// Running out of input before a value is complete keeps every member that
/// was fully read; anything else malformed is an error.
pub fn parse_report(bytes: &[u8]) -> serde_json::Result<ProbeReport> {
    let mut values = serde_json::Deserializer::from_slice(bytes).into_iter::<ProbeReport>();
    match values.next() {
        None => Ok(ProbeReport::default()),
        Some(Ok(report)) => Ok(report),
        Some(Err(e)) if e.is_eof() => {
            debug!(error = %e, "Truncated probe report, keeping complete members");
            Ok(close_truncated(bytes)
                .find_map(|doc| serde_json::from_slice(&doc).ok())
                .unwrap_or_default())
        }
        Some(Err(e)) => Err(e),
    }
}

/// Candidate completions of a truncated JSON document, longest first
///
/// Each candidate cuts the input where every member before it is complete
/// (right after an opening or closing bracket, or right before a comma) and
/// closes the brackets still open at that point.
fn close_truncated(bytes: &[u8]) -> impl Iterator<Item = Vec<u8>> + '_ {
    let mut cuts: Vec<(usize, Vec<u8>)> = Vec::new();
    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                open.push(b'}');
                cuts.push((i + 1, open.clone()));
            }
            b'[' => {
                open.push(b']');
                cuts.push((i + 1, open.clone()));
            }
            b'}' | b']' => {
                open.pop();
                cuts.push((i + 1, open.clone()));
            }
            b',' => cuts.push((i, open.clone())),
            _ => {}
        }
    }

    cuts.into_iter().rev().map(move |(end, open)| {
        let mut doc = bytes[..end].to_vec();
        doc.extend(open.iter().rev());
        doc
    })
}

/// Dimensions and creation time from a parsed report
pub fn resolve(report: &ProbeReport, settings: &ProbeConfig) -> Option<ExtractedMeta> {
    let time = resolve_time(report, settings)?;
    let (width, height) = resolve_dimensions(report).unwrap_or((0, 0));
    Some(ExtractedMeta { width, height, time })
}

/// First video stream with known dimensions
pub fn resolve_dimensions(report: &ProbeReport) -> Option<(u32, u32)> {
    report
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video") && s.width != 0 && s.height != 0)
        .map(|s| (s.width, s.height))
}

/// Creation time, trying in order:
/// 1. the vendor creation date on the container, which carries its own offset
/// 2. the container's `creation_time`
/// 3. each stream's `creation_time`
///
/// Values from 2 and 3 carry no offset and are read as local wall-clock time.
pub fn resolve_time(report: &ProbeReport, settings: &ProbeConfig) -> Option<DateTime<FixedOffset>> {
    resolve_time_in(report, settings, &Local)
}

/// Same as [`resolve_time`], reading offset-less values in `zone`
pub fn resolve_time_in<Tz: TimeZone>(
    report: &ProbeReport,
    settings: &ProbeConfig,
    zone: &Tz,
) -> Option<DateTime<FixedOffset>> {
    let format_tags = &report.format.tags;

    if let Some(value) = format_tags.get(&settings.vendor_date_key)
        && let Ok(time) = DateTime::parse_from_str(value, &settings.vendor_layout)
    {
        trace!(key = %settings.vendor_date_key, "Using vendor creation date");
        return (!is_zero(&time.naive_utc())).then_some(time);
    }

    let parse_local = |value: &str| NaiveDateTime::parse_from_str(value, &settings.local_layout).ok();

    let naive = format_tags
        .get(CREATION_TIME_KEY)
        .and_then(parse_local)
        .or_else(|| {
            report
                .streams
                .iter()
                .find_map(|s| s.tags.get(CREATION_TIME_KEY).and_then(parse_local))
        })?;

    if is_zero(&naive) {
        return None;
    }

    zone.from_local_datetime(&naive)
        .earliest()
        .map(|time| time.fixed_offset())
}

/// The "unset" instant, 0001-01-01 00:00:00
fn is_zero(naive: &NaiveDateTime) -> bool {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .is_some_and(|zero| *naive == zero)
}
