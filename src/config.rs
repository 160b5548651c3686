//! Configuration types for the gallery linker

use crate::layout::NamingPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default pattern for images (matched anywhere in the file name, ignoring case)
pub const DEFAULT_IMAGE_PATTERN: &str = "(?i).(jpe?g)";

/// Default pattern for videos (matched anywhere in the file name, ignoring case)
pub const DEFAULT_VIDEO_PATTERN: &str = "(?i).(mov|mp4|m4v)";

/// Creation time as written by current FFprobe builds: `2016-07-18T02:29:36.000000Z`
pub const LOCAL_LAYOUT_ISO: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Creation time as written by older FFprobe builds: `2016-07-18 02:29:36`
pub const LOCAL_LAYOUT_LEGACY: &str = "%Y-%m-%d %H:%M:%S";

/// QuickTime creation date with explicit offset: `2016-07-18T12:29:35+1000`
pub const VENDOR_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Container tag holding the vendor creation date
pub const VENDOR_DATE_KEY: &str = "com.apple.quicktime.creationdate";

/// Settings for the external media probe
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Probe executable, looked up in PATH unless absolute
    pub program: String,

    /// Container tag holding a timezone-qualified creation date
    pub vendor_date_key: String,

    /// chrono layout of the vendor creation date
    pub vendor_layout: String,

    /// chrono layout of `creation_time` tags (depends on the probe version)
    pub local_layout: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            program: "ffprobe".into(),
            vendor_date_key: VENDOR_DATE_KEY.into(),
            vendor_layout: VENDOR_LAYOUT.into(),
            local_layout: LOCAL_LAYOUT_ISO.into(),
        }
    }
}

/// Configuration for the gallery linker
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory to scan for media files
    pub source_dir: Option<PathBuf>,

    /// Root of the hard-linked output tree
    pub output_dir: PathBuf,

    /// JSON inventory path (defaults to `<output_dir>/files.json`)
    pub inventory_file: Option<PathBuf>,

    /// HTML error report path (defaults to `<output_dir>/errors.html`)
    pub report_file: Option<PathBuf>,

    /// How linked files are named
    pub naming: NamingPolicy,

    /// Regex that classifies a file name as an image
    pub image_pattern: String,

    /// Regex that classifies a file name as a video
    pub video_pattern: String,

    /// Media probe settings
    pub probe: ProbeConfig,

    /// Verbose output
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: None,
            output_dir: PathBuf::from("output"),
            inventory_file: None,
            report_file: None,
            naming: NamingPolicy::default(),
            image_pattern: DEFAULT_IMAGE_PATTERN.into(),
            video_pattern: DEFAULT_VIDEO_PATTERN.into(),
            probe: ProbeConfig::default(),
            verbose: false,
        }
    }
}

impl Config {
    /// Get inventory file path, using default if not specified
    pub fn get_inventory_file(&self) -> PathBuf {
        self.inventory_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join("files.json"))
    }

    /// Get report file path, using default if not specified
    pub fn get_report_file(&self) -> PathBuf {
        self.report_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join("errors.html"))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# Gallery Linker Configuration File
# This file uses TOML format (https://toml.io)

# Directory to scan for media files
source_dir = "D:/Camera Uploads"

# Root of the output tree. Files are hard-linked, so it must live on the
# same filesystem as source_dir and must not be inside it.
output_dir = "D:/Sorted"

# JSON inventory of every visited file (default: <output_dir>/files.json)
# inventory_file = "D:/Sorted/files.json"

# HTML report of unclassified, errored and skipped files
# (default: <output_dir>/errors.html)
# report_file = "D:/Sorted/errors.html"

# Naming of linked files: "timestamp" or "original"
# - timestamp: 2016-07-18 14.05.00 +0200.jpg
# - original: keep the source file name
naming = "timestamp"

# Classification patterns, matched anywhere in the file name.
# Use e.g. '(?i)\.jpe?g$' to only match real extensions.
image_pattern = '(?i).(jpe?g)'
video_pattern = '(?i).(mov|mp4|m4v)'

# Verbose output - show detailed processing information
verbose = false

[probe]
# Media probe executable
program = "ffprobe"

# Container tag with a timezone-qualified creation date, and its layout
vendor_date_key = "com.apple.quicktime.creationdate"
vendor_layout = "%Y-%m-%dT%H:%M:%S%z"

# Layout of creation_time tags. Depends on the FFprobe version:
# - current: "%Y-%m-%dT%H:%M:%S%.6fZ"  (2016-07-18T02:29:36.000000Z)
# - legacy:  "%Y-%m-%d %H:%M:%S"       (2016-07-18 02:29:36)
local_layout = "%Y-%m-%dT%H:%M:%S%.6fZ"
"#
        .to_string()
    }
}

/// Errors that can occur when loading a configuration file
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read configuration file
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Cannot read config file {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Invalid config file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}
